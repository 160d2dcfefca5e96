//! File-based I/O: GeoTIFF, GeoJSON, CSV and reports on disk.

use std::fs;

use geo_types::{Geometry, LineString, Point};
use topografia_core::io::{
    read_geojson, read_geotiff, write_csv, write_geojson, write_geotiff, write_report,
};
use topografia_core::{AttributeValue, Feature, FeatureCollection, Field, FieldKind, GeoTransform, Raster, CRS};

#[test]
fn geotiff_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dem.tif");

    let data: Vec<f32> = (0..20).map(|v| 100.0 + v as f32 * 0.5).collect();
    let mut dem = Raster::from_vec(data, 4, 5).unwrap();
    dem.set_transform(GeoTransform::new(300_000.0, 6_300_000.0, 5.0, -5.0));
    dem.set_nodata(Some(-32768.0));
    dem.set_crs(Some(CRS::from_epsg(32719)));
    write_geotiff(&dem, &path).unwrap();

    // Read back as f64, as the contour tool does
    let back: Raster<f64> = read_geotiff(&path).unwrap();
    assert_eq!(back.shape(), (4, 5));
    assert_eq!(back.get(3, 4).unwrap(), 109.5);
    assert_eq!(back.transform(), dem.transform());
    assert_eq!(back.nodata(), Some(-32768.0));
    assert_eq!(back.crs().and_then(CRS::epsg), Some(32719));
}

#[test]
fn geographic_geotiff_keeps_its_crs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("srtm.tif");

    let mut dem: Raster<f64> = Raster::filled(3, 3, 1200.0);
    dem.set_transform(GeoTransform::new(-70.5, -33.0, 0.001, -0.001));
    dem.set_crs(Some(CRS::wgs84()));
    write_geotiff(&dem, &path).unwrap();

    let back: Raster<f64> = read_geotiff(&path).unwrap();
    let crs = back.crs().unwrap();
    assert_eq!(crs.epsg(), Some(4326));
    assert!(crs.is_geographic());
}

#[test]
fn missing_geotiff_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result: topografia_core::Result<Raster<f64>> = read_geotiff(dir.path().join("nope.tif"));
    assert!(matches!(result, Err(topografia_core::Error::Io(_))));
}

#[test]
fn layer_to_geojson_and_csv() {
    let dir = tempfile::tempdir().unwrap();

    let mut layer = FeatureCollection::with_fields(
        vec![
            Field::new("nombre", FieldKind::Text),
            Field::new("cota", FieldKind::Real),
        ],
        Some(CRS::from_epsg(32719)),
    );
    let mut a = Feature::new(Geometry::Point(Point::new(1.0, 2.0))).with_id("1");
    a.set_property("nombre", "hito, norte");
    a.set_property("cota", 812.25);
    let mut b = Feature::new(Geometry::LineString(LineString::from(vec![(0.0, 0.0), (3.0, 4.0)])))
        .with_id("2");
    b.set_property("nombre", "eje");
    b.set_property("cota", AttributeValue::Null);
    layer.push(a);
    layer.push(b);

    let json_path = dir.path().join("capa.geojson");
    write_geojson(&layer, &json_path).unwrap();
    let back = read_geojson(&json_path).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back.crs.as_ref().and_then(CRS::epsg), Some(32719));
    assert_eq!(back.features[0].id.as_deref(), Some("1"));
    assert_eq!(back.features[0].get_property("cota"), Some(&AttributeValue::Float(812.25)));

    let csv_path = dir.path().join("capa.csv");
    write_csv(&layer, &csv_path).unwrap();
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        "nombre,cota\n\"hito, norte\",812.25\neje,\n"
    );
}

#[test]
fn report_file_ends_with_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reporte.txt");
    let lines = vec!["REPORTE".to_string(), String::new(), "Línea ID: 1".to_string()];
    write_report(&lines, &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "REPORTE\n\nLínea ID: 1\n");
}
