//! GeoJSON FeatureCollection reading and writing
//!
//! Coordinates are taken as they come (x, y); a third ordinate is ignored.
//! The legacy `crs` member (`{"type": "name", "properties": {"name": ...}}`)
//! is honoured on read and written for non-WGS84 layers, since surveying
//! data is usually in a projected system.

use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read a GeoJSON file (FeatureCollection, Feature or bare geometry)
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let fc = feature_collection_from_str(&text)?;
    tracing::debug!(
        "read {} features from {}",
        fc.len(),
        path.as_ref().display()
    );
    Ok(fc)
}

/// Write a layer as a GeoJSON FeatureCollection
pub fn write_geojson<P: AsRef<Path>>(fc: &FeatureCollection, path: P) -> Result<()> {
    std::fs::write(path.as_ref(), feature_collection_to_string(fc)?)?;
    Ok(())
}

/// Parse GeoJSON text into a layer
pub fn feature_collection_from_str(text: &str) -> Result<FeatureCollection> {
    let root: Value = serde_json::from_str(text)?;
    let kind = root.get("type").and_then(Value::as_str).unwrap_or_default();

    let mut fc = FeatureCollection::new();
    fc.crs = parse_crs_member(&root)?;

    match kind {
        "FeatureCollection" => {
            let features = root
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::GeoJson("FeatureCollection without a features array".into()))?;
            for f in features {
                fc.push(parse_feature(f)?);
            }
        }
        "Feature" => fc.push(parse_feature(&root)?),
        "" => return Err(Error::GeoJson("missing \"type\" member".into())),
        _ => fc.push(Feature::new(parse_geometry(&root)?)),
    }

    Ok(fc)
}

/// Serialize a layer as GeoJSON text
pub fn feature_collection_to_string(fc: &FeatureCollection) -> Result<String> {
    let columns = fc.column_names();
    let features: Vec<Value> = fc.iter().map(|f| feature_to_json(f, &columns)).collect();

    let mut root = Map::new();
    root.insert("type".into(), json!("FeatureCollection"));
    if let Some(urn) = fc.crs.as_ref().filter(|c| c.epsg() != Some(4326)).and_then(CRS::urn) {
        root.insert(
            "crs".into(),
            json!({ "type": "name", "properties": { "name": urn } }),
        );
    }
    root.insert("features".into(), Value::Array(features));

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

fn parse_crs_member(root: &Value) -> Result<Option<CRS>> {
    match root.pointer("/crs/properties/name").and_then(Value::as_str) {
        Some(name) => Ok(Some(name.parse()?)),
        None => Ok(None),
    }
}

fn parse_feature(value: &Value) -> Result<Feature> {
    let geometry = match value.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(parse_geometry(g)?),
    };

    let mut feature = Feature {
        geometry,
        ..Feature::empty()
    };

    feature.id = match value.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    if let Some(props) = value.get("properties").and_then(Value::as_object) {
        for (key, v) in props {
            feature.set_property(key.clone(), attribute_from_json(v));
        }
    }

    Ok(feature)
}

fn attribute_from_json(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n.as_f64().map_or(AttributeValue::Null, AttributeValue::Float),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => json!(b),
        AttributeValue::Int(i) => json!(i),
        AttributeValue::Float(f) => json!(f),
        AttributeValue::String(s) => json!(s),
    }
}

fn coord(value: &Value) -> Result<Coord<f64>> {
    let arr = value
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| Error::GeoJson(format!("invalid position: {}", value)))?;
    let x = arr[0].as_f64();
    let y = arr[1].as_f64();
    match (x, y) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(Error::GeoJson(format!("non-numeric position: {}", value))),
    }
}

fn array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::GeoJson(format!("{} must be an array", what)))
}

fn line_string(value: &Value) -> Result<LineString<f64>> {
    let coords = array(value, "LineString coordinates")?
        .iter()
        .map(coord)
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = array(value, "Polygon coordinates")?
        .iter()
        .map(line_string)
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() {
        return Ok(Polygon::new(LineString::new(vec![]), vec![]));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::GeoJson("geometry without a type".into()))?;

    if kind == "GeometryCollection" {
        let members = value
            .get("geometries")
            .map(|g| array(g, "geometries"))
            .transpose()?
            .map(|g| g.iter().map(parse_geometry).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        return Ok(Geometry::GeometryCollection(GeometryCollection::new_from(members)));
    }

    let coords = value
        .get("coordinates")
        .ok_or_else(|| Error::GeoJson(format!("{} without coordinates", kind)))?;

    let geometry = match kind {
        "Point" => Geometry::Point(Point::from(coord(coords)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            array(coords, "MultiPoint coordinates")?
                .iter()
                .map(|c| coord(c).map(Point::from))
                .collect::<Result<Vec<_>>>()?,
        )),
        "LineString" => Geometry::LineString(line_string(coords)?),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            array(coords, "MultiLineString coordinates")?
                .iter()
                .map(line_string)
                .collect::<Result<Vec<_>>>()?,
        )),
        "Polygon" => Geometry::Polygon(polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            array(coords, "MultiPolygon coordinates")?
                .iter()
                .map(polygon)
                .collect::<Result<Vec<_>>>()?,
        )),
        other => return Err(Error::GeoJson(format!("unsupported geometry type {}", other))),
    };

    Ok(geometry)
}

fn coords_json(ls: &LineString<f64>) -> Value {
    Value::Array(ls.0.iter().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_json(p: &Polygon<f64>) -> Value {
    let mut rings = vec![coords_json(p.exterior())];
    rings.extend(p.interiors().iter().map(coords_json));
    Value::Array(rings)
}

fn geometry_to_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": [p.x(), p.y()] }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.0.iter().map(|p| json!([p.x(), p.y()])).collect::<Vec<_>>(),
        }),
        Geometry::Line(l) => json!({
            "type": "LineString",
            "coordinates": [[l.start.x, l.start.y], [l.end.x, l.end.y]],
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": coords_json(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter().map(coords_json).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_json(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_json).collect::<Vec<_>>(),
        }),
        Geometry::Rect(r) => geometry_to_json(&Geometry::Polygon(r.to_polygon())),
        Geometry::Triangle(t) => geometry_to_json(&Geometry::Polygon(t.to_polygon())),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.0.iter().map(geometry_to_json).collect::<Vec<_>>(),
        }),
    }
}

/// Feature object with its properties in `columns` order.
///
/// Declared columns missing from the feature are written as null; properties
/// outside the schema follow, sorted by name.
fn feature_to_json(feature: &Feature, columns: &[String]) -> Value {
    let mut properties = Map::new();
    for name in columns {
        let value = feature.get_property(name).map_or(Value::Null, attribute_to_json);
        properties.insert(name.clone(), value);
    }
    let mut extra: Vec<(&String, &AttributeValue)> = feature
        .properties
        .iter()
        .filter(|(k, _)| !properties.contains_key(k.as_str()))
        .collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    for (k, v) in extra {
        properties.insert(k.clone(), attribute_to_json(v));
    }

    let mut obj = Map::new();
    obj.insert("type".into(), json!("Feature"));
    if let Some(id) = &feature.id {
        let id = id.parse::<i64>().map_or_else(|_| json!(id), |n| json!(n));
        obj.insert("id".into(), id);
    }
    obj.insert(
        "geometry".into(),
        feature.geometry.as_ref().map_or(Value::Null, geometry_to_json),
    );
    obj.insert("properties".into(), Value::Object(properties));
    Value::Object(obj)
}
