//! CSV attribute tables
//!
//! Columns follow the layer schema; layers without a schema use the sorted
//! union of their property names. Geometry is not written.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::vector::FeatureCollection;

/// Write the attribute table of a layer to a CSV file
pub fn write_csv<P: AsRef<Path>>(fc: &FeatureCollection, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_csv_to(fc, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the attribute table of a layer to any writer
pub fn write_csv_to<W: Write>(fc: &FeatureCollection, writer: &mut W) -> Result<()> {
    let columns = fc.column_names();

    let header: Vec<String> = columns.iter().map(|c| quote(c)).collect();
    writeln!(writer, "{}", header.join(","))?;

    for feature in fc.iter() {
        let row: Vec<String> = columns
            .iter()
            .map(|c| {
                feature
                    .get_property(c)
                    .map(|v| quote(&v.to_string()))
                    .unwrap_or_default()
            })
            .collect();
        writeln!(writer, "{}", row.join(","))?;
    }

    Ok(())
}

fn quote(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
