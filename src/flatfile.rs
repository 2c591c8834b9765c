//! Fixed-width CSS 3.0 flat files.
//!
//! Every table is described by a [`TableLayout`], a list of fields with a width, a
//! justification, and a null sentinel. Values are padded to their width, cut if they are
//! longer, and joined with single spaces. Each record ends with a newline.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, warn};

use crate::errors::StationRefErr;

pub use self::{
    affiliation::{affiliation_records, network_pair, station_pair, Members},
    instrument::{instrument_records, write_response_payloads, InstrumentSources},
    network::network_records,
    sensor::sensor_records,
    site::site_records,
    sitechan::sitechan_records,
    wfdisc::{
        read_wfdisc, wfdisc_records, write_wfdisc, WaveformSegment, WfdiscChannel, WfdiscRecord,
    },
};

mod affiliation;
mod instrument;
mod network;
mod sensor;
mod site;
mod sitechan;
mod wfdisc;

/// Null value for free text.
pub const NA_TEXT: &str = "-";
/// Null value for latitude, longitude, and elevation.
pub const NA_COORD: &str = "-999.99";
/// Null value for an unknown start time.
pub const NA_TIME: &str = "-9999999999.999";
/// Null value for an end time that has not happened yet.
pub const NA_ENDTIME: &str = "9999999999.999";
/// Null value for an off date of a version that is still active, and for unknown integers.
pub const NA_INT: &str = "-1";

/// The legacy tables written by the exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter)]
#[allow(missing_docs)]
pub enum Table {
    #[strum(to_string = "network")]
    Network,
    #[strum(to_string = "sitechan")]
    Sitechan,
    #[strum(to_string = "site")]
    Site,
    #[strum(to_string = "affiliation")]
    Affiliation,
    #[strum(to_string = "sensor")]
    Sensor,
    #[strum(to_string = "instrument")]
    Instrument,
    #[strum(to_string = "wfdisc")]
    Wfdisc,
}

impl Table {
    /// Name of the file the exporter writes this table to.
    pub fn file_name(self) -> String {
        format!("p3.{}", self)
    }
}

/// Which side of the column a value hugs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Justify {
    /// Pad on the right.
    Left,
    /// Pad on the left.
    Right,
}

/// A column in a fixed-width table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Column name.
    pub name: &'static str,
    /// Width in characters.
    pub width: usize,
    /// Justification within the width.
    pub justify: Justify,
    /// Written when the value is empty or unusable.
    pub null: &'static str,
}

impl Field {
    /// Left justified free text, null `-`.
    pub const fn text(name: &'static str, width: usize) -> Self {
        Field {
            name,
            width,
            justify: Justify::Left,
            null: NA_TEXT,
        }
    }

    /// Left justified with a specific null value.
    pub const fn left(name: &'static str, width: usize, null: &'static str) -> Self {
        Field {
            name,
            width,
            justify: Justify::Left,
            null,
        }
    }

    /// Right justified with a specific null value.
    pub const fn right(name: &'static str, width: usize, null: &'static str) -> Self {
        Field {
            name,
            width,
            justify: Justify::Right,
            null,
        }
    }
}

/// The ordered fields of a table.
#[derive(Clone, Copy, Debug)]
pub struct TableLayout {
    /// The table this describes.
    pub table: Table,
    /// The columns, in order.
    pub fields: &'static [Field],
}

/// One row of a table, values in layout order before padding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatRecord {
    /// Unpadded column values.
    pub values: Vec<String>,
}

impl From<Vec<String>> for FlatRecord {
    fn from(values: Vec<String>) -> Self {
        FlatRecord { values }
    }
}

/// Pad `value` to exactly `width` characters, cutting it if it is longer.
pub fn format_field(value: &str, width: usize, justify: Justify) -> String {
    let cut: String = value.chars().take(width).collect();
    match justify {
        Justify::Left => format!("{:<1$}", cut, width),
        Justify::Right => format!("{:>1$}", cut, width),
    }
}

/// Render a float the way the legacy tables expect, always with a decimal point.
pub fn decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') && !text.contains('e') {
        text + ".0"
    } else {
        text
    }
}

/// Render an optional float, empty when missing so the null sentinel applies.
pub fn optional_decimal(value: Option<f64>) -> String {
    value.map(decimal).unwrap_or_default()
}

impl TableLayout {
    /// Width of a record without its newline.
    pub fn line_width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum::<usize>() + self.fields.len().saturating_sub(1)
    }

    /// Lay out one record, including the trailing newline.
    pub fn format_record(&self, record: &FlatRecord) -> Result<String, StationRefErr> {
        if record.values.len() != self.fields.len() {
            return Err(StationRefErr::Encoding {
                table: self.table,
                field: "*",
                cause: format!(
                    "expected {} values, got {}",
                    self.fields.len(),
                    record.values.len()
                ),
            });
        }

        let mut line = String::with_capacity(self.line_width() + 1);
        for (i, (field, value)) in self.fields.iter().zip(&record.values).enumerate() {
            if i > 0 {
                line.push(' ');
            }
            let value = self.usable_value(field, value);
            line.push_str(&format_field(value, field.width, field.justify));
        }
        line.push('\n');

        Ok(line)
    }

    /// Split a line back into its values by column offsets, trimming the padding.
    pub fn parse_record(&self, line: &str) -> Result<FlatRecord, StationRefErr> {
        let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        let chars: Vec<char> = line.chars().collect();

        let mut values = Vec::with_capacity(self.fields.len());
        let mut start = 0;
        for field in self.fields {
            if start > chars.len() {
                return Err(StationRefErr::Encoding {
                    table: self.table,
                    field: field.name,
                    cause: format!("line too short ({} characters)", chars.len()),
                });
            }
            let end = (start + field.width).min(chars.len());
            let raw: String = chars[start..end].iter().collect();
            let value = match field.justify {
                Justify::Left => raw.trim_end(),
                Justify::Right => raw.trim_start(),
            };
            values.push(value.to_owned());
            start += field.width + 1;
        }

        Ok(FlatRecord { values })
    }

    // Empty values and values that would break the fixed columns are replaced by the null.
    fn usable_value<'a>(&self, field: &Field, value: &'a str) -> &'a str {
        if value.trim().is_empty() {
            return field.null;
        }

        if !value.is_ascii() || value.chars().any(|c| c.is_ascii_control()) {
            warn!(
                table = %self.table,
                field = field.name,
                value,
                "value is not printable ascii, writing null"
            );
            return field.null;
        }

        value
    }
}

/// Write every record to `path`, replacing anything already there. The file is created even
/// when there are no records.
pub fn write_table(
    path: &Path,
    layout: &TableLayout,
    records: &[FlatRecord],
) -> Result<(), StationRefErr> {
    let io_err = |source: std::io::Error| StationRefErr::TableWrite {
        table: layout.table,
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    for record in records {
        let line = layout.format_record(record)?;
        writer.write_all(line.as_bytes()).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;

    debug!(table = %layout.table, rows = records.len(), path = %path.display(), "wrote table");
    Ok(())
}

/// Write a table into `dir` under its standard file name.
pub fn write_table_in(
    dir: &Path,
    layout: &TableLayout,
    records: &[FlatRecord],
) -> Result<PathBuf, StationRefErr> {
    let path = dir.join(layout.table.file_name());
    write_table(&path, layout, records)?;
    Ok(path)
}

/// The layout of a table.
pub fn layout(table: Table) -> &'static TableLayout {
    match table {
        Table::Network => &network::LAYOUT,
        Table::Sitechan => &sitechan::LAYOUT,
        Table::Site => &site::LAYOUT,
        Table::Affiliation => &affiliation::LAYOUT,
        Table::Sensor => &sensor::LAYOUT,
        Table::Instrument => &instrument::LAYOUT,
        Table::Wfdisc => &wfdisc::LAYOUT,
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
