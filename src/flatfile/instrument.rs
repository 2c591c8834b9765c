use std::{
    fs,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use super::{optional_decimal, Field, FlatRecord, Table, TableLayout, NA_INT};
use crate::{
    errors::StationRefErr,
    interval::in_effect_at,
    keys::{InstrumentKey, InstrumentKeys},
    resources::{Calibration, Channel, Response, Sensor},
};

pub(crate) const LAYOUT: TableLayout = TableLayout {
    table: Table::Instrument,
    fields: &[
        Field::left("inid", 8, NA_INT),
        Field::text("insname", 50),
        Field::text("instype", 6),
        Field::text("band", 1),
        Field::text("digital", 1),
        Field::left("samprate", 11, "-1.0"),
        Field::left("ncalib", 16, "-1.0"),
        Field::left("ncalper", 16, "-1.0"),
        Field::text("dir", 64),
        Field::text("dfile", 32),
        Field::text("rsptype", 6),
        Field::text("lddate", 17),
    ],
};

/// The versions an INSTRUMENT row is assembled from.
#[derive(Clone, Copy, Debug)]
pub struct InstrumentSources<'a> {
    /// Channel versions, for band and sample rate.
    pub channels: &'a [Channel],
    /// Sensor versions, indexed by [`InstrumentKey::sensor`].
    pub sensors: &'a [Sensor],
    /// Calibration versions.
    pub calibrations: &'a [Calibration],
    /// Response versions.
    pub responses: &'a [Response],
}

/// INSTRUMENT rows, one per distinct instrument key.
///
/// `response_dir` is the `responses` directory of the export; each instrument points at its own
/// `<response_dir>/<inid>/data<inid>` file.
pub fn instrument_records(
    keys: &InstrumentKeys,
    sources: InstrumentSources<'_>,
    response_dir: &Path,
    lddate: &str,
) -> Vec<FlatRecord> {
    keys.distinct()
        .filter_map(|key| {
            let sensor = sources.sensors.get(key.sensor)?;
            let onset = key.interval.onset;
            let channel = in_effect_at(sources.channels, onset);
            let calibration = in_effect_at(sources.calibrations, onset);
            let response = in_effect_at(sources.responses, onset);

            let band = channel
                .and_then(|c| c.name.chars().next())
                .map(|c| c.to_ascii_lowercase().to_string())
                .unwrap_or_default();

            Some(FlatRecord::from(vec![
                key.inid.to_string(),
                sensor.instrument_manufacturer.clone().unwrap_or_default(),
                sensor.instrument_model.clone().unwrap_or_default(),
                band,
                "d".to_owned(),
                optional_decimal(channel.and_then(|c| c.nominal_sample_rate)),
                optional_decimal(calibration.and_then(|c| c.calibration_factor)),
                optional_decimal(calibration.and_then(|c| c.calibration_period)),
                format!("{}/", instrument_dir(response_dir, key).display()),
                data_file(key),
                response
                    .and_then(|r| r.response_type.clone())
                    .unwrap_or_default(),
                lddate.to_owned(),
            ]))
        })
        .collect()
}

/// Decode the response in effect for each distinct instrument and write it to
/// `<response_dir>/<inid>/data<inid>`. Returns the paths written.
pub fn write_response_payloads(
    keys: &InstrumentKeys,
    responses: &[Response],
    response_dir: &Path,
) -> Result<Vec<PathBuf>, StationRefErr> {
    let io_err = |source: std::io::Error| StationRefErr::TableWrite {
        table: Table::Instrument,
        source,
    };

    let mut written = vec![];
    for key in keys.distinct() {
        let response = match in_effect_at(responses, key.interval.onset) {
            Some(response) => response,
            None => continue,
        };

        let payload =
            STANDARD
                .decode(response.response_data.trim())
                .map_err(|err| StationRefErr::Encoding {
                    table: Table::Instrument,
                    field: "dfile",
                    cause: format!("response for inid {} is not base64: {}", key.inid, err),
                })?;

        let dir = instrument_dir(response_dir, key);
        fs::create_dir_all(&dir).map_err(io_err)?;
        let path = dir.join(data_file(key));
        fs::write(&path, &payload).map_err(io_err)?;

        debug!(inid = key.inid, bytes = payload.len(), path = %path.display(), "wrote response");
        written.push(path);
    }

    Ok(written)
}

fn instrument_dir(response_dir: &Path, key: &InstrumentKey) -> PathBuf {
    response_dir.join(key.inid.to_string())
}

fn data_file(key: &InstrumentKey) -> String {
    format!("data{}", key.inid)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
