use super::{
    decimal, optional_decimal, Field, FlatRecord, Table, TableLayout, NA_ENDTIME, NA_INT, NA_TIME,
};
use crate::{
    interval::{in_effect_at, Offset, Timed},
    keys::{
        AdjacentKeys, ChannelKeys, InstrumentKey, InstrumentKeys, KeySynthesizer, KeyType,
    },
    resources::{Calibration, Sensor},
    time::{epoch_string, jdate},
};

pub(crate) const LAYOUT: TableLayout = TableLayout {
    table: Table::Sensor,
    fields: &[
        Field::text("sta", 6),
        Field::text("chan", 8),
        Field::left("time", 17, NA_TIME),
        Field::left("endtime", 17, NA_ENDTIME),
        Field::left("inid", 8, NA_INT),
        Field::left("chanid", 8, NA_INT),
        Field::left("jdate", 8, NA_INT),
        Field::left("calratio", 16, "1.0"),
        Field::left("calper", 16, "-1.0"),
        Field::left("tshift", 16, "-1.0"),
        Field::text("instant", 1),
        Field::text("lddate", 17),
    ],
};

/// SENSOR rows, one per distinct site and sensor version.
///
/// Instrument keys are handed out per sensor version, reusing the previous key while the
/// manufacturer, model, and serial number stay the same. Channel name and `chanid` come from the
/// keys SITECHAN assigned, picking the channel version in effect when the sensor was installed.
pub fn sensor_records(
    site_names: &[&str],
    sensors: &[Timed<'_, Sensor>],
    calibrations: &[Calibration],
    channel_keys: &ChannelKeys,
    synth: &mut KeySynthesizer,
    lddate: &str,
) -> (Vec<FlatRecord>, InstrumentKeys) {
    let mut adjacent = AdjacentKeys::new(KeyType::Instrument);
    let mut instrument_keys = InstrumentKeys::default();
    for (sensor, timed) in sensors.iter().enumerate() {
        let inid = adjacent.key_for(timed.record.instrument_identity(), synth);
        instrument_keys.push(InstrumentKey {
            inid,
            sensor,
            interval: timed.interval,
        });
    }

    let mut records = Vec::with_capacity(site_names.len() * sensors.len());
    for sta in site_names {
        for (timed, key) in sensors.iter().zip(instrument_keys.iter()) {
            let onset = timed.interval.onset;
            let endtime = match timed.interval.offset {
                Offset::At(offset) => epoch_string(offset, 3),
                Offset::Open => NA_ENDTIME.to_owned(),
            };
            let (chan, chanid) = channel_keys
                .key_at(onset)
                .map(|k| (k.name.clone(), k.chanid.to_string()))
                .unwrap_or_default();
            let calibration = in_effect_at(calibrations, onset);

            records.push(FlatRecord::from(vec![
                sta.to_string(),
                chan,
                epoch_string(onset, 3),
                endtime,
                key.inid.to_string(),
                chanid,
                jdate(onset),
                decimal(1.0),
                optional_decimal(calibration.and_then(|c| c.calibration_period)),
                optional_decimal(calibration.and_then(|c| c.time_shift)),
                "y".to_owned(),
                lddate.to_owned(),
            ]));
        }
    }

    (records, instrument_keys)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
