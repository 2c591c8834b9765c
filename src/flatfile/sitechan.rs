use super::{optional_decimal, Field, FlatRecord, Table, TableLayout, NA_INT};
use crate::{
    interval::{Offset, Timed},
    keys::{AdjacentKeys, ChannelKey, ChannelKeys, KeySynthesizer, KeyType},
    resources::Channel,
    time::jdate,
};

pub(crate) const LAYOUT: TableLayout = TableLayout {
    table: Table::Sitechan,
    fields: &[
        Field::text("sta", 6),
        Field::text("chan", 8),
        Field::left("ondate", 8, NA_INT),
        Field::left("chanid", 8, NA_INT),
        Field::left("offdate", 8, NA_INT),
        Field::text("ctype", 4),
        Field::left("edepth", 24, "-1.0"),
        Field::left("hang", 24, "-1.0"),
        Field::left("vang", 24, "-1.0"),
        Field::text("descrip", 50),
        Field::text("lddate", 17),
    ],
};

/// One SITECHAN row per channel version, never merged, even if the name did not change.
///
/// This is where channel keys are assigned. A version with the same name as the version before
/// it keeps that version's `chanid`. The returned keys drive SENSOR and INSTRUMENT.
pub fn sitechan_records(
    sta: &str,
    channels: &[Timed<'_, Channel>],
    synth: &mut KeySynthesizer,
    lddate: &str,
) -> (Vec<FlatRecord>, ChannelKeys) {
    let mut adjacent = AdjacentKeys::new(KeyType::Channel);
    let mut keys = ChannelKeys::default();

    let records = channels
        .iter()
        .enumerate()
        .map(|(version, timed)| {
            let channel = timed.record;
            let chanid = adjacent.key_for(channel.name.clone(), synth);
            keys.push(ChannelKey {
                chanid,
                name: channel.name.clone(),
                version,
                interval: timed.interval,
            });

            let offdate = match timed.interval.offset {
                Offset::At(offset) => jdate(offset),
                Offset::Open => NA_INT.to_owned(),
            };

            FlatRecord::from(vec![
                sta.to_owned(),
                channel.name.clone(),
                jdate(timed.interval.onset),
                chanid.to_string(),
                offdate,
                "n".to_owned(),
                optional_decimal(channel.depth),
                optional_decimal(channel.horizontal_angle),
                optional_decimal(channel.vertical_angle),
                channel.comment.clone().unwrap_or_default(),
                lddate.to_owned(),
            ])
        })
        .collect();

    (records, keys)
}
