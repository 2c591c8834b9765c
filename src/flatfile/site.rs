use super::{decimal, optional_decimal, Field, FlatRecord, Table, TableLayout, NA_COORD, NA_INT};
use crate::{
    interval::{Offset, Timed, ValidityInterval},
    resources::{Site, Station},
    time::jdate,
};

pub(crate) const LAYOUT: TableLayout = TableLayout {
    table: Table::Site,
    fields: &[
        Field::text("sta", 6),
        Field::left("ondate", 8, NA_INT),
        Field::left("offdate", 8, NA_INT),
        Field::left("lat", 9, NA_COORD),
        Field::left("lon", 9, NA_COORD),
        Field::left("elev", 9, NA_COORD),
        Field::text("staname", 50),
        Field::text("statype", 4),
        Field::text("refsta", 6),
        Field::left("dnorth", 9, "0.0"),
        Field::left("deast", 9, "0.0"),
        Field::text("lddate", 17),
    ],
};

/// SITE rows: one per station run, then one per site run.
///
/// Stations are their own reference station. A site refers to the station it is a member of,
/// as found by `station_of`, and borrows that station's description for `staname`.
pub fn site_records<'s, F>(
    stations: &[Timed<'_, Station>],
    sites: &[Timed<'_, Site>],
    station_of: F,
    lddate: &str,
) -> Vec<FlatRecord>
where
    F: Fn(&Site) -> Option<&'s Station>,
{
    let station_rows = stations.iter().map(|timed| {
        let station = timed.record;
        row(
            &station.name,
            &timed.interval,
            (station.latitude, station.longitude, station.elevation),
            station.description.as_deref(),
            station.css_type(),
            &station.name,
            lddate,
        )
    });

    let site_rows = sites.iter().map(|timed| {
        let site = timed.record;
        let station = station_of(site);
        row(
            &site.name,
            &timed.interval,
            (site.latitude, site.longitude, site.elevation),
            station.and_then(|s| s.description.as_deref()),
            "ss",
            station.map(|s| s.name.as_str()).unwrap_or_default(),
            lddate,
        )
    });

    station_rows.chain(site_rows).collect()
}

fn row(
    name: &str,
    interval: &ValidityInterval,
    (lat, lon, elev): (Option<f64>, Option<f64>, Option<f64>),
    staname: Option<&str>,
    statype: &str,
    refsta: &str,
    lddate: &str,
) -> FlatRecord {
    let offdate = match interval.offset {
        Offset::At(offset) => jdate(offset),
        Offset::Open => NA_INT.to_owned(),
    };

    FlatRecord::from(vec![
        name.to_owned(),
        jdate(interval.onset),
        offdate,
        optional_decimal(lat),
        optional_decimal(lon),
        optional_decimal(elev),
        staname.unwrap_or_default().to_owned(),
        statype.to_owned(),
        refsta.to_owned(),
        decimal(0.0),
        decimal(0.0),
        lddate.to_owned(),
    ])
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
