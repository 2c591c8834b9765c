use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Field, FlatRecord, Table, TableLayout, NA_ENDTIME, NA_TIME};
use crate::{
    interval::{Offset, Timed, ValidityInterval},
    resources::{Network, NetworkMembership, Site, Station, StationMembership, Versioned},
    time::epoch_string,
};

pub(crate) const LAYOUT: TableLayout = TableLayout {
    table: Table::Affiliation,
    fields: &[
        Field::text("net", 8),
        Field::text("sta", 6),
        Field::left("time", 17, NA_TIME),
        Field::left("endtime", 17, NA_ENDTIME),
        Field::text("lddate", 17),
    ],
};

/// Entity versions that memberships refer to by id.
#[derive(Clone, Copy, Debug)]
pub struct Members<'a> {
    /// All network versions of the export.
    pub networks: &'a [Network],
    /// All station versions of the export.
    pub stations: &'a [Station],
    /// All site versions of the export.
    pub sites: &'a [Site],
}

/// AFFILIATION rows: network memberships (network, station) followed by station memberships
/// (station, site).
///
/// Names are taken from the version of the referenced entity in effect when the membership
/// took effect.
pub fn affiliation_records(
    network_memberships: &[Timed<'_, NetworkMembership>],
    station_memberships: &[Timed<'_, StationMembership>],
    members: Members<'_>,
    lddate: &str,
) -> Vec<FlatRecord> {
    let network_rows = network_memberships.iter().map(|timed| {
        let membership = timed.record;
        let at = timed.interval.onset;
        row(
            name_at(members.networks, at, |n| n.entity_id == membership.network_id, |n| &n.name),
            name_at(members.stations, at, |s| s.entity_id == membership.station_id, |s| &s.name),
            &timed.interval,
            lddate,
        )
    });

    let station_rows = station_memberships.iter().map(|timed| {
        let membership = timed.record;
        let at = timed.interval.onset;
        row(
            name_at(members.stations, at, |s| s.entity_id == membership.station_id, |s| &s.name),
            name_at(members.sites, at, |s| s.entity_id == membership.site_id, |s| &s.name),
            &timed.interval,
            lddate,
        )
    });

    network_rows.chain(station_rows).collect()
}

/// Identity of a network membership for interval reconciliation.
pub fn network_pair(membership: &NetworkMembership) -> (Uuid, Uuid) {
    (membership.network_id, membership.station_id)
}

/// Identity of a station membership for interval reconciliation.
pub fn station_pair(membership: &StationMembership) -> (Uuid, Uuid) {
    (membership.station_id, membership.site_id)
}

fn name_at<'a, T, M, N>(versions: &'a [T], time: DateTime<Utc>, matches: M, name: N) -> &'a str
where
    T: Versioned,
    M: Fn(&T) -> bool,
    N: Fn(&'a T) -> &'a String,
{
    let candidates: Vec<&'a T> = versions.iter().filter(|v| matches(*v)).collect();
    candidates
        .iter()
        .rev()
        .find(|v| v.effective_time() <= time)
        .or_else(|| candidates.first())
        .map(|v| name(*v).as_str())
        .unwrap_or_default()
}

fn row(net: &str, sta: &str, interval: &ValidityInterval, lddate: &str) -> FlatRecord {
    let endtime = match interval.offset {
        Offset::At(offset) => epoch_string(offset, 3),
        Offset::Open => NA_ENDTIME.to_owned(),
    };

    FlatRecord::from(vec![
        net.to_owned(),
        sta.to_owned(),
        epoch_string(interval.onset, 3),
        endtime,
        lddate.to_owned(),
    ])
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
