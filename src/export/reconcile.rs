use chrono::{DateTime, Utc};

use crate::{
    flatfile::{network_pair, station_pair},
    interval::{timed, timed_by, timed_collapsed_within, Timed},
    resolve::ExportBundle,
    resources::{
        Channel, NetworkMembership, Sensor, Site, Station, StationMembership, Versioned,
    },
};

/// Validity intervals for everything in a bundle.
///
/// Channels are split per version. Each station and site entity merges its adjacent versions
/// with the same name, and is only closed by its own later versions. Memberships are closed by
/// the next version of the same pair.
#[derive(Debug)]
pub struct Reconciled<'b> {
    /// The bundle the intervals refer to.
    pub bundle: &'b ExportBundle,
    /// Every channel version.
    pub channels: Vec<Timed<'b, Channel>>,
    /// Site runs.
    pub sites: Vec<Timed<'b, Site>>,
    /// Station runs.
    pub stations: Vec<Timed<'b, Station>>,
    /// Station memberships.
    pub station_memberships: Vec<Timed<'b, StationMembership>>,
    /// Network memberships.
    pub network_memberships: Vec<Timed<'b, NetworkMembership>>,
    /// Sensor versions, empty without side data.
    pub sensors: Vec<Timed<'b, Sensor>>,
}

impl<'b> Reconciled<'b> {
    /// Compute all intervals of a bundle.
    pub fn new(bundle: &'b ExportBundle) -> Self {
        let sensors = bundle
            .side
            .as_ref()
            .map(|side| timed(&side.sensors))
            .unwrap_or_default();

        Reconciled {
            bundle,
            channels: timed(&bundle.channels),
            sites: timed_collapsed_within(&bundle.sites, |s| s.entity_id, |s| s.name.clone()),
            stations: timed_collapsed_within(
                &bundle.stations,
                |s| s.entity_id,
                |s| s.name.clone(),
            ),
            station_memberships: timed_by(&bundle.station_memberships, station_pair),
            network_memberships: timed_by(&bundle.network_memberships, network_pair),
            sensors,
        }
    }

    /// Name used for `sta` in SITECHAN, the first site of the channel.
    pub fn channel_station(&self) -> &'b str {
        self.bundle
            .sites
            .first()
            .map(|s| s.name.as_str())
            .unwrap_or_default()
    }

    /// Distinct site names in order of first appearance.
    pub fn site_names(&self) -> Vec<&'b str> {
        let mut names: Vec<&'b str> = vec![];
        for site in &self.sites {
            let name = site.record.name.as_str();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// The station a site version belongs to, through the station membership in effect when
    /// the site version took effect.
    pub fn station_of(&self, site: &Site) -> Option<&'b Station> {
        let at = site.actual_change_time;
        let membership = latest_at(
            self.bundle
                .station_memberships
                .iter()
                .filter(|m| m.site_id == site.entity_id),
            at,
        )?;

        latest_at(
            self.bundle
                .stations
                .iter()
                .filter(|s| s.entity_id == membership.station_id),
            at,
        )
    }
}

// The last version at or before `at`, or the first one if they all start later.
fn latest_at<'a, T, I>(versions: I, at: DateTime<Utc>) -> Option<&'a T>
where
    T: Versioned + 'a,
    I: Iterator<Item = &'a T>,
{
    let mut first = None;
    let mut latest = None;
    for version in versions {
        if first.is_none() {
            first = Some(version);
        }
        if version.effective_time() <= at {
            latest = Some(version);
        }
    }
    latest.or(first)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use crate::interval::Offset;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use uuid::Uuid;

    const SITE_A: &str = "00000000-0000-0000-0000-0000000000b1";
    const SITE_B: &str = "00000000-0000-0000-0000-0000000000b2";
    const STA_1: &str = "00000000-0000-0000-0000-0000000000a1";
    const STA_2: &str = "00000000-0000-0000-0000-0000000000a2";

    fn parse<T: DeserializeOwned>(values: Value) -> Vec<T> {
        serde_json::from_value(values).unwrap()
    }

    fn bundle() -> ExportBundle {
        ExportBundle {
            channel_id: Uuid::nil(),
            channels: parse(json!([
                {"entityId": Uuid::nil(), "name": "BHZ", "actualTime": "2010-01-01T00:00:00Z"},
                {"entityId": Uuid::nil(), "name": "BHZ", "actualTime": "2012-01-01T00:00:00Z"}
            ])),
            sites: parse(json!([
                {"entityId": SITE_A, "name": "MK01", "actualChangeTime": "2010-01-01T00:00:00Z"},
                {"entityId": SITE_A, "name": "MK01", "actualChangeTime": "2011-01-01T00:00:00Z"},
                {"entityId": SITE_B, "name": "MK02", "actualChangeTime": "2012-01-01T00:00:00Z"}
            ])),
            station_memberships: parse(json!([
                {"stationId": STA_1, "siteId": SITE_A, "actualChangeTime": "2010-01-01T00:00:00Z"},
                {"stationId": STA_2, "siteId": SITE_B, "actualChangeTime": "2012-01-01T00:00:00Z"}
            ])),
            stations: parse(json!([
                {"entityId": STA_1, "name": "MKAR", "actualChangeTime": "2009-01-01T00:00:00Z"},
                {"entityId": STA_2, "name": "MKBR", "actualChangeTime": "2009-01-01T00:00:00Z"}
            ])),
            network_memberships: vec![],
            networks: vec![],
            side: None,
        }
    }

    #[test]
    fn test_channels_split_sites_collapse() {
        let bundle = bundle();
        let reconciled = Reconciled::new(&bundle);

        assert_eq!(reconciled.channels.len(), 2);
        assert_eq!(reconciled.sites.len(), 2);
        assert_eq!(reconciled.stations.len(), 2);
        assert!(reconciled.sensors.is_empty());
        assert_eq!(reconciled.channel_station(), "MK01");
        assert_eq!(reconciled.site_names(), vec!["MK01", "MK02"]);
    }

    #[test]
    fn test_concurrent_sites_stay_open() {
        let bundle = bundle();
        let reconciled = Reconciled::new(&bundle);

        let mk01 = &reconciled.sites[0];
        assert_eq!(mk01.record.entity_id, Uuid::parse_str(SITE_A).unwrap());
        assert!(mk01.interval.is_open());
        assert!(reconciled.sites[1].interval.is_open());
        assert!(reconciled.stations.iter().all(|s| s.interval.is_open()));
    }

    #[test]
    fn test_renamed_site_is_closed_by_itself() {
        let mut bundle = bundle();
        bundle.sites = parse(json!([
            {"entityId": SITE_A, "name": "MK01", "actualChangeTime": "2010-01-01T00:00:00Z"},
            {"entityId": SITE_B, "name": "MK02", "actualChangeTime": "2011-01-01T00:00:00Z"},
            {"entityId": SITE_A, "name": "MK1A", "actualChangeTime": "2012-01-01T00:00:00Z"}
        ]));
        let reconciled = Reconciled::new(&bundle);

        let names: Vec<&str> = reconciled.sites.iter().map(|s| s.record.name.as_str()).collect();
        assert_eq!(names, vec!["MK01", "MK02", "MK1A"]);
        assert_eq!(
            reconciled.sites[0].interval.offset,
            Offset::At(bundle.sites[2].actual_change_time)
        );
        assert!(reconciled.sites[1].interval.is_open());
        assert!(reconciled.sites[2].interval.is_open());
    }

    #[test]
    fn test_station_of_site() {
        let bundle = bundle();
        let reconciled = Reconciled::new(&bundle);

        assert_eq!(reconciled.station_of(&bundle.sites[0]).unwrap().name, "MKAR");
        assert_eq!(reconciled.station_of(&bundle.sites[2]).unwrap().name, "MKBR");
    }
}
