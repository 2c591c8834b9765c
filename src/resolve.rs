//! Walk the reference chain from a channel up to its networks.
//!
//! channel → site → station membership → station → network membership → network
//!
//! Each hop queries once per distinct id found by the hop before it and concatenates the
//! results. If any one of those queries finds nothing the chain is broken and the export
//! cannot continue.
//! Calibrations, sensors, and responses hang off the channel directly and are optional, but
//! only as a group.

use serde::de::DeserializeOwned;
use strum_macros::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    errors::StationRefErr,
    query::{fetch, ParentKey, QueryRequest, ResourceQuery},
    resources::{
        unique_ids, Calibration, Channel, Network, NetworkMembership, ResourceKind, Response,
        Sensor, Site, Station, StationMembership, Versioned,
    },
    time::TimeWindow,
};

/// The hops of the reference chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
#[allow(missing_docs)]
pub enum Hop {
    #[strum(to_string = "channel")]
    Channel,
    #[strum(to_string = "site")]
    Site,
    #[strum(to_string = "station-membership")]
    StationMembership,
    #[strum(to_string = "station")]
    Station,
    #[strum(to_string = "network-membership")]
    NetworkMembership,
    #[strum(to_string = "network")]
    Network,
}

impl Hop {
    /// The resource kind queried for this hop.
    pub fn kind(self) -> ResourceKind {
        match self {
            Hop::Channel => ResourceKind::Channels,
            Hop::Site => ResourceKind::Sites,
            Hop::StationMembership => ResourceKind::StationMemberships,
            Hop::Station => ResourceKind::Stations,
            Hop::NetworkMembership => ResourceKind::NetworkMemberships,
            Hop::Network => ResourceKind::Networks,
        }
    }
}

/// Calibration, sensor, and response versions of the channel.
#[derive(Clone, Debug, PartialEq)]
pub struct SideData {
    /// Calibration versions, by effective time.
    pub calibrations: Vec<Calibration>,
    /// Sensor versions, by effective time.
    pub sensors: Vec<Sensor>,
    /// Response versions, by effective time.
    pub responses: Vec<Response>,
}

impl SideData {
    /// All three present gives side data, all three absent gives none. Anything else is an
    /// error.
    pub fn from_parts(
        calibrations: Vec<Calibration>,
        sensors: Vec<Sensor>,
        responses: Vec<Response>,
    ) -> Result<Option<Self>, StationRefErr> {
        match (calibrations.is_empty(), sensors.is_empty(), responses.is_empty()) {
            (true, true, true) => Ok(None),
            (false, false, false) => Ok(Some(SideData {
                calibrations,
                sensors,
                responses,
            })),
            _ => Err(StationRefErr::PartialSideData {
                calibrations: calibrations.len(),
                sensors: sensors.len(),
                responses: responses.len(),
            }),
        }
    }
}

/// Everything the export needs, each sequence sorted by effective time.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub struct ExportBundle {
    pub channel_id: Uuid,
    pub channels: Vec<Channel>,
    pub sites: Vec<Site>,
    pub station_memberships: Vec<StationMembership>,
    pub stations: Vec<Station>,
    pub network_memberships: Vec<NetworkMembership>,
    pub networks: Vec<Network>,
    pub side: Option<SideData>,
}

/// Resolves a channel into an [`ExportBundle`] using a query client.
#[derive(Debug)]
pub struct Resolver<'q, Q: ?Sized> {
    client: &'q Q,
    window: TimeWindow,
}

impl<'q, Q> Resolver<'q, Q>
where
    Q: ResourceQuery + ?Sized,
{
    /// Resolve through `client`, limiting every lookup to `window`.
    pub fn new(client: &'q Q, window: TimeWindow) -> Self {
        Resolver { client, window }
    }

    /// Walk the whole chain for a channel. Nothing is written, so a failure here leaves no
    /// output behind.
    pub fn resolve(&self, channel_id: Uuid) -> Result<ExportBundle, StationRefErr> {
        let window = self.window;

        let channels: Vec<Channel> = self.hop(
            Hop::Channel,
            vec![QueryRequest::by_id(ResourceKind::Channels, channel_id, window)],
        )?;

        let sites: Vec<Site> = self.hop(
            Hop::Site,
            vec![QueryRequest::scoped(
                ResourceKind::Sites,
                ParentKey::ChannelId,
                channel_id,
                window,
            )],
        )?;

        let station_memberships: Vec<StationMembership> = self.hop(
            Hop::StationMembership,
            self.scoped(
                ResourceKind::StationMemberships,
                ParentKey::SiteId,
                unique_ids(sites.iter().map(|s| s.entity_id)),
            ),
        )?;

        let stations: Vec<Station> = self.hop(
            Hop::Station,
            self.by_id(
                ResourceKind::Stations,
                unique_ids(station_memberships.iter().map(|m| m.station_id)),
            ),
        )?;

        let network_memberships: Vec<NetworkMembership> = self.hop(
            Hop::NetworkMembership,
            self.scoped(
                ResourceKind::NetworkMemberships,
                ParentKey::StationId,
                unique_ids(stations.iter().map(|s| s.entity_id)),
            ),
        )?;

        let networks: Vec<Network> = self.hop(
            Hop::Network,
            self.by_id(
                ResourceKind::Networks,
                unique_ids(network_memberships.iter().map(|m| m.network_id)),
            ),
        )?;

        let side = self.side_data(channel_id)?;

        Ok(ExportBundle {
            channel_id,
            channels,
            sites,
            station_memberships,
            stations,
            network_memberships,
            networks,
            side,
        })
    }

    /// Calibrations, sensors, and responses of a channel, all or nothing.
    pub fn side_data(&self, channel_id: Uuid) -> Result<Option<SideData>, StationRefErr> {
        let calibrations = self.optional(ResourceKind::Calibrations, channel_id)?;
        let sensors = self.optional(ResourceKind::Sensors, channel_id)?;
        let responses = self.optional(ResourceKind::Responses, channel_id)?;

        let side = SideData::from_parts(calibrations, sensors, responses);
        if let Err(ref err) = side {
            warn!(channel = %channel_id, "{}", err);
        }
        side
    }

    fn hop<T>(&self, hop: Hop, requests: Vec<QueryRequest>) -> Result<Vec<T>, StationRefErr>
    where
        T: DeserializeOwned + Versioned,
    {
        let mut records: Vec<T> = vec![];
        for request in &requests {
            let found = fetch::<T, Q>(self.client, request)?;
            if found.is_empty() {
                warn!(hop = %hop, target = %request.target(), "reference chain broken");
                return Err(StationRefErr::ChainBreak { hop });
            }
            records.extend(found);
        }

        if records.is_empty() {
            warn!(hop = %hop, "reference chain broken, nothing to look up");
            return Err(StationRefErr::ChainBreak { hop });
        }

        records.sort_by_key(|r| r.effective_time());
        debug!(hop = %hop, queries = requests.len(), versions = records.len(), "resolved hop");
        Ok(records)
    }

    fn optional<T>(&self, kind: ResourceKind, channel_id: Uuid) -> Result<Vec<T>, StationRefErr>
    where
        T: DeserializeOwned + Versioned,
    {
        let request = QueryRequest::scoped(kind, ParentKey::ChannelId, channel_id, self.window);
        let mut records: Vec<T> = fetch(self.client, &request)?;
        records.sort_by_key(|r| r.effective_time());
        debug!(kind = %kind, versions = records.len(), "resolved side data");
        Ok(records)
    }

    fn scoped(&self, kind: ResourceKind, key: ParentKey, ids: Vec<Uuid>) -> Vec<QueryRequest> {
        ids.into_iter()
            .map(|id| QueryRequest::scoped(kind, key, id, self.window))
            .collect()
    }

    fn by_id(&self, kind: ResourceKind, ids: Vec<Uuid>) -> Vec<QueryRequest> {
        ids.into_iter()
            .map(|id| QueryRequest::by_id(kind, id, self.window))
            .collect()
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
