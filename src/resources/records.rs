use chrono::{DateTime, Utc};
use serde::Deserialize;
use strum_macros::{EnumString, IntoStaticStr};
use uuid::Uuid;

use super::{instant, optional_instant, Versioned};

/// One version of a channel.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub entity_id: Uuid,
    pub version_id: Option<Uuid>,
    pub name: String,
    pub depth: Option<f64>,
    pub vertical_angle: Option<f64>,
    pub horizontal_angle: Option<f64>,
    pub nominal_sample_rate: Option<f64>,
    #[serde(deserialize_with = "instant")]
    pub actual_time: DateTime<Utc>,
    pub comment: Option<String>,
}

/// One version of a site, a physical location with one or more channels.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub entity_id: Uuid,
    pub version_id: Option<Uuid>,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    #[serde(deserialize_with = "instant")]
    pub actual_change_time: DateTime<Utc>,
}

/// Relates a site to the station it belongs to.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationMembership {
    pub id: Option<Uuid>,
    pub station_id: Uuid,
    pub site_id: Uuid,
    pub status: Option<String>,
    #[serde(deserialize_with = "instant")]
    pub actual_change_time: DateTime<Utc>,
}

/// One version of a station.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub entity_id: Uuid,
    pub version_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub station_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    #[serde(deserialize_with = "instant")]
    pub actual_change_time: DateTime<Utc>,
}

impl Station {
    /// Two letter CSS station type, `ar` for arrays and `ss` for single stations.
    pub fn css_type(&self) -> &'static str {
        let station_type = self
            .station_type
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        if station_type.contains("array") {
            "ar"
        } else if station_type.contains("component") {
            "ss"
        } else {
            ""
        }
    }
}

/// Relates a station to a network.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMembership {
    pub id: Option<Uuid>,
    pub network_id: Uuid,
    pub station_id: Uuid,
    pub status: Option<String>,
    #[serde(deserialize_with = "instant")]
    pub actual_change_time: DateTime<Utc>,
}

/// Where a piece of reference information came from.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationSource {
    pub originating_organization: Option<String>,
    pub reference: Option<String>,
}

/// One version of a network.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub entity_id: Uuid,
    pub version_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub source: Option<InformationSource>,
    #[serde(deserialize_with = "instant")]
    pub actual_change_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_instant")]
    pub system_change_time: Option<DateTime<Utc>>,
}

impl Network {
    /// Two letter CSS network type derived from the region, empty if unknown.
    pub fn css_type(&self) -> &'static str {
        self.region
            .as_deref()
            .and_then(|region| region.parse::<NetworkRegion>().ok())
            .map(NetworkRegion::css_type)
            .unwrap_or("")
    }
}

/// Geographic extent of a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
#[allow(missing_docs)]
pub enum NetworkRegion {
    #[strum(to_string = "GLOBAL")]
    Global,
    #[strum(to_string = "REGIONAL")]
    Regional,
    #[strum(to_string = "LOCAL")]
    Local,
}

impl NetworkRegion {
    /// The `nettype` column value.
    pub fn css_type(self) -> &'static str {
        match self {
            NetworkRegion::Global => "ww",
            NetworkRegion::Regional => "ar",
            NetworkRegion::Local => "LO",
        }
    }
}

/// One version of the calibration of a channel.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub entity_id: Option<Uuid>,
    pub calibration_factor: Option<f64>,
    pub calibration_period: Option<f64>,
    pub time_shift: Option<f64>,
    #[serde(deserialize_with = "instant")]
    pub actual_time: DateTime<Utc>,
}

/// One version of the sensor installed on a channel.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: Option<Uuid>,
    pub instrument_manufacturer: Option<String>,
    pub instrument_model: Option<String>,
    pub serial_number: Option<String>,
    #[serde(deserialize_with = "instant")]
    pub actual_time: DateTime<Utc>,
}

impl Sensor {
    /// Identity used to decide if two adjacent versions are the same instrument.
    pub fn instrument_identity(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (
            self.instrument_manufacturer.as_deref(),
            self.instrument_model.as_deref(),
            self.serial_number.as_deref(),
        )
    }
}

/// One version of the instrument response of a channel.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: Option<Uuid>,
    pub response_type: Option<String>,
    /// Base64 encoded response file contents.
    pub response_data: String,
    #[serde(deserialize_with = "instant")]
    pub actual_time: DateTime<Utc>,
}

macro_rules! versioned {
    ($($record:ty => $field:ident),+ $(,)?) => {
        $(
            impl Versioned for $record {
                fn effective_time(&self) -> DateTime<Utc> {
                    self.$field
                }
            }
        )+
    };
}

versioned!(
    Channel => actual_time,
    Site => actual_change_time,
    StationMembership => actual_change_time,
    Station => actual_change_time,
    NetworkMembership => actual_change_time,
    Network => actual_change_time,
    Calibration => actual_time,
    Sensor => actual_time,
    Response => actual_time,
);

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_channel_from_json() {
        let channel: Channel = serde_json::from_value(json!({
            "entityId": "1fac571c-b0f7-466e-a0a6-306d3ba97252",
            "versionId": "2fac571c-b0f7-466e-a0a6-306d3ba97252",
            "name": "BHZ",
            "type": "BROADBAND_HIGH_GAIN_VERTICAL",
            "depth": 0.05,
            "verticalAngle": 0.0,
            "horizontalAngle": 90.0,
            "nominalSampleRate": 40.0,
            "actualTime": "2008-04-01T00:00:00Z",
            "comment": "primary vertical"
        }))
        .unwrap();

        assert_eq!(channel.name, "BHZ");
        assert_eq!(channel.depth, Some(0.05));
        assert_eq!(channel.comment.as_deref(), Some("primary vertical"));
        assert_eq!(channel.effective_time().timestamp(), 1_207_008_000);
    }

    #[test]
    fn test_missing_optional_fields_are_none() {
        let site: Site = serde_json::from_value(json!({
            "entityId": "1fac571c-b0f7-466e-a0a6-306d3ba97252",
            "name": "MK01",
            "actualChangeTime": "2008-04-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(site.latitude, None);
        assert_eq!(site.version_id, None);
    }

    #[test]
    fn test_network_type() {
        let mut network: Network = serde_json::from_value(json!({
            "entityId": "1fac571c-b0f7-466e-a0a6-306d3ba97252",
            "name": "IMS_AUX",
            "region": "GLOBAL",
            "source": { "originatingOrganization": "IDC" },
            "actualChangeTime": "2008-04-01T00:00:00Z",
            "systemChangeTime": "2008-04-02T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(network.css_type(), "ww");
        assert!(network.system_change_time.is_some());

        network.region = Some("ATLANTIS".to_owned());
        assert_eq!(network.css_type(), "");
        network.region = None;
        assert_eq!(network.css_type(), "");
    }

    #[test]
    fn test_station_type() {
        let mut station: Station = serde_json::from_value(json!({
            "entityId": "1fac571c-b0f7-466e-a0a6-306d3ba97252",
            "name": "MKAR",
            "stationType": "SeismicArray",
            "actualChangeTime": "2008-04-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(station.css_type(), "ar");
        station.station_type = Some("Seismic3Component".to_owned());
        assert_eq!(station.css_type(), "ss");
        station.station_type = None;
        assert_eq!(station.css_type(), "");
    }
}
