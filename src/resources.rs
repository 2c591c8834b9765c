//! Resource kinds served by the station reference service and the typed records they map to.
//!
//! Raw JSON is converted into these records at the query boundary, so a response missing a
//! required key fails right there instead of surfacing later as a blank column.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::errors::StationRefErr;

pub use self::records::{
    Calibration, Channel, InformationSource, Network, NetworkMembership, NetworkRegion,
    Response, Sensor, Site, Station, StationMembership,
};

mod records;

/// Kinds of resources the station reference service serves. The string form is the URL path
/// segment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[allow(missing_docs)]
pub enum ResourceKind {
    #[strum(to_string = "networks")]
    Networks,
    #[strum(to_string = "network-memberships")]
    NetworkMemberships,
    #[strum(to_string = "stations")]
    Stations,
    #[strum(to_string = "station-memberships")]
    StationMemberships,
    #[strum(to_string = "sites")]
    Sites,
    #[strum(to_string = "channels")]
    Channels,
    #[strum(to_string = "digitizers")]
    Digitizers,
    #[strum(to_string = "calibrations")]
    Calibrations,
    #[strum(to_string = "sensors")]
    Sensors,
    #[strum(to_string = "responses")]
    Responses,
}

impl ResourceKind {
    /// Get a static string representation, the URL path segment.
    pub fn as_static_str(self) -> &'static str {
        self.into()
    }
}

/// A record that exists as one of several time ordered versions of the same entity.
pub trait Versioned {
    /// The time this version took effect.
    fn effective_time(&self) -> DateTime<Utc>;
}

/// Convert the raw JSON records of one response into typed records.
///
/// `target` describes the query (id or parent scope) for error messages.
pub fn decode<T: DeserializeOwned>(
    kind: ResourceKind,
    target: &str,
    values: Vec<Value>,
) -> Result<Vec<T>, StationRefErr> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value(value).map_err(|err| StationRefErr::Transport {
                kind,
                target: target.to_owned(),
                cause: format!("malformed record {}: {}", i, err),
            })
        })
        .collect()
}

/// Flatten a JSON object into `(dotted.key, text)` pairs, nested objects joined with dots.
///
/// Arrays and scalars are rendered as compact JSON text, strings without their quotes.
pub fn flatten_json(value: &Value) -> Vec<(String, String)> {
    fn walk(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Object(map) => {
                for (key, val) in map {
                    let name = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    walk(&name, val, out);
                }
            }
            Value::String(s) => out.push((prefix.to_owned(), s.clone())),
            Value::Null => out.push((prefix.to_owned(), String::new())),
            other => out.push((prefix.to_owned(), other.to_string())),
        }
    }

    let mut out = vec![];
    walk("", value, &mut out);
    out
}

pub(crate) fn instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    crate::time::parse_instant(&text).map_err(serde::de::Error::custom)
}

pub(crate) fn optional_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    text.map(|t| crate::time::parse_instant(&t).map_err(serde::de::Error::custom))
        .transpose()
}

/// Collect the distinct ids in first-seen order.
pub(crate) fn unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = vec![];
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use serde_json::json;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn round_trip_strings_for_resource_kind() {
        for kind in ResourceKind::iter() {
            assert_eq!(ResourceKind::from_str(kind.as_static_str()).unwrap(), kind);
        }
        assert_eq!(
            ResourceKind::StationMemberships.to_string(),
            "station-memberships"
        );
    }

    #[test]
    fn test_decode_reports_missing_keys() {
        let values = vec![json!({
            "entityId": "1fac571c-b0f7-466e-a0a6-306d3ba97252",
            "actualChangeTime": "2010-01-01T00:00:00Z"
        })];

        match decode::<Site>(ResourceKind::Sites, "channel-id=x", values) {
            Err(StationRefErr::Transport { kind, cause, .. }) => {
                assert_eq!(kind, ResourceKind::Sites);
                assert!(cause.contains("name"), "cause was: {}", cause);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_flatten_json() {
        let value = json!({
            "name": "IMS_AUX",
            "source": { "originatingOrganization": "IDC", "reference": null },
            "count": 3
        });

        let flat = flatten_json(&value);
        assert!(flat.contains(&("name".to_owned(), "IMS_AUX".to_owned())));
        assert!(flat.contains(&(
            "source.originatingOrganization".to_owned(),
            "IDC".to_owned()
        )));
        assert!(flat.contains(&("source.reference".to_owned(), String::new())));
        assert!(flat.contains(&("count".to_owned(), "3".to_owned())));
    }

    #[test]
    fn test_unique_ids_keeps_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert_eq!(unique_ids(vec![b, a, b, a]), vec![b, a]);
    }
}
