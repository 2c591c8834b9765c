//! Lookups against the station reference service.
//!
//! Every lookup is one [`QueryRequest`]: a resource kind, optionally narrowed to one entity by
//! id or to the children of a parent, and an optional time window. A [`ResourceQuery`]
//! implementation turns that into records. An empty result is not an error.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::{
    errors::StationRefErr,
    resources::{decode, ResourceKind},
    time::TimeWindow,
};

pub use self::{http::HttpQueryClient, stub::StubQueryClient};

mod http;
mod stub;

/// Query parameter that scopes a lookup to the children of a parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, IntoStaticStr)]
#[allow(missing_docs)]
pub enum ParentKey {
    #[strum(to_string = "network-name")]
    NetworkName,
    #[strum(to_string = "station-name")]
    StationName,
    #[strum(to_string = "site-name")]
    SiteName,
    #[strum(to_string = "channel-id")]
    ChannelId,
    #[strum(to_string = "site-id")]
    SiteId,
    #[strum(to_string = "station-id")]
    StationId,
}

impl ParentKey {
    /// Get a static string representation, the query parameter name.
    pub fn as_static_str(self) -> &'static str {
        self.into()
    }
}

/// One lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRequest {
    /// What to look up.
    pub kind: ResourceKind,
    /// Look up a single entity by id.
    pub id: Option<String>,
    /// Look up the children of a parent.
    pub parent: Option<(ParentKey, String)>,
    /// Limit the versions returned.
    pub window: TimeWindow,
}

impl QueryRequest {
    /// Every record of a kind.
    pub fn all(kind: ResourceKind, window: TimeWindow) -> Self {
        QueryRequest {
            kind,
            id: None,
            parent: None,
            window,
        }
    }

    /// The versions of one entity.
    pub fn by_id<I: Display>(kind: ResourceKind, id: I, window: TimeWindow) -> Self {
        QueryRequest {
            id: Some(id.to_string()),
            ..QueryRequest::all(kind, window)
        }
    }

    /// The records related to a parent.
    pub fn scoped<V: Display>(
        kind: ResourceKind,
        parent: ParentKey,
        value: V,
        window: TimeWindow,
    ) -> Self {
        QueryRequest {
            parent: Some((parent, value.to_string())),
            ..QueryRequest::all(kind, window)
        }
    }

    /// Path below the service root, `<kind>` or `<kind>/id/<id>`.
    pub fn path(&self) -> String {
        match self.id {
            Some(ref id) => format!("{}/id/{}", self.kind, id),
            None => self.kind.to_string(),
        }
    }

    /// Query parameters, the parent scope first and then the time limits that are set.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![];
        if let Some((key, ref value)) = self.parent {
            params.push((key.as_static_str(), value.clone()));
        }
        params.extend(self.window.query_params());
        params
    }

    /// Short description of what is being looked up, for error messages and logs.
    pub fn target(&self) -> String {
        match (&self.id, &self.parent) {
            (Some(id), _) => format!("id {}", id),
            (None, Some((key, value))) => format!("{}={}", key, value),
            (None, None) => "all".to_owned(),
        }
    }
}

/// Something that can answer lookups with raw JSON records.
pub trait ResourceQuery {
    /// Run one lookup. An absent or empty result is `Ok` with no records, anything that keeps
    /// the lookup from completing is a [`StationRefErr::Transport`].
    fn query(&self, request: &QueryRequest) -> Result<Vec<Value>, StationRefErr>;
}

/// Run a lookup and decode the records.
pub fn fetch<T, Q>(client: &Q, request: &QueryRequest) -> Result<Vec<T>, StationRefErr>
where
    T: DeserializeOwned,
    Q: ResourceQuery + ?Sized,
{
    let values = client.query(request)?;
    decode(request.kind, &request.target(), values)
}

/// Normalize a response body to a list of records. `null` is no records and a lone object is
/// one record.
pub(crate) fn into_records(
    request: &QueryRequest,
    body: Value,
) -> Result<Vec<Value>, StationRefErr> {
    match body {
        Value::Array(values) => Ok(values),
        Value::Null => Ok(vec![]),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => Err(StationRefErr::Transport {
            kind: request.kind,
            target: request.target(),
            cause: format!("expected a list of records, got {}", other),
        }),
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
