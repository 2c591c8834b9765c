use std::{cell::RefCell, collections::HashMap};

use serde_json::Value;

use super::{into_records, QueryRequest, ResourceQuery};
use crate::{errors::StationRefErr, resources::ResourceKind};

/// An in-memory stand in for the station reference service.
///
/// Responses are registered per resource kind, optionally narrowed to one id or parent value.
/// Lookups nothing was registered for return no records. Every request is logged.
#[derive(Debug, Default)]
pub struct StubQueryClient {
    responses: RefCell<HashMap<(ResourceKind, Option<String>), Value>>,
    failures: RefCell<HashMap<ResourceKind, String>>,
    log: RefCell<Vec<QueryRequest>>,
}

impl StubQueryClient {
    /// A stub with nothing registered.
    pub fn new() -> Self {
        StubQueryClient::default()
    }

    /// Answer every lookup of `kind` with `body`, unless a narrower response matches.
    pub fn respond(&self, kind: ResourceKind, body: Value) -> &Self {
        self.responses.borrow_mut().insert((kind, None), body);
        self
    }

    /// Answer lookups of `kind` for the entity or parent `key` with `body`.
    pub fn respond_for<K: ToString>(&self, kind: ResourceKind, key: K, body: Value) -> &Self {
        self.responses
            .borrow_mut()
            .insert((kind, Some(key.to_string())), body);
        self
    }

    /// Fail every lookup of `kind` as if the connection broke.
    pub fn fail(&self, kind: ResourceKind, cause: &str) -> &Self {
        self.failures.borrow_mut().insert(kind, cause.to_owned());
        self
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.log.borrow().clone()
    }

    /// Number of requests made for a kind.
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.log.borrow().iter().filter(|r| r.kind == kind).count()
    }
}

impl ResourceQuery for StubQueryClient {
    fn query(&self, request: &QueryRequest) -> Result<Vec<Value>, StationRefErr> {
        self.log.borrow_mut().push(request.clone());

        if let Some(cause) = self.failures.borrow().get(&request.kind) {
            return Err(StationRefErr::Transport {
                kind: request.kind,
                target: request.target(),
                cause: cause.clone(),
            });
        }

        let key = request
            .id
            .clone()
            .or_else(|| request.parent.as_ref().map(|(_, value)| value.clone()));

        let responses = self.responses.borrow();
        let body = responses
            .get(&(request.kind, key))
            .or_else(|| responses.get(&(request.kind, None)))
            .cloned()
            .unwrap_or(Value::Null);

        into_records(request, body)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
