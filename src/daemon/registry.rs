//! Call registry — the daemon's table of active calls.
//!
//! A call reported by an `in_call` peer is owned by that connection, so
//! it can be dropped implicitly when the in-call process goes away.
//! Calls reported by `script` peers have no owner and stay until they
//! are removed explicitly.

use std::collections::BTreeMap;

use crate::calls::{Call, CallCount};

use super::state::ConnectionId;

#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: BTreeMap<Call, Option<ConnectionId>>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Err("duplicate_call")` if the call is already registered.
    pub fn add_call(
        &mut self,
        call: Call,
        owner: Option<ConnectionId>,
    ) -> Result<(), &'static str> {
        if self.calls.contains_key(&call) {
            return Err("duplicate_call");
        }
        self.calls.insert(call, owner);
        Ok(())
    }

    /// Returns `Err("call_not_found")` for an unknown call.
    pub fn remove_call(&mut self, call: &Call) -> Result<(), &'static str> {
        self.calls.remove(call).map(|_| ()).ok_or("call_not_found")
    }

    /// Every call owned by `owner`, in id order. The calls stay
    /// registered; the caller removes them one at a time.
    pub fn owned_by(&self, owner: ConnectionId) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|(_, o)| **o == Some(owner))
            .map(|(call, _)| call.clone())
            .collect()
    }

    pub fn call_ids(&self) -> Vec<String> {
        self.calls.keys().map(|c| c.id().to_string()).collect()
    }
}

impl CallCount for CallRegistry {
    fn current_call_count(&self) -> usize {
        self.calls.len()
    }
}
