use async_trait::async_trait;
use oasis_core_common::Namespace;
use oasis_core_registry::types::Node;

use crate::error::ClientError;

/// The network hop from a client watcher to the current committee leader.
///
/// Out of scope, per the committee node's own `RuntimeHost` boundary: this
/// crate only needs the point where a resolved leader [`Node`] is handed a
/// transaction, not the wire protocol used to reach it.
#[async_trait]
pub trait LeaderTransport: Send + Sync {
    async fn submit(&self, leader: &Node, runtime_id: Namespace, data: Vec<u8>) -> Result<(), ClientError>;
}

/// A transport that accepts every submission without contacting anything,
/// useful for exercising the watcher's leader-tracking logic in isolation.
pub struct NullTransport;

#[async_trait]
impl LeaderTransport for NullTransport {
    async fn submit(&self, _leader: &Node, _runtime_id: Namespace, _data: Vec<u8>) -> Result<(), ClientError> {
        Ok(())
    }
}
