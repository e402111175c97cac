use tokio::sync::oneshot;

use crate::protocol::ResourceType;

/// A row of the in-memory record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub id: u64,
    pub name: String,
    pub rtype: ResourceType,
}

/// Messages understood by the record store actor. Every request carries a
/// oneshot sender the actor answers on.
#[derive(Debug)]
pub enum RecordStoreMessage {
    /// Add a record and hand back the stored row with its new id.
    Insert {
        name: String,
        rtype: ResourceType,
        respond_to: oneshot::Sender<DnsRecord>,
    },

    /// Look up the record matching both name and type.
    FindByNameAndType {
        name: String,
        rtype: ResourceType,
        respond_to: oneshot::Sender<Option<DnsRecord>>,
    },

    /// Every record, ordered by id.
    FindAll {
        respond_to: oneshot::Sender<Vec<DnsRecord>>,
    },
}
