//! DNS wire protocol codec with a small resolver client, a forwarding
//! server and an HTTP lookup API built on top of it.

pub mod api;
pub mod client;
pub mod codec;
pub mod errors;
pub mod name;
pub mod parsers;
pub mod protocol;
pub mod rdata;
pub mod scanner;
pub mod server;
pub mod util;

/// In-memory record store actor.
pub mod actors {
    pub mod messages;
    pub mod record_store_actor;
}

/// Handles for talking to the actors.
pub mod handlers {
    pub mod record_store_handler;
}

pub use client::{Client, ClientConfig, Resolve};
pub use codec::{decode_message, encode_message, DnsCodec};
pub use errors::{ClientError, DnsCodecError, ResolveError, ServerError, StoreError};
pub use protocol::{Class, Header, Message, Opcode, Question, Rcode, ResourceRecord, ResourceType};
pub use rdata::{RData, Soa};
