use std::net::SocketAddr;

use crate::protocol::ResourceType;

/// Errors that can occur during DNS packet codec operations
#[derive(Debug, thiserror::Error)]
pub enum DnsCodecError {
    #[error("truncated: need {needed} bytes at position {position}, have {available}")]
    Truncated {
        position: usize,
        needed: usize,
        available: usize,
    },

    #[error("position {position} is out of range for a {length} byte buffer")]
    OutOfRange { position: usize, length: usize },

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("invalid name index: pointer to {offset} in a {length} byte packet")]
    InvalidNameIndex { offset: usize, length: usize },

    #[error("recursive name: position {position} already visited")]
    RecursiveName { position: usize },

    #[error("unsupported resource type: {0}")]
    UnsupportedResourceType(ResourceType),

    #[error("{what} is too large: {size}")]
    Oversized { what: &'static str, size: usize },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<DnsCodecError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DnsCodecError {
    /// Returns the innermost error, skipping any field qualification.
    pub fn root_cause(&self) -> &DnsCodecError {
        let mut err = self;
        while let DnsCodecError::Context { source, .. } = err {
            err = source.as_ref();
        }
        err
    }
}

/// Attaches field qualification to codec results.
pub(crate) trait ResultExt<T> {
    fn context(self, context: &str) -> Result<T, DnsCodecError>;

    fn with_context<F>(self, f: F) -> Result<T, DnsCodecError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, DnsCodecError> {
    fn context(self, context: &str) -> Result<T, DnsCodecError> {
        self.with_context(|| context.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T, DnsCodecError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| DnsCodecError::Context {
            context: f(),
            source: Box::new(source),
        })
    }
}

/// Failures of a single query/reply exchange.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("dial {address}: {source}")]
    Dial {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("encode send packet: {0}")]
    Encode(#[source] DnsCodecError),

    #[error("write send packet: {0}")]
    Write(#[source] std::io::Error),

    #[error("read receive packet: {0}")]
    Read(#[source] std::io::Error),

    #[error("decode receive packet: {0}")]
    Decode(#[source] DnsCodecError),
}

/// A [`ClientError`] tagged with the lookup that was attempted.
#[derive(Debug, thiserror::Error)]
#[error("resolve name={name} type={rtype}: {source}")]
pub struct ResolveError {
    pub name: String,
    pub rtype: ResourceType,
    #[source]
    pub source: ClientError,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to start server on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read from UDP: {0}")]
    Receive(#[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: name={name:?} type={rtype}")]
    NotFound { name: String, rtype: ResourceType },

    #[error("record store actor has stopped")]
    ActorGone,
}
