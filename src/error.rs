//! Error types for the collection layer.
//!
//! Every failure a collaborator reports (loader, connection, resource
//! constructor) surfaces through [`Error`] unchanged in meaning. Nothing in
//! this crate retries or recovers locally.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while loading descriptions, synthesizing collection types
/// or invoking generated operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The loader found the service but no document matches the requested
    /// API version.
    #[error("no description of '{service}' matches api version {requested} (available: {})", available.join(", "))]
    VersionMismatch {
        /// Service whose description was requested.
        service: String,
        /// Version constraint that could not be satisfied.
        requested: String,
        /// Versions the loader did find, newest first.
        available: Vec<String>,
    },

    /// No description document exists for the service in any search location.
    #[error("no description found for service '{service}'")]
    ServiceNotFound {
        /// Requested service name.
        service: String,
        /// Directories that were searched, in order.
        searched: Vec<PathBuf>,
    },

    /// The service description has no entry for the collection.
    #[error("service '{service}' does not describe a collection named '{collection}'")]
    UnknownCollection { service: String, collection: String },

    /// A description fragment exists but does not have the expected shape.
    #[error("invalid schema for {context}: {source}")]
    InvalidSchema {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The collection type has no generated method under this key.
    #[error("collection '{collection}' has no operation '{operation}'")]
    UnknownOperation { collection: String, operation: String },

    /// The connection exposes no method for the operation's API name.
    #[error("connection does not support '{method}'")]
    UnsupportedOperation {
        /// Connection-side method name derived from the operation's `api_name`.
        method: String,
    },

    /// A parameter marked required was neither passed nor filled from the
    /// collection's identifiers.
    #[error("operation '{operation}' requires parameter '{param}'")]
    MissingParameter { operation: String, param: String },

    /// The session holds no resource type for this (service, resource) pair.
    #[error("no resource type '{resource}' registered for service '{service}'")]
    MissingResourceType { service: String, resource: String },

    /// A registered resource constructor rejected the raw data.
    #[error("could not build resource '{resource}': {source}")]
    Resource {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by the connection while performing a call.
    #[error(transparent)]
    Connection(#[from] anyhow::Error),
}

impl Error {
    /// Wraps a schema deserialization failure with a description of what was
    /// being parsed.
    pub(crate) fn invalid_schema(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidSchema {
            context: context.into(),
            source,
        }
    }
}
