//! Resource collections synthesized from declarative JSON service
//! descriptions.
//!
//! A service description lists, per API version, the collections a service
//! offers, the resource type each one produces, its identifiers, and the
//! operations that can be called on it. [`CollectionFactory`] turns one of
//! those entries into a [`CollectionType`] with a generated method per
//! operation; a [`Collection`] is an instance of that type bound to a
//! [`Connection`].
//!
//! # Module Structure
//!
//! - [`description`] - Loading and typed views of service descriptions
//! - [`collection`] - Details cache, factory, hooks and collection instances
//! - [`connection`] - The connection trait, method naming, HTTP connection
//! - [`session`] - Resource type registry and collection type cache
//! - [`config`] - Persistent user configuration

pub mod collection;
pub mod config;
pub mod connection;
pub mod description;
pub mod error;
pub mod session;

pub use collection::{
    Attributes, Collection, CollectionDetails, CollectionFactory, CollectionType, Hooks,
    OperationMethod,
};
pub use config::Config;
pub use connection::{xform_name, Connection, HttpConnection, Params};
pub use description::{DescriptionLoader, ResourceJsonLoader};
pub use error::{Error, Result};
pub use session::{ResourceCache, ResourceObject, ResourceType, Session};
