//! Resource collections
//!
//! A collection type is synthesized at runtime from a service description:
//! every declared operation becomes an entry in the type's method table, and
//! every instance of the type runs the same hook pipelines around its calls.
//!
//! # Architecture
//!
//! - [`details`] - Lazily loaded, cached description data for one collection
//! - [`factory`] - Builds collection types from details
//! - [`operation`] - Generated operation methods
//! - [`hooks`] - Generic and per-operation parameter/result hooks
//! - [`attributes`] - Identifier and extra attribute storage on instances
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rescoll::{Collection, HttpConnection, Params, Session};
//!
//! async fn create_queue(session: Arc<Session>) -> rescoll::Result<serde_json::Value> {
//!     let class = session.collection("sqs", "QueueCollection")?;
//!     let conn = HttpConnection::for_description(
//!         "http://localhost:9324",
//!         class.details().service_data()?,
//!     )?;
//!     let mut queues = Collection::new(class, Arc::new(conn));
//!
//!     let mut kwargs = Params::new();
//!     kwargs.insert("name".into(), "jobs".into());
//!     queues.call("create", kwargs).await
//! }
//! ```

pub mod attributes;
pub mod details;
pub mod factory;
pub mod hooks;
mod instance;
pub mod operation;

pub use attributes::Attributes;
pub use details::CollectionDetails;
pub use factory::{CollectionFactory, DetailsBuilder};
pub use hooks::Hooks;
pub use instance::{Collection, CollectionType};
pub use operation::OperationMethod;
