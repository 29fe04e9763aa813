//! Service descriptions
//!
//! Declarative JSON documents describe, per service and API version, which
//! collections exist, what resource type each produces, how instances are
//! identified and which operations can be called.
//!
//! # Module Structure
//!
//! - [`loader`] - Locates, version-selects and merges description documents
//! - [`schema`] - Typed views over the collection/operation fragments
//!
//! # Document shape
//!
//! ```json
//! {
//!   "api_versions": ["2012-10-29"],
//!   "collections": {
//!     "PipelineCollection": {
//!       "resource": "Pipeline",
//!       "identifiers": [{ "var_name": "id", "api_name": "pipelineId" }],
//!       "operations": {
//!         "create": { "api_name": "CreatePipeline", "docs": "...", "params": {} }
//!       }
//!     }
//!   }
//! }
//! ```

pub mod loader;
pub mod schema;

pub use loader::{merge_into, DescriptionLoader, ResourceJsonLoader};
pub use schema::{
    operation_api_names, CollectionSchema, IdentifierSchema, OperationSchema, ParamSchema,
};
