//! Collection Factory
//!
//! Turns the operation schema of a collection into a [`CollectionType`] whose
//! method table holds one [`OperationMethod`] per declared operation.

use super::details::CollectionDetails;
use super::hooks::Hooks;
use super::instance::CollectionType;
use super::operation::OperationMethod;
use crate::description::{DescriptionLoader, OperationSchema};
use crate::error::Result;
use crate::session::Session;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds the details of a collection from (loader, service, collection,
/// pinned API version)
pub type DetailsBuilder = Arc<
    dyn Fn(Arc<dyn DescriptionLoader>, &str, &str, Option<&str>) -> CollectionDetails
        + Send
        + Sync,
>;

/// Builds collection types for a session
pub struct CollectionFactory {
    session: Arc<Session>,
    loader: Arc<dyn DescriptionLoader>,
    base_hooks: Hooks,
    details_builder: Option<DetailsBuilder>,
}

impl CollectionFactory {
    /// Factory using the session's loader and no hooks
    pub fn new(session: Arc<Session>) -> Self {
        let loader = Arc::clone(session.loader());
        Self {
            session,
            loader,
            base_hooks: Hooks::default(),
            details_builder: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn DescriptionLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Hooks every constructed type starts with
    pub fn with_base_hooks(mut self, hooks: Hooks) -> Self {
        self.base_hooks = hooks;
        self
    }

    /// Replace how [`build_details`](Self::build_details) creates details
    pub fn with_details_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(Arc<dyn DescriptionLoader>, &str, &str, Option<&str>) -> CollectionDetails
            + Send
            + Sync
            + 'static,
    {
        self.details_builder = Some(Arc::new(builder));
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn loader(&self) -> &Arc<dyn DescriptionLoader> {
        &self.loader
    }

    pub fn base_hooks(&self) -> &Hooks {
        &self.base_hooks
    }

    /// Build the collection type for (service, collection)
    pub fn construct_for(&self, service: &str, collection: &str) -> Result<Arc<CollectionType>> {
        let details = Arc::new(self.build_details(service, collection));
        let class_name = self.build_class_name(collection);
        let methods = self.build_methods(&details)?;

        tracing::info!(
            "Constructed collection {} for {} ({} operations)",
            class_name,
            service,
            methods.len()
        );

        let class = CollectionType::new(
            class_name,
            details,
            methods,
            self.base_hooks.clone(),
            Arc::clone(self.session.resources()),
        )?;
        Ok(Arc::new(class))
    }

    /// Details for (service, collection) using this factory's loader and the
    /// session's pinned API version
    pub fn build_details(&self, service: &str, collection: &str) -> CollectionDetails {
        let loader = Arc::clone(&self.loader);
        let api_version = self.session.api_version(service);

        match &self.details_builder {
            Some(builder) => builder(loader, service, collection, api_version),
            None => CollectionDetails::new(loader, service, collection)
                .with_api_version(api_version.map(|s| s.to_string())),
        }
    }

    /// Type name for a collection. Names pass through unchanged.
    pub fn build_class_name(&self, collection: &str) -> String {
        collection.to_string()
    }

    /// One generated method per declared operation, keyed by operation key
    pub fn build_methods(
        &self,
        details: &CollectionDetails,
    ) -> Result<BTreeMap<String, OperationMethod>> {
        let schema = details.collection_schema()?;

        Ok(schema
            .operations
            .iter()
            .map(|(op_key, op_schema)| {
                tracing::debug!(
                    "Generating {}.{} -> {}",
                    details.collection_name(),
                    op_key,
                    op_schema.api_name
                );
                (op_key.clone(), self.create_operation_method(op_key, op_schema))
            })
            .collect())
    }

    /// Generated method for one operation. No connection is needed until it
    /// is invoked.
    pub fn create_operation_method(
        &self,
        op_key: &str,
        op_schema: &OperationSchema,
    ) -> OperationMethod {
        OperationMethod::new(op_key, op_schema)
    }
}
