//! Collection types and instances.

use super::attributes::Attributes;
use super::details::CollectionDetails;
use super::hooks::Hooks;
use super::operation::OperationMethod;
use crate::connection::{Connection, Params};
use crate::description::IdentifierSchema;
use crate::error::{Error, Result};
use crate::session::{ResourceCache, ResourceObject};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A synthesized collection type.
///
/// Holds the shared [`CollectionDetails`], the method table generated from
/// the operation schema, and the hook table every instance runs. Instances
/// are created with [`Collection::new`].
pub struct CollectionType {
    name: String,
    details: Arc<CollectionDetails>,
    identifiers: Vec<IdentifierSchema>,
    methods: BTreeMap<String, OperationMethod>,
    hooks: Hooks,
    resources: Arc<ResourceCache>,
}

impl CollectionType {
    /// Assemble a type from its parts. Reads the identifier declarations from
    /// `details`, loading the description if needed.
    pub fn new(
        name: impl Into<String>,
        details: Arc<CollectionDetails>,
        methods: BTreeMap<String, OperationMethod>,
        hooks: Hooks,
        resources: Arc<ResourceCache>,
    ) -> Result<Self> {
        let identifiers = details.collection_schema()?.identifiers;
        Ok(Self {
            name: name.into(),
            details,
            identifiers,
            methods,
            hooks,
            resources,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn details(&self) -> &Arc<CollectionDetails> {
        &self.details
    }

    pub fn identifiers(&self) -> &[IdentifierSchema] {
        &self.identifiers
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn method(&self, operation: &str) -> Option<&OperationMethod> {
        self.methods.get(operation)
    }

    /// Generated methods, ordered by operation key
    pub fn methods(&self) -> impl Iterator<Item = &OperationMethod> {
        self.methods.values()
    }

    /// Same schema and methods, different hooks
    pub fn with_hooks(&self, hooks: Hooks) -> Self {
        Self {
            name: self.name.clone(),
            details: Arc::clone(&self.details),
            identifiers: self.identifiers.clone(),
            methods: self.methods.clone(),
            hooks,
            resources: Arc::clone(&self.resources),
        }
    }

    /// Add or replace one method
    pub fn with_method(mut self, method: OperationMethod) -> Self {
        self.methods.insert(method.name().to_string(), method);
        self
    }
}

impl fmt::Debug for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionType")
            .field("name", &self.name)
            .field("details", &self.details)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// A collection handle bound to one connection
pub struct Collection {
    class: Arc<CollectionType>,
    connection: Arc<dyn Connection>,
    attributes: Attributes,
}

impl Collection {
    pub fn new(class: Arc<CollectionType>, connection: Arc<dyn Connection>) -> Self {
        let attributes = Attributes::new(class.identifiers());
        Self {
            class,
            connection,
            attributes,
        }
    }

    /// Create a handle with initial attribute values. Keys matching declared
    /// identifiers fill those; any other key is kept as an extra attribute.
    pub fn with_identifiers<I, K, V>(
        class: Arc<CollectionType>,
        connection: Arc<dyn Connection>,
        identifiers: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut collection = Self::new(class, connection);
        for (name, value) in identifiers {
            collection.attributes.set(name.as_ref(), value);
        }
        collection
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn class(&self) -> &Arc<CollectionType> {
        &self.class
    }

    pub fn details(&self) -> &Arc<CollectionDetails> {
        self.class.details()
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.set(name, value);
    }

    /// Declared identifiers in schema order with their current values
    pub fn identifiers(&self) -> Vec<(&str, Option<&Value>)> {
        self.attributes.identifiers().collect()
    }

    /// Copy each declared identifier's `api_name` field from `result` onto
    /// its `var_name`. Fields absent from `result` are left alone.
    pub fn set_identifiers_from(&mut self, result: &Value) {
        for id in &self.class.identifiers {
            if let Some(value) = result.get(&id.api_name) {
                self.attributes.set(&id.var_name, value.clone());
            }
        }
    }

    pub fn update_params(&mut self, operation: &str, params: Params) -> Result<Params> {
        self.class
            .hooks
            .update_params(&mut self.attributes, operation, params)
    }

    pub fn update_params_for(&mut self, operation: &str, params: Params) -> Result<Params> {
        self.class
            .hooks
            .update_params_for(&mut self.attributes, operation, params)
    }

    /// Per-operation parameter hook, then the generic one
    pub fn full_update_params(&mut self, operation: &str, params: Params) -> Result<Params> {
        self.class
            .hooks
            .full_update_params(&mut self.attributes, operation, params)
    }

    pub fn post_process(&mut self, operation: &str, result: Value) -> Result<Value> {
        self.class
            .hooks
            .post_process(&mut self.attributes, operation, result)
    }

    pub fn post_process_for(&mut self, operation: &str, result: Value) -> Result<Value> {
        self.class
            .hooks
            .post_process_for(&mut self.attributes, operation, result)
    }

    /// Generic result hook, then the per-operation one
    pub fn full_post_process(&mut self, operation: &str, result: Value) -> Result<Value> {
        self.class
            .hooks
            .full_post_process(&mut self.attributes, operation, result)
    }

    /// Build a domain object of this collection's resource type from raw
    /// result data
    pub fn build_resource(&self, raw: Value) -> Result<ResourceObject> {
        let details = self.class.details();
        let service = details.service_name();
        let resource = details.resource()?;

        let Some(resource_type) = self.class.resources.get_resource(service, &resource) else {
            return Err(Error::MissingResourceType {
                service: service.to_string(),
                resource,
            });
        };

        resource_type.build(raw)
    }

    /// Look up a generated method by operation key
    pub fn operation(&self, operation: &str) -> Result<&OperationMethod> {
        self.class
            .method(operation)
            .ok_or_else(|| Error::UnknownOperation {
                collection: self.name().to_string(),
                operation: operation.to_string(),
            })
    }

    /// Invoke a generated operation
    pub async fn call(&mut self, operation: &str, kwargs: Params) -> Result<Value> {
        let class = Arc::clone(&self.class);
        let method = class
            .method(operation)
            .ok_or_else(|| Error::UnknownOperation {
                collection: class.name().to_string(),
                operation: operation.to_string(),
            })?;
        method.invoke(self, kwargs).await
    }

    /// Invoke a generated operation and build a resource from its result
    pub async fn call_resource(
        &mut self,
        operation: &str,
        kwargs: Params,
    ) -> Result<ResourceObject> {
        let result = self.call(operation, kwargs).await?;
        self.build_resource(result)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("class", &self.class.name)
            .field("attributes", &self.attributes)
            .finish()
    }
}
