//! Generated operation methods.

use super::instance::Collection;
use crate::connection::{xform_name, Params};
use crate::description::{OperationSchema, ParamSchema};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One entry in a collection type's method table.
///
/// Built by the factory from an operation schema; holds everything needed to
/// run the call and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMethod {
    name: String,
    docs: String,
    api_name: String,
    params: BTreeMap<String, ParamSchema>,
}

impl OperationMethod {
    pub fn new(name: impl Into<String>, schema: &OperationSchema) -> Self {
        Self {
            name: name.into(),
            docs: schema.docs.clone(),
            api_name: schema.api_name.clone(),
            params: schema.params.clone(),
        }
    }

    /// Operation key the method is registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation text, verbatim from the schema
    pub fn docs(&self) -> &str {
        &self.docs
    }

    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn params(&self) -> &BTreeMap<String, ParamSchema> {
        &self.params
    }

    /// Name of the connection method this operation calls
    pub fn connection_method(&self) -> String {
        xform_name(&self.api_name)
    }

    /// Translate caller arguments into wire parameters.
    ///
    /// Declared params are renamed to their `api_name`; undeclared kwargs pass
    /// through untouched. Declared params the caller left out are filled from
    /// same-named collection attributes (usually identifiers).
    pub fn build_params(&self, collection: &Collection, kwargs: Params) -> Params {
        let mut params = Params::new();

        for (key, value) in kwargs {
            let wire = match self.params.get(&key) {
                Some(schema) => schema.wire_name(&key).to_string(),
                None => key,
            };
            params.insert(wire, value);
        }

        for (var_name, schema) in &self.params {
            let wire = schema.wire_name(var_name);
            if params.contains_key(wire) {
                continue;
            }
            if let Some(value) = collection.get(var_name) {
                params.insert(wire.to_string(), value.clone());
            }
        }

        params
    }

    fn check_required(&self, params: &Params) -> Result<()> {
        for (var_name, schema) in &self.params {
            if schema.required && !params.contains_key(schema.wire_name(var_name)) {
                return Err(Error::MissingParameter {
                    operation: self.name.clone(),
                    param: var_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run the operation against `collection`.
    ///
    /// params -> [`Collection::full_update_params`] -> connection call ->
    /// [`Collection::full_post_process`] -> result.
    pub async fn invoke(&self, collection: &mut Collection, kwargs: Params) -> Result<Value> {
        let params = self.build_params(collection, kwargs);
        let params = collection.full_update_params(&self.name, params)?;
        self.check_required(&params)?;

        let method = self.connection_method();
        let connection = Arc::clone(collection.connection());
        if !connection.supports(&method) {
            return Err(Error::UnsupportedOperation { method });
        }

        tracing::debug!(
            "invoke: collection={}, operation={}, method={}",
            collection.name(),
            self.name,
            method
        );
        let raw = connection.call(&method, params).await?;

        collection.full_post_process(&self.name, raw)
    }
}
