//! Parameter and result hooks.
//!
//! A [`Hooks`] table plays the part of a collection "base class": it holds an
//! optional generic hook for every operation plus per-operation hooks keyed
//! by operation name. A missing hook is the identity transform.
//!
//! Ordering differs between the two pipelines:
//!
//! - parameters: per-operation hook first, then the generic hook sees its
//!   output
//! - results: generic hook first, then the per-operation hook sees its output

use super::attributes::Attributes;
use crate::connection::Params;
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Generic pre-call hook: `(attributes, operation, params) -> params`
pub type ParamsHook = Arc<dyn Fn(&mut Attributes, &str, Params) -> Result<Params> + Send + Sync>;

/// Per-operation pre-call hook: `(attributes, params) -> params`
pub type OperationParamsHook = Arc<dyn Fn(&mut Attributes, Params) -> Result<Params> + Send + Sync>;

/// Generic post-call hook: `(attributes, operation, result) -> result`
pub type ResultHook = Arc<dyn Fn(&mut Attributes, &str, Value) -> Result<Value> + Send + Sync>;

/// Per-operation post-call hook: `(attributes, result) -> result`
pub type OperationResultHook = Arc<dyn Fn(&mut Attributes, Value) -> Result<Value> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Hooks {
    update_params: Option<ParamsHook>,
    update_params_by_op: HashMap<String, OperationParamsHook>,
    post_process: Option<ResultHook>,
    post_process_by_op: HashMap<String, OperationResultHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generic parameter hook
    pub fn on_update_params<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Attributes, &str, Params) -> Result<Params> + Send + Sync + 'static,
    {
        self.update_params = Some(Arc::new(hook));
        self
    }

    /// Set the parameter hook for one operation
    pub fn on_update_params_for<F>(mut self, operation: &str, hook: F) -> Self
    where
        F: Fn(&mut Attributes, Params) -> Result<Params> + Send + Sync + 'static,
    {
        self.update_params_by_op
            .insert(operation.to_string(), Arc::new(hook));
        self
    }

    /// Set the generic result hook
    pub fn on_post_process<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Attributes, &str, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.post_process = Some(Arc::new(hook));
        self
    }

    /// Set the result hook for one operation
    pub fn on_post_process_for<F>(mut self, operation: &str, hook: F) -> Self
    where
        F: Fn(&mut Attributes, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.post_process_by_op
            .insert(operation.to_string(), Arc::new(hook));
        self
    }

    pub fn has_update_params_for(&self, operation: &str) -> bool {
        self.update_params_by_op.contains_key(operation)
    }

    pub fn has_post_process_for(&self, operation: &str) -> bool {
        self.post_process_by_op.contains_key(operation)
    }

    pub fn update_params(
        &self,
        attrs: &mut Attributes,
        operation: &str,
        params: Params,
    ) -> Result<Params> {
        match &self.update_params {
            Some(hook) => hook(attrs, operation, params),
            None => Ok(params),
        }
    }

    pub fn update_params_for(
        &self,
        attrs: &mut Attributes,
        operation: &str,
        params: Params,
    ) -> Result<Params> {
        match self.update_params_by_op.get(operation) {
            Some(hook) => hook(attrs, params),
            None => Ok(params),
        }
    }

    /// Per-operation hook, then the generic hook
    pub fn full_update_params(
        &self,
        attrs: &mut Attributes,
        operation: &str,
        params: Params,
    ) -> Result<Params> {
        let params = self.update_params_for(attrs, operation, params)?;
        self.update_params(attrs, operation, params)
    }

    pub fn post_process(
        &self,
        attrs: &mut Attributes,
        operation: &str,
        result: Value,
    ) -> Result<Value> {
        match &self.post_process {
            Some(hook) => hook(attrs, operation, result),
            None => Ok(result),
        }
    }

    pub fn post_process_for(
        &self,
        attrs: &mut Attributes,
        operation: &str,
        result: Value,
    ) -> Result<Value> {
        match self.post_process_by_op.get(operation) {
            Some(hook) => hook(attrs, result),
            None => Ok(result),
        }
    }

    /// Generic hook, then the per-operation hook
    pub fn full_post_process(
        &self,
        attrs: &mut Attributes,
        operation: &str,
        result: Value,
    ) -> Result<Value> {
        let result = self.post_process(attrs, operation, result)?;
        self.post_process_for(attrs, operation, result)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut update_ops: Vec<&String> = self.update_params_by_op.keys().collect();
        update_ops.sort();
        let mut post_ops: Vec<&String> = self.post_process_by_op.keys().collect();
        post_ops.sort();

        f.debug_struct("Hooks")
            .field("update_params", &self.update_params.is_some())
            .field("update_params_by_op", &update_ops)
            .field("post_process", &self.post_process.is_some())
            .field("post_process_by_op", &post_ops)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_missing_hooks_are_identity() {
        let hooks = Hooks::new();
        let mut attrs = Attributes::default();

        let p = hooks
            .full_update_params(&mut attrs, "create", params(json!({"a": 1})))
            .unwrap();
        assert_eq!(Value::Object(p), json!({"a": 1}));

        let r = hooks
            .full_post_process(&mut attrs, "create", json!(true))
            .unwrap();
        assert_eq!(r, json!(true));
    }

    #[test]
    fn test_update_params_runs_specific_then_generic() {
        let hooks = Hooks::new()
            .on_update_params(|_, _, mut p| {
                let seen = p.contains_key("specific");
                p.insert("generic_saw_specific".to_string(), json!(seen));
                Ok(p)
            })
            .on_update_params_for("create", |_, mut p| {
                p.insert("specific".to_string(), json!(true));
                Ok(p)
            });
        let mut attrs = Attributes::default();

        let p = hooks
            .full_update_params(&mut attrs, "create", Params::new())
            .unwrap();
        assert_eq!(p["generic_saw_specific"], json!(true));

        let p = hooks
            .full_update_params(&mut attrs, "delete", Params::new())
            .unwrap();
        assert_eq!(p["generic_saw_specific"], json!(false));
    }

    #[test]
    fn test_post_process_runs_generic_then_specific() {
        let hooks = Hooks::new()
            .on_post_process(|_, _, _| Ok(json!("generic")))
            .on_post_process_for("get", |_, r| Ok(json!([r, "specific"])));
        let mut attrs = Attributes::default();

        let r = hooks.full_post_process(&mut attrs, "get", json!(null)).unwrap();
        assert_eq!(r, json!(["generic", "specific"]));
        assert!(hooks.has_post_process_for("get"));
        assert!(!hooks.has_update_params_for("get"));
    }
}
