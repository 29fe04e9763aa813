//! Connections
//!
//! A connection is the object that actually talks to a remote service. The
//! collection layer only needs to know which methods it exposes and how to
//! call one of them with a parameter mapping.
//!
//! Connection methods are named by converting an operation's `api_name` with
//! [`xform_name`]: `CreatePipeline` is called as `create_pipeline`.

pub mod http;

pub use http::{format_api_error, HttpConnection};

use async_trait::async_trait;
use serde_json::Value;

/// Wire-level parameter mapping passed to a connection method
pub type Params = serde_json::Map<String, Value>;

/// Remote connection collaborator
#[async_trait]
pub trait Connection: Send + Sync {
    /// Check if the connection exposes a method named `method`
    fn supports(&self, method: &str) -> bool;

    /// Invoke `method` with `params`, returning a mapping or boolean result
    async fn call(&self, method: &str, params: Params) -> anyhow::Result<Value>;
}

/// Convert an API operation name to the connection's method naming
/// convention.
///
/// `CreatePipeline` -> `create_pipeline`, `DescribeDBInstances` ->
/// `describe_db_instances`. Names that are already snake_case are returned
/// unchanged.
pub fn xform_name(api_name: &str) -> String {
    let chars: Vec<char> = api_name.chars().collect();
    let mut out = String::with_capacity(api_name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xform_name_camel_case() {
        assert_eq!(xform_name("CreatePipeline"), "create_pipeline");
        assert_eq!(xform_name("GetQueueUrl"), "get_queue_url");
        assert_eq!(xform_name("ListQueues"), "list_queues");
    }

    #[test]
    fn test_xform_name_acronyms() {
        assert_eq!(xform_name("DescribeDBInstances"), "describe_db_instances");
        assert_eq!(xform_name("CreateSAMLProvider"), "create_saml_provider");
        assert_eq!(xform_name("ARN"), "arn");
    }

    #[test]
    fn test_xform_name_keeps_snake_case() {
        assert_eq!(xform_name("create_pipeline"), "create_pipeline");
        assert_eq!(xform_name("test_role"), "test_role");
    }

    #[test]
    fn test_xform_name_digits() {
        assert_eq!(xform_name("GetObjectV2"), "get_object_v2");
    }
}
