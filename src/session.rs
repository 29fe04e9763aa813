//! Session
//!
//! A session ties together the description loader, the registry of resource
//! types that operation results are turned into, and the cache of collection
//! types already synthesized.

use crate::collection::{CollectionFactory, CollectionType};
use crate::config::Config;
use crate::description::{DescriptionLoader, ResourceJsonLoader};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A domain object built from raw result data. Downcast to the registered
/// type to use it.
pub type ResourceObject = Box<dyn Any + Send + Sync>;

type Constructor =
    Arc<dyn Fn(Value) -> std::result::Result<ResourceObject, serde_json::Error> + Send + Sync>;

/// A registered, constructible resource type
#[derive(Clone)]
pub struct ResourceType {
    name: String,
    construct: Constructor,
}

impl ResourceType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build one instance from raw result data
    pub fn build(&self, raw: Value) -> Result<ResourceObject> {
        (self.construct)(raw).map_err(|source| Error::Resource {
            resource: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType").field("name", &self.name).finish()
    }
}

/// Registry of resource types keyed by (service, resource name)
#[derive(Debug, Default)]
pub struct ResourceCache {
    resources: RwLock<HashMap<(String, String), ResourceType>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` as the resource type for (service, resource). Raw result
    /// data is deserialized into `T`, so its fields become the object's
    /// attributes.
    pub fn register<T>(&self, service: &str, resource: &str)
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.register_with(service, resource, |raw| {
            let object: T = serde_json::from_value(raw)?;
            Ok(Box::new(object) as ResourceObject)
        });
    }

    /// Register a custom constructor for (service, resource)
    pub fn register_with<F>(&self, service: &str, resource: &str, construct: F)
    where
        F: Fn(Value) -> std::result::Result<ResourceObject, serde_json::Error>
            + Send
            + Sync
            + 'static,
    {
        tracing::debug!("Registering resource type {}/{}", service, resource);
        let resource_type = ResourceType {
            name: resource.to_string(),
            construct: Arc::new(construct),
        };
        self.resources
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((service.to_string(), resource.to_string()), resource_type);
    }

    pub fn get_resource(&self, service: &str, resource: &str) -> Option<ResourceType> {
        self.resources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&(service.to_string(), resource.to_string()))
            .cloned()
    }
}

/// Shared context for building collections
pub struct Session {
    loader: Arc<dyn DescriptionLoader>,
    resources: Arc<ResourceCache>,
    collections: RwLock<HashMap<(String, String), Arc<CollectionType>>>,
    api_versions: HashMap<String, String>,
}

impl Session {
    pub fn new(loader: Arc<dyn DescriptionLoader>) -> Self {
        Self {
            loader,
            resources: Arc::new(ResourceCache::new()),
            collections: RwLock::new(HashMap::new()),
            api_versions: HashMap::new(),
        }
    }

    /// Session over the configured search directories, with the config's
    /// pinned API versions
    pub fn from_config(config: &Config) -> Self {
        let loader = ResourceJsonLoader::new(config.effective_data_dirs());
        let mut session = Self::new(Arc::new(loader));
        session.api_versions = config.api_versions.clone();
        session
    }

    /// Pin the API version used for a service's collections
    pub fn with_api_version(mut self, service: &str, api_version: &str) -> Self {
        self.api_versions
            .insert(service.to_string(), api_version.to_string());
        self
    }

    pub fn loader(&self) -> &Arc<dyn DescriptionLoader> {
        &self.loader
    }

    pub fn resources(&self) -> &Arc<ResourceCache> {
        &self.resources
    }

    /// Pinned API version for a service, if any
    pub fn api_version(&self, service: &str) -> Option<&str> {
        self.api_versions.get(service).map(|s| s.as_str())
    }

    pub fn get_resource(&self, service: &str, resource: &str) -> Option<ResourceType> {
        self.resources.get_resource(service, resource)
    }

    pub fn get_collection(&self, service: &str, collection: &str) -> Option<Arc<CollectionType>> {
        self.collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&(service.to_string(), collection.to_string()))
            .cloned()
    }

    pub fn set_collection(&self, service: &str, collection: &str, class: Arc<CollectionType>) {
        self.collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((service.to_string(), collection.to_string()), class);
    }

    /// Cached collection type, synthesizing it on first request
    pub fn collection(
        self: &Arc<Self>,
        service: &str,
        collection: &str,
    ) -> Result<Arc<CollectionType>> {
        if let Some(class) = self.get_collection(service, collection) {
            tracing::debug!("Collection cache hit: {}/{}", service, collection);
            return Ok(class);
        }

        let class = CollectionFactory::new(Arc::clone(self)).construct_for(service, collection)?;
        self.set_collection(service, collection, Arc::clone(&class));
        Ok(class)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(ResourceJsonLoader::default()))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let collections = self
            .collections
            .read()
            .map(|c| c.len())
            .unwrap_or_default();
        f.debug_struct("Session")
            .field("resources", &self.resources)
            .field("collections", &collections)
            .field("api_versions", &self.api_versions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Queue {
        url: String,
    }

    #[test]
    fn test_register_and_build_resource() {
        let cache = ResourceCache::new();
        cache.register::<Queue>("sqs", "Queue");

        let queue_type = cache.get_resource("sqs", "Queue").unwrap();
        assert_eq!(queue_type.name(), "Queue");

        let object = queue_type.build(json!({"url": "http://q"})).unwrap();
        let queue = object.downcast::<Queue>().unwrap();
        assert_eq!(queue.url, "http://q");

        assert!(cache.get_resource("sqs", "Message").is_none());
        assert!(cache.get_resource("sns", "Queue").is_none());
    }

    #[test]
    fn test_constructor_rejection_is_resource_error() {
        let cache = ResourceCache::new();
        cache.register::<Queue>("sqs", "Queue");

        let err = cache
            .get_resource("sqs", "Queue")
            .unwrap()
            .build(json!({"nope": 1}))
            .unwrap_err();
        assert!(matches!(err, Error::Resource { .. }));
    }

    #[test]
    fn test_collection_types_are_cached() {
        let session = Arc::new(Session::default());
        assert!(session.get_collection("sqs", "QueueCollection").is_none());

        let first = session.collection("sqs", "QueueCollection").unwrap();
        let second = session.collection("sqs", "QueueCollection").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(session.get_collection("sqs", "QueueCollection").is_some());
    }

    #[test]
    fn test_pinned_api_version_reaches_details() {
        let session = Arc::new(Session::default().with_api_version("sqs", "2012-11-05"));
        let class = session.collection("sqs", "QueueCollection").unwrap();
        assert_eq!(class.details().api_version(), Some("2012-11-05"));

        let session = Arc::new(Session::default().with_api_version("sqs", "1999-01-01"));
        let err = session.collection("sqs", "QueueCollection").unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { .. }));
    }
}
