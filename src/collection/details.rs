//! Lazily loaded description data for one collection.

use crate::description::{CollectionSchema, DescriptionLoader};
use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Description data for one (service, collection) pair.
///
/// Nothing is read until first asked for. The loaded service document and the
/// API version list are each cached once; a cached value is never reloaded,
/// and a failed load leaves the cache empty so the next access retries.
pub struct CollectionDetails {
    service_name: String,
    collection_name: String,
    api_version: Option<String>,
    loader: Arc<dyn DescriptionLoader>,
    loaded_data: OnceLock<Value>,
    api_versions: OnceLock<Vec<String>>,
}

impl CollectionDetails {
    pub fn new(
        loader: Arc<dyn DescriptionLoader>,
        service_name: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            collection_name: collection_name.into(),
            api_version: None,
            loader,
            loaded_data: OnceLock::new(),
            api_versions: OnceLock::new(),
        }
    }

    /// Pin the API version passed to the loader (`None` means latest)
    pub fn with_api_version(mut self, api_version: Option<String>) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn loader(&self) -> &Arc<dyn DescriptionLoader> {
        &self.loader
    }

    /// Check if the service document has been cached
    pub fn is_loaded(&self) -> bool {
        self.loaded_data.get().is_some()
    }

    /// The full merged service description
    pub fn service_data(&self) -> Result<&Value> {
        if let Some(data) = self.loaded_data.get() {
            return Ok(data);
        }

        tracing::debug!(
            "Loading service data: service={}, collection={}",
            self.service_name,
            self.collection_name
        );
        let loaded = self
            .loader
            .load(&self.service_name, self.api_version.as_deref())?;

        // A concurrent first access may have stored a value already; keep it.
        Ok(self.loaded_data.get_or_init(|| loaded))
    }

    /// Store a service document as if it had been loaded.
    ///
    /// Returns `false` and leaves the cache untouched if a document is
    /// already cached.
    pub fn set_service_data(&self, data: Value) -> bool {
        self.loaded_data.set(data).is_ok()
    }

    /// API versions the service description advertises
    pub fn api_versions(&self) -> Result<&[String]> {
        if let Some(versions) = self.api_versions.get() {
            return Ok(versions);
        }

        let versions = match self.service_data()?.get("api_versions") {
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
                Error::invalid_schema(format!("{} api_versions", self.service_name), e)
            })?,
            None => Vec::new(),
        };

        Ok(self.api_versions.get_or_init(|| versions))
    }

    /// Store an API version list as if it had been read from the service
    /// document. Returns `false` if a list is already cached.
    pub fn set_api_versions(&self, versions: Vec<String>) -> bool {
        self.api_versions.set(versions).is_ok()
    }

    /// This collection's entry under the description's `collections`
    pub fn collection_data(&self) -> Result<&Value> {
        self.service_data()?
            .get("collections")
            .and_then(|collections| collections.get(&self.collection_name))
            .ok_or_else(|| Error::UnknownCollection {
                service: self.service_name.clone(),
                collection: self.collection_name.clone(),
            })
    }

    /// Typed view of [`collection_data`](Self::collection_data)
    pub fn collection_schema(&self) -> Result<CollectionSchema> {
        serde_json::from_value(self.collection_data()?.clone())
            .map_err(|e| Error::invalid_schema(self.schema_context(), e))
    }

    /// Name of the resource type this collection produces
    pub fn resource(&self) -> Result<String> {
        let raw = self
            .collection_data()?
            .get("resource")
            .cloned()
            .unwrap_or(Value::Null);
        serde_json::from_value(raw)
            .map_err(|e| Error::invalid_schema(format!("{}.resource", self.schema_context()), e))
    }

    fn schema_context(&self) -> String {
        format!("{}/{}", self.service_name, self.collection_name)
    }
}

impl fmt::Debug for CollectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionDetails")
            .field("service_name", &self.service_name)
            .field("collection_name", &self.collection_name)
            .field("api_version", &self.api_version)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Loader returning whatever document it currently holds
    struct SwappableLoader {
        doc: Mutex<Value>,
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl SwappableLoader {
        fn new(doc: Value) -> Self {
            Self {
                doc: Mutex::new(doc),
                calls: AtomicUsize::new(0),
                fail_first: false,
            }
        }
    }

    impl DescriptionLoader for SwappableLoader {
        fn load(&self, service: &str, api_version: Option<&str>) -> Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(Error::VersionMismatch {
                    service: service.to_string(),
                    requested: api_version.unwrap_or("latest").to_string(),
                    available: vec![],
                });
            }
            Ok(self.doc.lock().unwrap().clone())
        }
    }

    fn pipeline_doc() -> Value {
        json!({
            "api_version": "2012-09-25",
            "api_versions": ["2012-09-25"],
            "collections": {
                "PipelineCollection": {
                    "resource": "Pipeline",
                    "operations": {
                        "create": { "api_name": "CreatePipeline", "docs": "", "params": {} }
                    }
                }
            }
        })
    }

    #[test]
    fn test_nothing_loaded_until_asked() {
        let loader = Arc::new(SwappableLoader::new(pipeline_doc()));
        let details = CollectionDetails::new(loader.clone(), "test", "PipelineCollection");
        assert!(!details.is_loaded());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_service_data_is_cached() {
        let loader = Arc::new(SwappableLoader::new(pipeline_doc()));
        let details = CollectionDetails::new(loader.clone(), "test", "PipelineCollection");

        let first = details.service_data().unwrap() as *const Value;
        *loader.doc.lock().unwrap() = json!({ "api_versions": ["changed"] });
        let second = details.service_data().unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(second["api_versions"], json!(["2012-09-25"]));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collection_data_and_resource() {
        let loader = Arc::new(SwappableLoader::new(pipeline_doc()));
        let details = CollectionDetails::new(loader, "test", "PipelineCollection");

        let data = details.collection_data().unwrap();
        assert!(data.get("operations").is_some());
        assert!(data.get("identifiers").is_none());
        assert_eq!(details.resource().unwrap(), "Pipeline");
        assert_eq!(details.api_versions().unwrap(), ["2012-09-25"]);
    }

    #[test]
    fn test_injected_data_is_read_verbatim() {
        let loader = Arc::new(SwappableLoader::new(pipeline_doc()));
        let details = CollectionDetails::new(loader.clone(), "test", "PipelineCollection");

        assert!(details.set_service_data(json!({
            "api_versions": ["20XX-MM-II"],
            "hello": "world"
        })));
        assert!(!details.set_service_data(json!({})));

        assert_eq!(details.service_data().unwrap()["hello"], "world");
        assert_eq!(details.api_versions().unwrap(), ["20XX-MM-II"]);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cached_api_versions_win() {
        let loader = Arc::new(SwappableLoader::new(pipeline_doc()));
        let details = CollectionDetails::new(loader, "test", "PipelineCollection");

        assert!(details.set_api_versions(vec!["pinned".to_string()]));
        assert_eq!(details.api_versions().unwrap(), ["pinned"]);
        assert_eq!(
            details.service_data().unwrap()["api_versions"],
            json!(["2012-09-25"])
        );
    }

    #[test]
    fn test_failed_load_is_retried() {
        let loader = Arc::new(SwappableLoader {
            fail_first: true,
            ..SwappableLoader::new(pipeline_doc())
        });
        let details = CollectionDetails::new(loader.clone(), "test", "PipelineCollection")
            .with_api_version(Some("2012-09-25".to_string()));

        let err = details.service_data().unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { .. }));
        assert!(!details.is_loaded());

        assert!(details.service_data().is_ok());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_collection() {
        let loader = Arc::new(SwappableLoader::new(pipeline_doc()));
        let details = CollectionDetails::new(loader, "test", "QueueCollection");
        let err = details.collection_data().unwrap_err();
        assert!(matches!(err, Error::UnknownCollection { .. }));
    }
}
