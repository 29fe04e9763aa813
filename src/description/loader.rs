//! Service description loader
//!
//! Resolves `<service>-<api_version>.json` documents from the built-in set
//! compiled into the binary and from any number of search directories, picks
//! the API version, and deep-merges every document for that version.

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Embedded description files (compiled into the binary)
const BUILTIN_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "datapipeline-2012-10-29.json",
        include_str!("../resources/datapipeline-2012-10-29.json"),
    ),
    (
        "sqs-2012-11-05.json",
        include_str!("../resources/sqs-2012-11-05.json"),
    ),
];

/// Source of service description documents.
pub trait DescriptionLoader: Send + Sync {
    /// Load the merged description for `service`.
    ///
    /// `api_version` of `None` selects the newest version available. A
    /// version that exists nowhere fails with [`Error::VersionMismatch`].
    fn load(&self, service: &str, api_version: Option<&str>) -> Result<Value>;
}

/// Where a candidate document lives
#[derive(Debug, Clone)]
enum Source {
    Builtin {
        file_name: &'static str,
        content: &'static str,
    },
    File(PathBuf),
}

impl Source {
    fn display_path(&self) -> PathBuf {
        match self {
            Source::Builtin { file_name, .. } => Path::new("<builtin>").join(file_name),
            Source::File(path) => path.clone(),
        }
    }

    fn read(&self) -> Result<Value> {
        let content = match self {
            Source::Builtin { content, .. } => (*content).to_string(),
            Source::File(path) => std::fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?,
        };

        serde_json::from_str(&content).map_err(|source| Error::Parse {
            path: self.display_path(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    version: String,
    source: Source,
}

/// Default loader over built-in descriptions and search directories
#[derive(Debug, Clone)]
pub struct ResourceJsonLoader {
    data_dirs: Vec<PathBuf>,
    builtins: bool,
}

impl ResourceJsonLoader {
    /// Create a loader searching `data_dirs` in order (later directories
    /// override earlier ones) on top of the built-in descriptions.
    pub fn new<I, P>(data_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            data_dirs: data_dirs.into_iter().map(Into::into).collect(),
            builtins: true,
        }
    }

    /// Ignore the descriptions compiled into the binary
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    /// All API versions available for `service`, newest first
    pub fn available_versions(&self, service: &str) -> Result<Vec<String>> {
        let mut versions: Vec<String> = self
            .candidates(service)?
            .into_iter()
            .map(|c| c.version)
            .collect();
        versions.sort_by(|a, b| b.cmp(a));
        versions.dedup();
        Ok(versions)
    }

    /// Candidate documents in precedence order: built-ins, then each
    /// directory in turn.
    fn candidates(&self, service: &str) -> Result<Vec<Candidate>> {
        let mut found = Vec::new();

        if self.builtins {
            for &(file_name, content) in BUILTIN_DESCRIPTIONS {
                if let Some(version) = parse_file_name(file_name, service) {
                    found.push(Candidate {
                        version,
                        source: Source::Builtin { file_name, content },
                    });
                }
            }
        }

        for dir in &self.data_dirs {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("Skipping missing data dir {:?}", dir);
                    continue;
                }
                Err(source) => {
                    return Err(Error::Io {
                        path: dir.clone(),
                        source,
                    })
                }
            };

            let mut paths: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            paths.sort();

            for path in paths {
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if let Some(version) = parse_file_name(file_name, service) {
                    found.push(Candidate {
                        version,
                        source: Source::File(path.clone()),
                    });
                }
            }
        }

        Ok(found)
    }
}

impl Default for ResourceJsonLoader {
    fn default() -> Self {
        Self::new(Vec::<PathBuf>::new())
    }
}

impl DescriptionLoader for ResourceJsonLoader {
    fn load(&self, service: &str, api_version: Option<&str>) -> Result<Value> {
        let candidates = self.candidates(service)?;
        if candidates.is_empty() {
            return Err(Error::ServiceNotFound {
                service: service.to_string(),
                searched: self.data_dirs.clone(),
            });
        }

        let mut available: Vec<String> = candidates.iter().map(|c| c.version.clone()).collect();
        available.sort_by(|a, b| b.cmp(a));
        available.dedup();

        let selected = match api_version {
            Some(requested) if available.iter().any(|v| v == requested) => requested.to_string(),
            Some(requested) => {
                return Err(Error::VersionMismatch {
                    service: service.to_string(),
                    requested: requested.to_string(),
                    available,
                })
            }
            // Non-empty: checked above
            None => available[0].clone(),
        };

        tracing::debug!(
            "Loading description: service={}, api_version={}",
            service,
            selected
        );

        let mut merged = Value::Object(serde_json::Map::new());
        for candidate in candidates.iter().filter(|c| c.version == selected) {
            tracing::debug!("Merging {:?}", candidate.source.display_path());
            merge_into(&mut merged, candidate.source.read()?);
        }

        if let Value::Object(ref mut map) = merged {
            if !map.contains_key("api_versions") {
                map.insert(
                    "api_versions".to_string(),
                    Value::Array(available.into_iter().map(Value::String).collect()),
                );
            }
        }

        Ok(merged)
    }
}

/// Extract the version from `<service>-<version>.json`.
///
/// Versions are dates (`YYYY-MM-DD`), so neither `sqs-extra-2012.json` nor
/// another service's `sqs-3-2013-01-01.json` is read as an `sqs` document.
fn parse_file_name(file_name: &str, service: &str) -> Option<String> {
    let stem = file_name.strip_suffix(".json")?;
    let version = stem.strip_prefix(service)?.strip_prefix('-')?;
    is_api_version(version).then(|| version.to_string())
}

fn is_api_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Recursively merge `overlay` into `base`. Objects merge key by key; any
/// other value in `overlay` replaces what `base` had.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
