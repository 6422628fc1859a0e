//! Configuration types for firds-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, path::PathBuf, time::Duration};
use tracing::warn;

/// Namespace of the ESMA FIRDS `auth.036` reference data report.
pub const DEFAULT_NAMESPACE: &str = "{urn:iso:std:iso:20022:tech:xsd:auth.036.001.02}";

/// Repeating element that wraps one instrument record.
pub const DEFAULT_ATTRIBUTE: &str = "FinInstrmGnlAttrbts";

/// Field whose closing tag ends a record.
pub const SENTINEL_FIELD: &str = "Issr";

/// File locations used by a run
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Reference document holding the download link (default: "response.xml")
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Directory the archive is saved into (default: ".")
    #[serde(default = "default_dir")]
    pub download_dir: PathBuf,

    /// Directory the archive is unpacked into (default: ".")
    #[serde(default = "default_dir")]
    pub extract_dir: PathBuf,

    /// CSV output file, overwritten on every run (default: "results.csv")
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            download_dir: default_dir(),
            extract_dir: default_dir(),
            output: default_output(),
        }
    }
}

/// Archive download settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Largest piece written to disk per write call, in bytes (default: 128)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Whole-request timeout (None = wait indefinitely)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            timeout: None,
        }
    }
}

/// Record schema for the payload document
///
/// `namespace` is a Clark-notation prefix (`{uri}`) or empty for documents
/// without a namespace. `fields` gives both the scan set and the CSV column
/// order; duplicate names are kept as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Namespace prefix prepended to every tag name
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Container element that opens a record window
    #[serde(default = "default_attribute")]
    pub attribute: String,

    /// Ordered field names
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            attribute: default_attribute(),
            fields: default_fields(),
        }
    }
}

impl SchemaConfig {
    /// Namespace URI without the surrounding braces, `None` for an empty prefix
    pub fn namespace_uri(&self) -> Result<Option<&str>> {
        if self.namespace.is_empty() {
            return Ok(None);
        }
        self.namespace
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|uri| !uri.is_empty())
            .map(Some)
            .ok_or_else(|| {
                Error::config(
                    format!(
                        "namespace must look like '{{uri}}' or be empty, got '{}'",
                        self.namespace
                    ),
                    "schema.namespace",
                )
            })
    }

    /// Field names that occur more than once in `fields`, in first-seen order
    pub fn duplicate_fields(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for field in &self.fields {
            if !seen.insert(field.as_str()) && !duplicates.contains(&field.as_str()) {
                duplicates.push(field.as_str());
            }
        }
        duplicates
    }
}

/// Main configuration for a conversion run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Input/output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Download behaviour
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Payload record schema
    #[serde(default)]
    pub schema: SchemaConfig,
}

impl Config {
    /// Load a configuration file
    ///
    /// Files ending in `.json` are read as JSON, everything else as TOML.
    /// Missing keys fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read config file '{}': {}", path.display(), e),
            ))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|reason| Error::ConfigFile {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Check the settings that would otherwise fail deep inside a stage
    pub fn validate(&self) -> Result<()> {
        if self.fetch.chunk_size == 0 {
            return Err(Error::config(
                "chunk size must be a positive number of bytes",
                "fetch.chunk_size",
            ));
        }
        if self.schema.attribute.is_empty() {
            return Err(Error::config(
                "container attribute must not be empty",
                "schema.attribute",
            ));
        }
        if self.schema.fields.is_empty() {
            return Err(Error::config(
                "field list must name at least one field",
                "schema.fields",
            ));
        }
        self.schema.namespace_uri()?;

        let duplicates = self.schema.duplicate_fields();
        if !duplicates.is_empty() {
            warn!(
                ?duplicates,
                "field list contains duplicates; each occurrence becomes its own CSV column"
            );
        }
        Ok(())
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("response.xml")
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output() -> PathBuf {
    PathBuf::from("results.csv")
}

fn default_chunk_size() -> usize {
    128
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_attribute() -> String {
    DEFAULT_ATTRIBUTE.to_string()
}

fn default_fields() -> Vec<String> {
    [
        "Id",
        "FullNm",
        "ClssfctnTp",
        "ClssfctnTp",
        "CmmdtyDerivInd",
        "NtnlCcy",
        "Issr",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
