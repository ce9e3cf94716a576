//! Site registry: descriptive metadata and plot values per radar site.
//!
//! The registry is a single versioned table (YAML, or JSON) holding three
//! sections:
//! - `color_scales`: named, shared color scales
//! - `metadata`: global attributes written into each site's output files
//! - `plot_values`: quicklook naming and styling per site
//!
//! The whole table is validated at load time. Duplicate site keys, a site
//! present in one section but not the other, a missing `datastream`
//! attribute, or a reference to an undefined color scale all fail the load
//! instead of surfacing on first use.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{VadError, VadResult};
use crate::style::{ColorScale, ColorScaleConfig};

/// Registry schema version understood by this build.
pub const REGISTRY_VERSION: u32 = 1;

/// Registry table shipped with the toolkit.
const BUILTIN_REGISTRY: &str = include_str!("../../../config/sites.yaml");

/// Attribute key naming the output datastream.
pub const DATASTREAM_KEY: &str = "datastream";

// ============================================================================
// File schema
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub version: u32,
    #[serde(default)]
    pub color_scales: BTreeMap<String, ColorScaleConfig>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
    #[serde(default)]
    pub plot_values: Vec<PlotValuesEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub site: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Attribute value: plain text, or a list joined with ", " on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn to_text(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::List(items) => items.join(", "),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotValuesEntry {
    pub site: String,
    pub save_name: String,
    pub facility: String,
    pub title: String,
    pub color_scale: String,
}

// ============================================================================
// Validated registry
// ============================================================================

/// Descriptive attributes for one site.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteMetadata {
    site: String,
    datastream: String,
    attributes: BTreeMap<String, String>,
}

impl SiteMetadata {
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Output datastream identifier, e.g. `sgpxsaprvadI5.c1`.
    pub fn datastream(&self) -> &str {
        &self.datastream
    }

    /// All attributes, sorted by key.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Quicklook naming and styling for one site.
#[derive(Debug, Clone)]
pub struct PlotValues {
    pub save_name: String,
    pub facility: String,
    pub title: String,
    pub color_scale: Arc<ColorScale>,
}

/// Validated site registry.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    version: u32,
    metadata: BTreeMap<String, SiteMetadata>,
    plot_values: BTreeMap<String, PlotValues>,
}

impl SiteRegistry {
    /// The registry embedded at build time.
    pub fn builtin() -> VadResult<Self> {
        Self::from_yaml(BUILTIN_REGISTRY)
    }

    /// Parse and validate a YAML registry.
    pub fn from_yaml(content: &str) -> VadResult<Self> {
        let file: RegistryFile = serde_yaml::from_str(content)?;
        file.validate()
    }

    /// Parse and validate a JSON registry.
    pub fn from_json(content: &str) -> VadResult<Self> {
        let file: RegistryFile = serde_json::from_str(content)?;
        file.validate()
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> VadResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        debug!(path = %path.display(), sites = registry.len(), "Loaded site registry");
        Ok(registry)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Metadata for a site, `None` if unregistered. Callers decide whether
    /// absence is fatal.
    pub fn get_metadata(&self, site: &str) -> Option<&SiteMetadata> {
        self.metadata.get(site)
    }

    /// Metadata for a site, failing with `UnknownSite` when absent.
    pub fn require_metadata(&self, site: &str) -> VadResult<&SiteMetadata> {
        self.get_metadata(site)
            .ok_or_else(|| VadError::UnknownSite(site.to_string()))
    }

    /// Plot values for a site. Absence is always an error.
    pub fn get_plot_values(&self, site: &str) -> VadResult<&PlotValues> {
        self.plot_values
            .get(site)
            .ok_or_else(|| VadError::UnknownSite(site.to_string()))
    }

    /// Registered site keys, sorted.
    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

// ============================================================================
// Validation
// ============================================================================

impl RegistryFile {
    /// Check the table and build the immutable registry.
    pub fn validate(self) -> VadResult<SiteRegistry> {
        if self.version != REGISTRY_VERSION {
            return Err(VadError::Registry(format!(
                "unsupported registry version {} (expected {})",
                self.version, REGISTRY_VERSION
            )));
        }

        let mut scales = BTreeMap::new();
        for (name, config) in &self.color_scales {
            let scale = ColorScale::from_config(name, config).map_err(VadError::Registry)?;
            scales.insert(name.clone(), Arc::new(scale));
        }

        let mut metadata = BTreeMap::new();
        for entry in self.metadata {
            if entry.site.trim().is_empty() {
                return Err(VadError::Registry("metadata entry with empty site key".to_string()));
            }
            let attributes: BTreeMap<String, String> = entry
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_text()))
                .collect();
            let datastream = attributes
                .get(DATASTREAM_KEY)
                .filter(|d| !d.is_empty())
                .cloned()
                .ok_or_else(|| {
                    VadError::Registry(format!(
                        "{}: metadata lacks a '{}' attribute",
                        entry.site, DATASTREAM_KEY
                    ))
                })?;
            let site = entry.site.clone();
            let previous = metadata.insert(
                site.clone(),
                SiteMetadata {
                    site: entry.site,
                    datastream,
                    attributes,
                },
            );
            if previous.is_some() {
                return Err(VadError::Registry(format!("duplicate metadata key: {}", site)));
            }
        }

        let mut plot_values = BTreeMap::new();
        for entry in self.plot_values {
            if entry.save_name.trim().is_empty() {
                return Err(VadError::Registry(format!("{}: empty save_name", entry.site)));
            }
            let color_scale = scales.get(&entry.color_scale).cloned().ok_or_else(|| {
                VadError::Registry(format!(
                    "{}: unknown color scale '{}'",
                    entry.site, entry.color_scale
                ))
            })?;
            let site = entry.site.clone();
            let previous = plot_values.insert(
                entry.site,
                PlotValues {
                    save_name: entry.save_name,
                    facility: entry.facility,
                    title: entry.title,
                    color_scale,
                },
            );
            if previous.is_some() {
                return Err(VadError::Registry(format!("duplicate plot_values key: {}", site)));
            }
        }

        let meta_keys: BTreeSet<&String> = metadata.keys().collect();
        let plot_keys: BTreeSet<&String> = plot_values.keys().collect();
        if let Some(missing) = meta_keys.difference(&plot_keys).next() {
            return Err(VadError::Registry(format!(
                "site '{}' has metadata but no plot_values entry",
                missing
            )));
        }
        if let Some(orphan) = plot_keys.difference(&meta_keys).next() {
            return Err(VadError::Registry(format!(
                "site '{}' has plot_values but no metadata entry",
                orphan
            )));
        }

        Ok(SiteRegistry {
            version: self.version,
            metadata,
            plot_values,
        })
    }
}
