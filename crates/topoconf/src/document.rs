//! cluster documents
//!
//! Serialized form of a [ClusterTopology], readable as YAML, JSON or HCL:
//!
//! ```yaml
//! blueprint:
//!   name: hdp-small
//!   services: [HDFS, ZOOKEEPER]
//!   cardinalities:
//!     SECONDARY_NAMENODE: "0-1"
//! stack_defaults:             # parent layer of `configurations`
//!   hadoop-env:
//!     namenode_heapsize: "1024"
//! configurations:
//!   core-site:
//!     fs.defaultFS: hdfs://localhost:8020
//! host_groups:
//!   - name: master
//!     components: [NAMENODE, ZOOKEEPER_SERVER]
//!     hosts: [c6401.ambari.apache.org]
//!     configurations: {}     # host group local overrides
//! ```
use crate::configuration::{Configuration, Properties};
use crate::topology::{Blueprint, Cardinality, CardinalityParseError, ClusterTopology, HostGroup};
use indexmap::{IndexMap, IndexSet};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Hcl,
}

impl DocumentFormat {
    /// Format by file extension
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .map(|extension| extension.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            "hcl" => Ok(DocumentFormat::Hcl),
            _ => Err(LoadError::UnknownFormat(path.display().to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse yaml document")]
    YamlParseFailed(#[from] serde_yaml::Error),
    #[error("Unable to parse json document")]
    JsonParseFailed(#[from] serde_json::Error),
    #[error("Unable to parse hcl document")]
    HclParseFailed(#[from] hcl::Error),
    #[error("Unknown document format for '{0}' (expected .yaml, .yml, .json or .hcl)")]
    UnknownFormat(String),
    #[error("Invalid cardinality of component '{component}'")]
    InvalidCardinality {
        component: String,
        source: CardinalityParseError,
    },
    #[error("Host group '{0}' is declared more than once")]
    DuplicateHostGroup(String),
}

#[derive(serde::Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterDocument {
    pub blueprint: BlueprintDocument,
    pub stack_defaults: Option<Properties>,
    pub configurations: Properties,
    pub host_groups: Vec<HostGroupDocument>,
}

#[derive(serde::Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BlueprintDocument {
    pub name: String,
    pub services: Vec<String>,
    pub cardinalities: IndexMap<String, CardinalityExpression>,
}

/// `1` and `"1"` are both accepted
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CardinalityExpression {
    Count(u32),
    Expression(String),
}

impl CardinalityExpression {
    fn parse(&self) -> Result<Cardinality, CardinalityParseError> {
        match self {
            CardinalityExpression::Count(count) => Ok(Cardinality::Range {
                min: *count,
                max: Some(*count),
            }),
            CardinalityExpression::Expression(expression) => expression.parse(),
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HostGroupDocument {
    pub name: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub configurations: Properties,
}

impl ClusterDocument {
    pub fn parse(contents: &str, format: DocumentFormat) -> Result<Self, LoadError> {
        Ok(match format {
            DocumentFormat::Yaml => serde_yaml::from_str(contents)?,
            DocumentFormat::Json => serde_json::from_str(contents)?,
            DocumentFormat::Hcl => hcl::from_str(contents)?,
        })
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        let format = DocumentFormat::from_path(file_path)?;
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), ?format, "loading file");

        let contents = std::fs::read_to_string(&file_path)?;
        Self::parse(&contents, format)
    }
}

impl TryFrom<ClusterDocument> for ClusterTopology {
    type Error = LoadError;

    fn try_from(document: ClusterDocument) -> Result<Self, Self::Error> {
        let mut cardinalities = std::collections::HashMap::new();
        for (component, expression) in document.blueprint.cardinalities {
            let cardinality = expression
                .parse()
                .map_err(|source| LoadError::InvalidCardinality {
                    component: component.clone(),
                    source,
                })?;
            cardinalities.insert(component, cardinality);
        }

        let blueprint = Blueprint {
            name: document.blueprint.name,
            services: document.blueprint.services.into_iter().collect(),
            cardinalities,
        };

        let configuration = match document.stack_defaults {
            Some(defaults) => {
                Configuration::with_parent(document.configurations, Configuration::new(defaults))
            }
            None => Configuration::new(document.configurations),
        };

        let mut names = IndexSet::new();
        let mut host_groups = Vec::with_capacity(document.host_groups.len());
        for group in document.host_groups {
            if !names.insert(group.name.clone()) {
                return Err(LoadError::DuplicateHostGroup(group.name));
            }

            let mut host_group = HostGroup::new(
                group.name,
                group.components.into_iter().collect(),
                group.hosts.into_iter().collect(),
            );
            host_group.configuration = Configuration::new(group.configurations);
            host_groups.push(host_group);
        }

        tracing::debug!(blueprint = %blueprint.name, host_groups = host_groups.len(), "cluster document loaded");
        Ok(ClusterTopology::new(blueprint, configuration, host_groups))
    }
}

/// Configuration of every scope of a topology, as written by the cli
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct ConfigurationReport {
    /// merged cluster scope
    pub configurations: Properties,
    /// local scope of each host group
    pub host_groups: IndexMap<String, Properties>,
}

impl From<&ClusterTopology> for ConfigurationReport {
    fn from(topology: &ClusterTopology) -> Self {
        Self {
            configurations: topology.configuration().full_properties(),
            host_groups: topology
                .host_groups()
                .map(|group| (group.name.clone(), group.configuration.full_properties()))
                .collect(),
        }
    }
}
