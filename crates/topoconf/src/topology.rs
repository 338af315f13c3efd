//! cluster topology
//!
//! Everything the rewriting rules need to know about a cluster:
//! - the blueprint ([Blueprint]): services and stack cardinalities
//! - the host groups ([HostGroup]): declared components, assigned hosts and local configuration
//! - the cluster wide [Configuration]
//!
//! The component to host group mapping is never stored, it is derived from the host group
//! declarations on every query.
use crate::configuration::{Configuration, Properties};
use crate::ha;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Valid instance counts of a component as declared by the stack
///
/// Textual forms: `1`, `0-1`, `1+`, `ALL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Deployed on every host. Never satisfied by an explicit count.
    All,
    Range { min: u32, max: Option<u32> },
}

impl Cardinality {
    pub fn is_valid_count(&self, count: usize) -> bool {
        match self {
            Cardinality::All => false,
            Cardinality::Range { min, max } => {
                let Ok(count) = u32::try_from(count) else {
                    return max.is_none();
                };
                count >= *min && max.map_or(true, |max| count <= max)
            }
        }
    }
}

/// Undeclared components accept any count
impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::Range { min: 0, max: None }
    }
}

impl std::str::FromStr for Cardinality {
    type Err = CardinalityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || CardinalityParseError(s.to_string());
        let number = |n: &str| n.trim().parse::<u32>().map_err(|_| invalid());

        if s == "ALL" {
            return Ok(Cardinality::All);
        }

        if let Some(min) = s.strip_suffix('+') {
            return Ok(Cardinality::Range {
                min: number(min)?,
                max: None,
            });
        }

        if let Some((min, max)) = s.split_once('-') {
            let (min, max) = (number(min)?, number(max)?);
            if min > max {
                return Err(invalid());
            }
            return Ok(Cardinality::Range {
                min,
                max: Some(max),
            });
        }

        let exact = number(s)?;
        Ok(Cardinality::Range {
            min: exact,
            max: Some(exact),
        })
    }
}

impl TryFrom<String> for Cardinality {
    type Error = CardinalityParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cardinality::All => f.write_str("ALL"),
            Cardinality::Range { min, max: None } => write!(f, "{min}+"),
            Cardinality::Range { min, max: Some(max) } if min == max => write!(f, "{min}"),
            Cardinality::Range { min, max: Some(max) } => write!(f, "{min}-{max}"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("Invalid cardinality '{0}'")]
pub struct CardinalityParseError(pub String);

/// The parts of a blueprint that are not host group specific
#[derive(Debug, Clone, Default)]
pub struct Blueprint {
    pub name: String,
    pub services: IndexSet<String>,
    pub cardinalities: HashMap<String, Cardinality>,
}

impl Blueprint {
    pub fn cardinality(&self, component: &str) -> Cardinality {
        self.cardinalities
            .get(component)
            .copied()
            .unwrap_or_default()
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.services.contains(service)
    }
}

/// A blueprint host group and the physical hosts bound to it
#[derive(Debug, Clone, derive_new::new)]
pub struct HostGroup {
    pub name: String,
    pub components: IndexSet<String>,
    pub hosts: IndexSet<String>,
    /// group local overrides, never merged with the cluster scope
    #[new(default)]
    pub configuration: Configuration,
}

impl HostGroup {
    pub fn contains_component(&self, component: &str) -> bool {
        self.components.contains(component)
    }

    /// Representative host of this group
    pub fn first_host(&self) -> Option<&str> {
        self.hosts.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    blueprint: Blueprint,
    configuration: Configuration,
    host_groups: IndexMap<String, HostGroup>,
}

impl ClusterTopology {
    pub fn new(
        blueprint: Blueprint,
        configuration: Configuration,
        host_groups: impl IntoIterator<Item = HostGroup>,
    ) -> Self {
        Self {
            blueprint,
            configuration,
            host_groups: host_groups
                .into_iter()
                .map(|group| (group.name.clone(), group))
                .collect(),
        }
    }

    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::default()
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Cluster wide scope
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn host_group(&self, name: &str) -> Option<&HostGroup> {
        self.host_groups.get(name)
    }

    pub fn host_group_mut(&mut self, name: &str) -> Option<&mut HostGroup> {
        self.host_groups.get_mut(name)
    }

    pub fn host_groups(&self) -> impl Iterator<Item = &HostGroup> {
        self.host_groups.values()
    }

    pub fn host_groups_mut(&mut self) -> impl Iterator<Item = &mut HostGroup> {
        self.host_groups.values_mut()
    }

    /// Names of all host groups declaring `component`
    pub fn host_groups_for_component(&self, component: &str) -> Vec<&str> {
        self.host_groups
            .values()
            .filter(|group| group.contains_component(component))
            .map(|group| group.name.as_str())
            .collect()
    }

    /// All hosts running `component`, in host group order
    pub fn host_assignments_for_component(&self, component: &str) -> Vec<&str> {
        let hosts: IndexSet<&str> = self
            .host_groups
            .values()
            .filter(|group| group.contains_component(component))
            .flat_map(|group| group.hosts.iter().map(String::as_str))
            .collect();

        hosts.into_iter().collect()
    }

    pub fn cardinality(&self, component: &str) -> Cardinality {
        self.blueprint.cardinality(component)
    }

    pub fn is_namenode_ha_enabled(&self) -> bool {
        ha::is_namenode_ha_enabled(&self.configuration)
    }

    pub fn is_yarn_resourcemanager_ha_enabled(&self) -> bool {
        ha::is_yarn_resourcemanager_ha_enabled(&self.configuration)
    }

    pub fn is_oozie_server_ha_enabled(&self) -> bool {
        ha::is_oozie_server_ha_enabled(&self.configuration)
    }
}

/// Incremental construction of a [ClusterTopology]
///
/// ```
/// # use topoconf::{properties, topology::ClusterTopology};
/// let topology = ClusterTopology::builder()
///     .service("HDFS")
///     .cardinality("SECONDARY_NAMENODE", "0-1")
///     .host_group("master", ["NAMENODE"], ["c6401.ambari.apache.org"])
///     .host_group("workers", ["DATANODE"], ["c6402.ambari.apache.org", "c6403.ambari.apache.org"])
///     .configuration(properties! { "core-site" => { "fs.defaultFS" => "hdfs://localhost:8020" } })
///     .build();
///
/// assert_eq!(topology.host_groups_for_component("NAMENODE"), ["master"]);
/// ```
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    blueprint: Blueprint,
    defaults: Option<Properties>,
    configuration: Properties,
    host_groups: Vec<HostGroup>,
}

impl TopologyBuilder {
    pub fn blueprint_name(mut self, name: impl Into<String>) -> Self {
        self.blueprint.name = name.into();
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.blueprint.services.insert(service.into());
        self
    }

    /// # Panic
    /// Panics on an invalid cardinality expression
    pub fn cardinality(mut self, component: impl Into<String>, cardinality: &str) -> Self {
        let cardinality = cardinality
            .parse()
            .unwrap_or_else(|e| panic!("builder cardinality: {e}"));
        self.blueprint
            .cardinalities
            .insert(component.into(), cardinality);
        self
    }

    pub fn host_group<C, H>(mut self, name: impl Into<String>, components: C, hosts: H) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        H: IntoIterator,
        H::Item: Into<String>,
    {
        self.host_groups.push(HostGroup::new(
            name.into(),
            components.into_iter().map(Into::into).collect(),
            hosts.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Local configuration of the most recently added host group
    ///
    /// # Panic
    /// Panics if no host group was added yet
    pub fn host_group_configuration(mut self, properties: Properties) -> Self {
        let group = self
            .host_groups
            .last_mut()
            .expect("host_group_configuration requires a preceding host_group");
        group.configuration = Configuration::new(properties);
        self
    }

    /// Stack defaults, the parent layer of the cluster configuration
    pub fn defaults(mut self, properties: Properties) -> Self {
        self.defaults = Some(properties);
        self
    }

    pub fn configuration(mut self, properties: Properties) -> Self {
        self.configuration = properties;
        self
    }

    pub fn build(self) -> ClusterTopology {
        let configuration = match self.defaults {
            Some(defaults) => {
                Configuration::with_parent(self.configuration, Configuration::new(defaults))
            }
            None => Configuration::new(self.configuration),
        };

        ClusterTopology::new(self.blueprint, configuration, self.host_groups)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_cardinality() {
        assert_eq!(
            "1".parse::<Cardinality>(),
            Ok(Cardinality::Range { min: 1, max: Some(1) })
        );
        assert_eq!(
            "0-1".parse::<Cardinality>(),
            Ok(Cardinality::Range { min: 0, max: Some(1) })
        );
        assert_eq!(
            "1+".parse::<Cardinality>(),
            Ok(Cardinality::Range { min: 1, max: None })
        );
        assert_eq!("ALL".parse::<Cardinality>(), Ok(Cardinality::All));
        assert_eq!(
            "2-1".parse::<Cardinality>(),
            Err(CardinalityParseError("2-1".to_string()))
        );
        assert!("many".parse::<Cardinality>().is_err());
    }

    #[test]
    fn cardinality_counts() {
        let optional: Cardinality = "0-1".parse().unwrap();
        assert!(optional.is_valid_count(0));
        assert!(optional.is_valid_count(1));
        assert!(!optional.is_valid_count(2));

        let required: Cardinality = "1+".parse().unwrap();
        assert!(!required.is_valid_count(0));
        assert!(required.is_valid_count(12));

        assert!(!Cardinality::All.is_valid_count(0));
        assert!(Cardinality::default().is_valid_count(0));
    }

    #[test]
    fn cardinality_display_round_trips() {
        for text in ["1", "0-1", "1+", "ALL"] {
            let cardinality: Cardinality = text.parse().unwrap();
            assert_eq!(cardinality.to_string(), text);
        }
    }

    #[test]
    fn component_mapping() {
        let topology = ClusterTopology::builder()
            .host_group("master", ["NAMENODE", "ZOOKEEPER_SERVER"], ["h1"])
            .host_group("workers", ["DATANODE", "ZOOKEEPER_SERVER"], ["h2", "h3"])
            .host_group("edge", ["CLIENT"], Vec::<String>::new())
            .build();

        assert_eq!(topology.host_groups_for_component("NAMENODE"), ["master"]);
        assert_eq!(
            topology.host_groups_for_component("ZOOKEEPER_SERVER"),
            ["master", "workers"]
        );
        assert!(topology.host_groups_for_component("OOZIE_SERVER").is_empty());
        assert_eq!(
            topology.host_assignments_for_component("ZOOKEEPER_SERVER"),
            ["h1", "h2", "h3"]
        );
    }
}
