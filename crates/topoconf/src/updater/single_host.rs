//! single host updaters
//!
//! Rewrite a property that points at the one host running a (master) component.
use super::{HostGroupNames, UpdateError, UpdateProperty};
use crate::configuration::{Properties, PropertyLookup};
use crate::ha;
use crate::token::{self, LOCALHOST};
use crate::topology::{ClusterTopology, HostGroup};
use regex::Regex;
use std::sync::LazyLock;

/// Unqualified `host` or `host:port` without scheme or path
///
/// Qualified names are deployer supplied and never match.
static STALE_HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9\-]*)(:\d+)?$").expect("valid stale host regex")
});

/// Placeholder for a host that is not known yet, not a host name
const UNDEFINED_HOST: &str = "undefined";

/// Where a value points to
enum Target<'a> {
    /// an explicit host group token
    Token { text: &'a str, group: &'a HostGroup },
    /// the single host group running the component
    Component { group: &'a HostGroup },
    /// nothing to resolve
    Unchanged,
}

#[derive(Debug, Clone, derive_new::new)]
pub struct SingleHostUpdater {
    component: String,
}

impl SingleHostUpdater {
    pub fn component(&self) -> &str {
        &self.component
    }

    fn locate<'a>(
        &self,
        name: &str,
        value: &'a str,
        properties: &Properties,
        topology: &'a ClusterTopology,
    ) -> Result<Target<'a>, UpdateError> {
        if let Some(token) = token::find_token(value) {
            let group = topology.host_group(token.host_group).ok_or_else(|| {
                UpdateError::UnknownHostGroup {
                    group: token.host_group.to_string(),
                }
            })?;
            return Ok(Target::Token {
                text: token.text,
                group,
            });
        }

        let groups: Vec<&HostGroup> = topology
            .host_groups()
            .filter(|group| group.contains_component(&self.component))
            .collect();

        if let [group] = groups.as_slice() {
            return Ok(Target::Component { group });
        }

        if groups.is_empty() && topology.cardinality(&self.component).is_valid_count(0) {
            tracing::trace!(property = name, component = %self.component, "optional component not deployed");
            return Ok(Target::Unchanged);
        }

        let context = ExemptionContext {
            component: &self.component,
            value,
            group_count: groups.len(),
            properties,
            topology,
        };
        if let Some(exemption) = HA_EXEMPTIONS
            .iter()
            .find(|exemption| (exemption.applies)(&context))
        {
            tracing::debug!(property = name, exemption = exemption.name, "value kept by HA exemption");
            return Ok(Target::Unchanged);
        }

        Err(UpdateError::Mapping {
            property: name.to_string(),
            component: self.component.clone(),
        })
    }
}

impl UpdateProperty for SingleHostUpdater {
    fn update_for_cluster_create(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        match self.locate(name, value, properties, topology)? {
            Target::Token { text, group } => {
                if group.hosts.len() > 1 {
                    // first host wins, the token does not say which one is meant
                    tracing::debug!(property = name, group = %group.name, "token resolves to multiple hosts");
                }
                Ok(value.replace(text, representative_host(group)?))
            }
            Target::Component { group } => {
                Ok(replace_host_reference(value, representative_host(group)?))
            }
            Target::Unchanged => Ok(value.to_string()),
        }
    }

    fn required_host_groups(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        Ok(match self.locate(name, value, properties, topology)? {
            Target::Token { group, .. } | Target::Component { group } => {
                HostGroupNames::from([group.name.clone()])
            }
            Target::Unchanged => HostGroupNames::new(),
        })
    }
}

fn representative_host(group: &HostGroup) -> Result<&str, UpdateError> {
    group.first_host().ok_or_else(|| UpdateError::EmptyHostGroup {
        group: group.name.clone(),
    })
}

/// Points `value` at `host`
///
/// Replaces the `localhost` placeholder. A value that is nothing but an unqualified
/// `host[:port]` address names a stale host and has its host part replaced instead.
fn replace_host_reference(value: &str, host: &str) -> String {
    if value.contains(LOCALHOST) {
        return value.replace(LOCALHOST, host);
    }

    let Some(captures) = STALE_HOST_REGEX.captures(value) else {
        return value.to_string();
    };

    let current_host = captures.get(1).map_or("", |m| m.as_str());
    if current_host == UNDEFINED_HOST {
        return value.to_string();
    }

    let port = captures.get(2).map_or("", |m| m.as_str());
    format!("{host}{port}")
}

struct ExemptionContext<'a> {
    component: &'a str,
    value: &'a str,
    group_count: usize,
    properties: &'a Properties,
    topology: &'a ClusterTopology,
}

impl ExemptionContext<'_> {
    fn is_fqdn(&self) -> bool {
        !self.value.contains(LOCALHOST)
    }
}

/// A topology in which a component legitimately maps to zero or several host groups
struct HaExemption {
    name: &'static str,
    applies: fn(&ExemptionContext<'_>) -> bool,
}

/// Evaluated in order, the first match keeps the value unchanged
const HA_EXEMPTIONS: &[HaExemption] = &[
    HaExemption {
        name: "namenode nameservice reference",
        applies: namenode_nameservice_reference,
    },
    HaExemption {
        name: "namenode fqdn",
        applies: namenode_fqdn,
    },
    HaExemption {
        name: "no secondary namenode",
        applies: no_secondary_namenode,
    },
    HaExemption {
        name: "resourcemanager fqdn",
        applies: resourcemanager_fqdn,
    },
    HaExemption {
        name: "oozie server fqdn",
        applies: oozie_server_fqdn,
    },
    HaExemption {
        name: "hive server fqdn",
        applies: hive_server_fqdn,
    },
    HaExemption {
        name: "hive metastore fqdn",
        applies: hive_metastore_fqdn,
    },
];

/// Properties that hold the logical nameservice instead of a namenode host
const NAMESERVICE_REFERENCES: [(&str, &str); 3] = [
    ("core-site", "fs.defaultFS"),
    ("hbase-site", "hbase.rootdir"),
    ("accumulo-site", "instance.volumes"),
];

fn is_namenode_ha_pair(context: &ExemptionContext<'_>) -> bool {
    context.topology.is_namenode_ha_enabled()
        && context.component == "NAMENODE"
        && context.group_count == 2
}

fn namenode_nameservice_reference(context: &ExemptionContext<'_>) -> bool {
    is_namenode_ha_pair(context)
        && NAMESERVICE_REFERENCES
            .iter()
            .any(|(config_type, name)| context.properties.lookup(config_type, name) == Some(context.value))
}

fn namenode_fqdn(context: &ExemptionContext<'_>) -> bool {
    is_namenode_ha_pair(context) && context.is_fqdn()
}

fn no_secondary_namenode(context: &ExemptionContext<'_>) -> bool {
    context.topology.is_namenode_ha_enabled()
        && context.component == "SECONDARY_NAMENODE"
        && context.group_count == 0
}

fn resourcemanager_fqdn(context: &ExemptionContext<'_>) -> bool {
    context.topology.is_yarn_resourcemanager_ha_enabled()
        && context.component == "RESOURCEMANAGER"
        && context.group_count == 2
        && context.is_fqdn()
}

fn oozie_server_fqdn(context: &ExemptionContext<'_>) -> bool {
    ha::is_oozie_server_ha_enabled(context.properties)
        && context.component == "OOZIE_SERVER"
        && context.group_count > 1
        && context.is_fqdn()
}

fn hive_server_fqdn(context: &ExemptionContext<'_>) -> bool {
    ha::is_hive_server_ha_enabled(context.properties)
        && context.component == "HIVE_SERVER"
        && context.group_count > 1
        && context.is_fqdn()
}

fn hive_metastore_fqdn(context: &ExemptionContext<'_>) -> bool {
    context.component == "HIVE_METASTORE" && context.group_count > 1 && context.is_fqdn()
}

/// Single host updater for components of optional services
///
/// A component that is missing from (or ambiguous in) the topology leaves the value unchanged
/// instead of failing. Unknown host group tokens are still errors.
#[derive(Debug, Clone, derive_new::new)]
pub struct OptionalUpdater {
    inner: SingleHostUpdater,
}

impl UpdateProperty for OptionalUpdater {
    fn update_for_cluster_create(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        match self
            .inner
            .update_for_cluster_create(name, value, properties, topology)
        {
            Err(UpdateError::Mapping { .. }) => {
                tracing::debug!(property = name, component = self.inner.component(), "optional component not available");
                Ok(value.to_string())
            }
            result => result,
        }
    }

    fn required_host_groups(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        match self
            .inner
            .required_host_groups(name, value, properties, topology)
        {
            Err(UpdateError::Mapping { .. }) => Ok(HostGroupNames::new()),
            result => result,
        }
    }
}

/// Single host updater for database connections
///
/// Only a database managed by the cluster (marker property starting with `New`) lives on a
/// cluster host. External databases are never rewritten.
#[derive(Debug, Clone, derive_new::new)]
pub struct DatabaseUpdater {
    inner: SingleHostUpdater,
    config_type: String,
    managed_property: String,
}

impl DatabaseUpdater {
    fn is_database_managed(&self, properties: &Properties) -> bool {
        properties
            .lookup(&self.config_type, &self.managed_property)
            .is_some_and(|marker| marker.starts_with("New"))
    }
}

impl UpdateProperty for DatabaseUpdater {
    fn update_for_cluster_create(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        if !self.is_database_managed(properties) {
            tracing::trace!(property = name, "external database, value kept");
            return Ok(value.to_string());
        }

        self.inner
            .update_for_cluster_create(name, value, properties, topology)
    }

    fn required_host_groups(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        if !self.is_database_managed(properties) {
            return Ok(HostGroupNames::new());
        }

        self.inner
            .required_host_groups(name, value, properties, topology)
    }
}
