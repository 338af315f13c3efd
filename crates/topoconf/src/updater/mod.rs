//! property updaters
//!
//! Every rewriting rule answers two questions about a property value:
//! - what does it look like once the cluster topology is known ([UpdateProperty::update_for_cluster_create])
//! - which host groups must be resolved before it can be rewritten ([UpdateProperty::required_host_groups])
//!
//! Both answers are computed from the same resolution logic of the individual updaters so that
//! the resolver and the create-time pipeline can never disagree.
//!
//! [PropertyUpdater] is the closed set of updaters the registry works with. Optional and database
//! updaters are wrappers around [SingleHostUpdater], the YAML list decorator wraps any updater.
mod decorators;
mod key_value;
mod multi_host;
mod single_host;

pub use decorators::{FlowStyle, UnitSuffixUpdater, YamlListDecorator};
pub use key_value::KeyValueListUpdater;
pub use multi_host::MultiHostUpdater;
pub use single_host::{DatabaseUpdater, OptionalUpdater, SingleHostUpdater};

use crate::configuration::Properties;
use crate::topology::ClusterTopology;
use std::collections::BTreeSet;

/// Host group names required by a property value
pub type HostGroupNames = BTreeSet<String>;

pub trait UpdateProperty {
    /// Rewrite `value` of property `name` with concrete topology information
    ///
    /// `properties` is the view the value was read from: the merged cluster scope or the local
    /// scope of a single host group.
    fn update_for_cluster_create(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError>;

    /// Host groups `value` depends on, without rewriting anything
    fn required_host_groups(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error(
        "Unable to update configuration property '{property}' with topology information. \
         Component '{component}' is not mapped to any host group or is mapped to multiple groups."
    )]
    Mapping { property: String, component: String },
    #[error("Unable to match blueprint host group token to a host group: {group}")]
    UnknownHostGroup { group: String },
    #[error("Host group '{group}' has no hosts assigned")]
    EmptyHostGroup { group: String },
}

#[derive(Debug, Clone)]
pub enum PropertyUpdater {
    SingleHost(SingleHostUpdater),
    Optional(OptionalUpdater),
    Database(DatabaseUpdater),
    MultiHost(MultiHostUpdater),
    UnitSuffix(UnitSuffixUpdater),
    YamlList(YamlListDecorator),
    KeyValueList(KeyValueListUpdater),
    /// Keeps the value as is. Registers a property without rewriting it.
    OriginalValue,
}

impl PropertyUpdater {
    pub fn single_host(component: impl Into<String>) -> Self {
        Self::SingleHost(SingleHostUpdater::new(component.into()))
    }

    /// Single host updater for a component of an optional service
    pub fn optional_single_host(component: impl Into<String>) -> Self {
        Self::Optional(OptionalUpdater::new(SingleHostUpdater::new(component.into())))
    }

    /// Single host updater applied only when `config_type/managed_property` marks the database
    /// as managed by the cluster
    pub fn database(
        component: impl Into<String>,
        config_type: impl Into<String>,
        managed_property: impl Into<String>,
    ) -> Self {
        Self::Database(DatabaseUpdater::new(
            SingleHostUpdater::new(component.into()),
            config_type.into(),
            managed_property.into(),
        ))
    }

    pub fn multi_host(component: impl Into<String>) -> Self {
        Self::MultiHost(MultiHostUpdater::new(component.into()))
    }

    pub fn multi_host_with(
        component: impl Into<String>,
        separator: char,
        use_prefix_for_each_host: bool,
    ) -> Self {
        Self::MultiHost(MultiHostUpdater::with_separator(
            component.into(),
            separator,
            use_prefix_for_each_host,
        ))
    }

    pub fn unit_suffix(suffix: &'static str) -> Self {
        Self::UnitSuffix(UnitSuffixUpdater::new(suffix))
    }

    pub fn yaml_list(inner: PropertyUpdater, flow_style: FlowStyle) -> Self {
        Self::YamlList(YamlListDecorator::new(Box::new(inner), flow_style))
    }

    pub fn templeton_hive_properties() -> Self {
        Self::KeyValueList(KeyValueListUpdater::templeton_hive_properties())
    }

    fn as_dyn(&self) -> Option<&dyn UpdateProperty> {
        match self {
            PropertyUpdater::SingleHost(updater) => Some(updater),
            PropertyUpdater::Optional(updater) => Some(updater),
            PropertyUpdater::Database(updater) => Some(updater),
            PropertyUpdater::MultiHost(updater) => Some(updater),
            PropertyUpdater::UnitSuffix(updater) => Some(updater),
            PropertyUpdater::YamlList(updater) => Some(updater),
            PropertyUpdater::KeyValueList(updater) => Some(updater),
            PropertyUpdater::OriginalValue => None,
        }
    }
}

impl UpdateProperty for PropertyUpdater {
    fn update_for_cluster_create(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        match self.as_dyn() {
            Some(updater) => updater.update_for_cluster_create(name, value, properties, topology),
            None => Ok(value.to_string()),
        }
    }

    fn required_host_groups(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        match self.as_dyn() {
            Some(updater) => updater.required_host_groups(name, value, properties, topology),
            None => Ok(HostGroupNames::new()),
        }
    }
}
