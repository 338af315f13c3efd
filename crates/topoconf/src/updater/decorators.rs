//! value formatting updaters
use super::{HostGroupNames, PropertyUpdater, UpdateError, UpdateProperty};
use crate::configuration::Properties;
use crate::token;
use crate::topology::ClusterTopology;

/// Appends a unit suffix unless the value already carries it (`1024` -> `1024m`)
#[derive(Debug, Clone, derive_new::new)]
pub struct UnitSuffixUpdater {
    suffix: &'static str,
}

impl UpdateProperty for UnitSuffixUpdater {
    fn update_for_cluster_create(
        &self,
        _name: &str,
        value: &str,
        _properties: &Properties,
        _topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        if value.ends_with(self.suffix) {
            return Ok(value.to_string());
        }
        Ok(format!("{value}{}", self.suffix))
    }

    fn required_host_groups(
        &self,
        _name: &str,
        _value: &str,
        _properties: &Properties,
        _topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        Ok(HostGroupNames::new())
    }
}

/// YAML flow sequence notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStyle {
    /// `['a','b']`
    SingleQuoted,
    /// `[a,b]`
    Plain,
}

impl FlowStyle {
    fn format(self, value: &str) -> String {
        let quote = match self {
            FlowStyle::SingleQuoted => "'",
            FlowStyle::Plain => "",
        };
        let elements: Vec<String> = value
            .split(',')
            .map(|element| format!("{quote}{element}{quote}"))
            .collect();
        format!("[{}]", elements.join(","))
    }
}

/// Formats the comma separated result of another updater as a YAML flow sequence
#[derive(Debug, Clone, derive_new::new)]
pub struct YamlListDecorator {
    inner: Box<PropertyUpdater>,
    flow_style: FlowStyle,
}

impl YamlListDecorator {
    pub fn inner(&self) -> &PropertyUpdater {
        &self.inner
    }
}

impl UpdateProperty for YamlListDecorator {
    fn update_for_cluster_create(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        if token::is_deployer_supplied(value) {
            return Ok(value.to_string());
        }

        let updated = self
            .inner
            .update_for_cluster_create(name, value, properties, topology)?;
        Ok(self.flow_style.format(&updated))
    }

    fn required_host_groups(
        &self,
        name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        self.inner
            .required_host_groups(name, value, properties, topology)
    }
}
