//! multi host updater
use super::{HostGroupNames, UpdateError, UpdateProperty};
use crate::configuration::Properties;
use crate::token::{self, PortToken, LOCALHOST};
use crate::topology::ClusterTopology;
use indexmap::IndexSet;

const DEFAULT_SEPARATOR: char = ',';

/// Text around a token list that belongs to YAML flow notation, re-added by the YAML decorator
const YAML_OPENERS: [&str; 2] = ["['", "["];
const YAML_CLOSERS: [&str; 2] = ["']", "]"];

/// Rewrites a property listing every host of a component
///
/// Either each `%HOSTGROUP::<name>%[:port]` token expands to all hosts of that group, or,
/// without tokens, `localhost` expands to all hosts running the component.
#[derive(Debug, Clone)]
pub struct MultiHostUpdater {
    component: String,
    separator: char,
    /// repeat the prefix (usually a URL scheme) in front of every host
    use_prefix_for_each_host: bool,
}

impl MultiHostUpdater {
    pub fn new(component: String) -> Self {
        Self::with_separator(component, DEFAULT_SEPARATOR, false)
    }

    pub fn with_separator(component: String, separator: char, use_prefix_for_each_host: bool) -> Self {
        Self {
            component,
            separator,
            use_prefix_for_each_host,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    fn join(&self, prefix: Option<&str>, hosts: &IndexSet<String>, suffix: &str) -> String {
        let mut updated = String::new();
        for (index, host) in hosts.iter().enumerate() {
            if index > 0 {
                updated.push(self.separator);
            }
            if let Some(prefix) = prefix {
                if index == 0 || self.use_prefix_for_each_host {
                    updated.push_str(prefix);
                }
            }
            updated.push_str(host);
        }
        updated.push_str(suffix);
        updated
    }
}

/// Text in front of the first host, unless it only opens a YAML list
fn list_prefix(leading: &str) -> Option<&str> {
    (!leading.is_empty() && !YAML_OPENERS.contains(&leading)).then_some(leading)
}

/// Text after the last host, unless it only closes a YAML list
fn list_suffix(trailing: &str) -> &str {
    if YAML_CLOSERS.contains(&trailing) {
        ""
    } else {
        trailing
    }
}

/// Digits of a `:port` at the start of `text`
fn leading_port(text: &str) -> Option<&str> {
    let digits = text.strip_prefix(':')?;
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    (end > 0).then(|| &digits[..end])
}

/// Prefix, port and suffix around the `localhost` occurrences of `value`
///
/// The port is the one of the first occurrence, the suffix starts after the port of the last.
fn localhost_layout(value: &str) -> Option<(Option<&str>, Option<&str>, &str)> {
    let first = value.find(LOCALHOST)?;
    let last = value.rfind(LOCALHOST)?;

    let port = leading_port(&value[first + LOCALHOST.len()..]);
    let mut trailing = &value[last + LOCALHOST.len()..];
    if let Some(last_port) = leading_port(trailing) {
        trailing = &trailing[1 + last_port.len()..];
    }

    Some((list_prefix(&value[..first]), port, list_suffix(trailing)))
}

fn expand_tokens(
    tokens: &[PortToken<'_>],
    topology: &ClusterTopology,
) -> Result<IndexSet<String>, UpdateError> {
    let mut hosts = IndexSet::new();
    for token in tokens {
        let group = topology
            .host_group(token.host_group)
            .ok_or_else(|| UpdateError::UnknownHostGroup {
                group: token.host_group.to_string(),
            })?;
        hosts.extend(group.hosts.iter().map(|host| token.with_port(host)));
    }
    Ok(hosts)
}

impl UpdateProperty for MultiHostUpdater {
    #[tracing::instrument(level = "trace", skip_all, fields(property = name))]
    fn update_for_cluster_create(
        &self,
        name: &str,
        value: &str,
        _properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        if token::is_deployer_supplied(value) {
            return Ok(value.to_string());
        }

        let tokens: Vec<PortToken<'_>> = token::find_port_tokens(value).collect();
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            let Some((prefix, port, suffix)) = localhost_layout(value) else {
                return Ok(value.to_string());
            };
            let hosts: IndexSet<String> = topology
                .host_assignments_for_component(&self.component)
                .into_iter()
                .map(|host| match port {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                })
                .collect();

            if hosts.is_empty() {
                tracing::debug!(component = %self.component, "component has no hosts, value kept");
                return Ok(value.to_string());
            }
            return Ok(self.join(prefix, &hosts, suffix));
        };

        let prefix = list_prefix(&value[..first.span.start]);
        let suffix = list_suffix(&value[last.span.end..]);

        let hosts = expand_tokens(&tokens, topology)?;
        tracing::trace!(hosts = hosts.len(), "expanded host group tokens");
        Ok(self.join(prefix, &hosts, suffix))
    }

    fn required_host_groups(
        &self,
        _name: &str,
        value: &str,
        _properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        if token::is_deployer_supplied(value) {
            return Ok(HostGroupNames::new());
        }

        let mut groups = HostGroupNames::new();
        for token in token::find_port_tokens(value) {
            if topology.host_group(token.host_group).is_none() {
                return Err(UpdateError::UnknownHostGroup {
                    group: token.host_group.to_string(),
                });
            }
            groups.insert(token.host_group.to_string());
        }

        if groups.is_empty() {
            groups.extend(
                topology
                    .host_groups_for_component(&self.component)
                    .into_iter()
                    .map(str::to_string),
            );
        }

        Ok(groups)
    }
}
