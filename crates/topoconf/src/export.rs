//! blueprint export rewriting
//!
//! Turns concrete host names back into host group tokens so that a running cluster's
//! configuration can be reused as a blueprint. Operates on a single properties scope at a
//! time, the pipeline in [crate::processor] decides which scopes and maps are involved.
use crate::configuration::Properties;
use crate::registry::UpdaterMap;
use crate::token;
use crate::updater::PropertyUpdater;
use crate::topology::ClusterTopology;
use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;

/// Properties that may hold an HA nameservice instead of a host
const NAMESERVICE_PROPERTIES: [&str; 3] = ["fs.defaultFS", "hbase.rootdir", "instance.volumes"];

const ALL_INTERFACES: &str = "0.0.0.0";
const UNDEFINED_HOST: &str = "undefined";

/// Host names of every host group, paired with the group's token
///
/// Captured before a scope is mutated, so the topology does not need to stay borrowed.
#[derive(Debug, Clone)]
pub struct HostTokens {
    groups: Vec<(String, Vec<String>)>,
}

impl HostTokens {
    pub fn new(topology: &ClusterTopology) -> Self {
        Self {
            groups: topology
                .host_groups()
                .map(|group| {
                    (
                        token::token_for(&group.name),
                        group.hosts.iter().cloned().collect(),
                    )
                })
                .collect(),
        }
    }

    /// `(token, host)` in host group order, then host order
    fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups.iter().flat_map(|(token, hosts)| {
            hosts
                .iter()
                .map(move |host| (token.as_str(), host.as_str()))
        })
    }
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Replaces every occurrence of `host` that is not part of a longer host name
///
/// Occurrences inside host group tokens are skipped. `None` if there was no other occurrence.
pub fn replace_host(value: &str, host: &str, replacement: &str) -> Option<String> {
    if host.is_empty() {
        return None;
    }

    let tokens = token::token_spans(value);
    let mut replaced = String::with_capacity(value.len());
    let mut last = 0;
    let mut matched = false;
    for (start, _) in value.match_indices(host) {
        let end = start + host.len();
        let before = value[..start].chars().next_back();
        let after = value[end..].chars().next();
        if before.is_some_and(is_host_char) || after.is_some_and(is_host_char) {
            continue;
        }
        if tokens.iter().any(|span| span.start < end && start < span.end) {
            continue;
        }
        replaced.push_str(&value[last..start]);
        replaced.push_str(replacement);
        last = end;
        matched = true;
    }

    if !matched {
        return None;
    }
    replaced.push_str(&value[last..]);
    Some(replaced)
}

/// Exports single host properties
///
/// The first host found (host group order, host order) is replaced with its group token. A
/// property without any known host is removed unless it may legitimately hold no host or is
/// already tokenized.
#[tracing::instrument(level = "trace", skip_all)]
pub fn single_host_export(updaters: &UpdaterMap, properties: &mut Properties, hosts: &HostTokens) {
    for (config_type, type_updaters) in updaters {
        let Some(type_properties) = properties.get_mut(config_type) else {
            continue;
        };

        for name in type_updaters.keys() {
            let Some(value) = type_properties.get_mut(name) else {
                continue;
            };

            let exported = hosts
                .iter()
                .find_map(|(token, host)| replace_host(value, host, token));

            match exported {
                Some(exported) => {
                    tracing::trace!(%config_type, %name, %exported, "exported single host property");
                    *value = exported;
                }
                None if NAMESERVICE_PROPERTIES.contains(&name.as_str())
                    || token::contains_token(value)
                    || value.contains(ALL_INTERFACES)
                    || value.contains(UNDEFINED_HOST) => {}
                None => {
                    tracing::debug!(%config_type, %name, "no host matched, property removed");
                    type_properties.shift_remove(name);
                }
            }
        }
    }
}

/// Exports multi host properties
///
/// Every known host is replaced with its token, the resulting list is deduplicated since
/// several hosts of a group collapse into the same token.
#[tracing::instrument(level = "trace", skip_all)]
pub fn multi_host_export(updaters: &UpdaterMap, properties: &mut Properties, hosts: &HostTokens) {
    for (config_type, type_updaters) in updaters {
        let Some(type_properties) = properties.get_mut(config_type) else {
            continue;
        };

        for (name, updater) in type_updaters {
            let Some(value) = type_properties.get_mut(name) else {
                continue;
            };

            let mut tokenized = value.clone();
            for (token, host) in hosts.iter() {
                if let Some(replaced) = replace_host(&tokenized, host, token) {
                    tokenized = replaced;
                }
            }

            *value = deduplicate(updater, &tokenized);
            tracing::trace!(%config_type, %name, %value, "exported multi host property");
        }
    }
}

/// Deduplicates `value` along the list structure `updater` writes
fn deduplicate(updater: &PropertyUpdater, value: &str) -> String {
    match updater {
        PropertyUpdater::KeyValueList(updater) => updater.rewrite_values(value, deduplicate),
        PropertyUpdater::YamlList(decorator) => deduplicate(decorator.inner(), value),
        PropertyUpdater::MultiHost(updater) => deduplicate_list(value, updater.separator()),
        _ => deduplicate_list(value, ','),
    }
}

/// Removes duplicate elements of a `separator` separated list, keeping `[...]` notation
///
/// Text in front of the first token and after the last token (scheme, path, quotes) is not
/// compared. It stays on every element if every element carries it, otherwise only on the
/// first (prefix) or last (suffix) element.
fn deduplicate_list(value: &str, separator: char) -> String {
    let elements: Vec<String> = value
        .split(separator)
        .map(|element| element.replace(['[', ']'], ""))
        .collect();
    let (Some(first), Some(last)) = (elements.first(), elements.last()) else {
        return value.to_string();
    };

    let prefix = token::find_port_tokens(first)
        .next()
        .map_or("", |token| &first[..token.span.start]);
    let suffix = token::find_port_tokens(last)
        .last()
        .map_or("", |token| &last[token.span.end..]);
    let prefix_each = !prefix.is_empty() && elements.iter().all(|element| element.starts_with(prefix));
    let suffix_each = !suffix.is_empty() && elements.iter().all(|element| element.ends_with(suffix));

    let last_index = elements.len() - 1;
    let mut unique = IndexSet::new();
    for (index, element) in elements.iter().enumerate() {
        let mut element = element.as_str();
        if index == 0 || prefix_each {
            element = element.strip_prefix(prefix).unwrap_or(element);
        }
        if index == last_index || suffix_each {
            element = element.strip_suffix(suffix).unwrap_or(element);
        }
        unique.insert(element);
    }

    let count = unique.len();
    let mut joined = String::with_capacity(value.len());
    for (index, element) in unique.into_iter().enumerate() {
        if index > 0 {
            joined.push(separator);
        }
        if index == 0 || prefix_each {
            joined.push_str(prefix);
        }
        joined.push_str(element);
        if index + 1 == count || suffix_each {
            joined.push_str(suffix);
        }
    }

    if value.starts_with('[') {
        format!("[{joined}]")
    } else {
        joined
    }
}

/// Removes every property bound in `updaters`, regardless of its value
pub fn remove_on_export(updaters: &UpdaterMap, properties: &mut Properties) {
    for (config_type, type_updaters) in updaters {
        let Some(type_properties) = properties.get_mut(config_type) else {
            continue;
        };
        for name in type_updaters.keys() {
            if type_properties.shift_remove(name).is_some() {
                tracing::debug!(%config_type, %name, "property removed on export");
            }
        }
    }
}

/// Decides whether a property is part of an exported blueprint
pub trait PropertyFilter: std::fmt::Debug + Send + Sync {
    fn is_property_included(&self, name: &str, value: &str) -> bool;
}

static PASSWORD_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\S+PASSWORD$").expect("valid password regex"));

/// Excludes properties named `*PASSWORD` (case insensitive)
#[derive(Debug, Default, Clone, Copy)]
pub struct PasswordPropertyFilter;

impl PropertyFilter for PasswordPropertyFilter {
    fn is_property_included(&self, name: &str, _value: &str) -> bool {
        !PASSWORD_NAME_REGEX.is_match(name)
    }
}

/// Drops every property rejected by any of `filters`
pub fn apply_filters(filters: &[Box<dyn PropertyFilter>], properties: &mut Properties) {
    for (config_type, type_properties) in properties.iter_mut() {
        type_properties.retain(|name, value| {
            let included = filters
                .iter()
                .all(|filter| filter.is_property_included(name, value));
            if !included {
                tracing::debug!(%config_type, %name, "property filtered from export");
            }
            included
        });
    }
}
