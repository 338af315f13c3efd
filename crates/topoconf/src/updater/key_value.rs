//! key value list updater
//!
//! `key1=value1,key2=value2` where a value may itself be a comma separated list. Commas
//! inside values are escaped as `\,`.
use super::{HostGroupNames, PropertyUpdater, UpdateError, UpdateProperty};
use crate::configuration::Properties;
use crate::token;
use crate::topology::ClusterTopology;
use indexmap::IndexMap;

const ESCAPED_COMMA: &str = "\\,";

/// Delegates the values of registered keys to their own updater
#[derive(Debug, Clone, Default)]
pub struct KeyValueListUpdater {
    updaters: IndexMap<String, PropertyUpdater>,
}

impl KeyValueListUpdater {
    /// `webhcat-site/templeton.hive.properties`
    pub fn templeton_hive_properties() -> Self {
        Self::default().with_key(
            "hive.metastore.uris",
            PropertyUpdater::multi_host_with("HIVE_METASTORE", ',', true),
        )
    }

    pub fn with_key(mut self, key: impl Into<String>, updater: PropertyUpdater) -> Self {
        self.updaters.insert(key.into(), updater);
        self
    }

    /// Rewrites the values of registered keys, other pairs are kept verbatim
    ///
    /// `rewrite` gets the unescaped value, commas in its result are escaped again.
    pub fn rewrite_values(
        &self,
        value: &str,
        mut rewrite: impl FnMut(&PropertyUpdater, &str) -> String,
    ) -> String {
        split_unescaped(value)
            .into_iter()
            .map(|pair| {
                let registered = pair
                    .split_once('=')
                    .and_then(|(key, sub_value)| Some((key, self.updaters.get(key)?, sub_value)));
                match registered {
                    Some((key, updater, sub_value)) => {
                        let rewritten = rewrite(updater, &sub_value.replace(ESCAPED_COMMA, ","));
                        format!("{key}={}", rewritten.replace(',', ESCAPED_COMMA))
                    }
                    None => pair.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Pairs whose key has an updater, with the value unescaped
    fn registered_pairs<'a>(
        &'a self,
        value: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a PropertyUpdater, String)> + 'a {
        split_unescaped(value).into_iter().filter_map(|pair| {
            let (key, sub_value) = pair.split_once('=')?;
            let updater = self.updaters.get(key)?;
            Some((key, updater, sub_value.replace(ESCAPED_COMMA, ",")))
        })
    }
}

/// Splits on commas not preceded by a backslash
fn split_unescaped(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (index, c) in value.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            ',' if !escaped => {
                parts.push(&value[start..index]);
                start = index + 1;
            }
            _ => escaped = false,
        }
    }
    parts.push(&value[start..]);
    parts
}

impl UpdateProperty for KeyValueListUpdater {
    fn update_for_cluster_create(
        &self,
        _name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<String, UpdateError> {
        if token::is_deployer_supplied(value) {
            return Ok(value.to_string());
        }

        let mut pairs = Vec::new();
        for pair in split_unescaped(value) {
            let registered = pair
                .split_once('=')
                .and_then(|(key, sub_value)| Some((key, self.updaters.get(key)?, sub_value)));

            let Some((key, updater, sub_value)) = registered else {
                pairs.push(pair.to_string());
                continue;
            };

            let sub_value = sub_value.replace(ESCAPED_COMMA, ",");
            let updated = updater.update_for_cluster_create(key, &sub_value, properties, topology)?;
            pairs.push(format!("{key}={}", updated.replace(',', ESCAPED_COMMA)));
        }

        Ok(pairs.join(","))
    }

    fn required_host_groups(
        &self,
        _name: &str,
        value: &str,
        properties: &Properties,
        topology: &ClusterTopology,
    ) -> Result<HostGroupNames, UpdateError> {
        if token::is_deployer_supplied(value) {
            return Ok(HostGroupNames::new());
        }

        let mut groups = HostGroupNames::new();
        for (key, updater, sub_value) in self.registered_pairs(value) {
            groups.extend(updater.required_host_groups(key, &sub_value, properties, topology)?);
        }
        Ok(groups)
    }
}
