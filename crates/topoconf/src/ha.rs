//! high availability detection and HA rule maps
//!
//! HA deployments name their properties after identifiers that only exist in the cluster's own
//! configuration (nameservices, namenode ids, resourcemanager ids). The matching updaters are
//! therefore derived per invocation and must never be cached across clusters.
use crate::configuration::PropertyLookup;
use crate::registry::UpdaterMap;
use crate::updater::PropertyUpdater;

pub const HDFS_SITE: &str = "hdfs-site";
pub const YARN_SITE: &str = "yarn-site";
pub const OOZIE_SITE: &str = "oozie-site";
pub const HIVE_SITE: &str = "hive-site";
pub const HADOOP_ENV: &str = "hadoop-env";

pub const NAMESERVICES: &str = "dfs.nameservices";
pub const RESOURCEMANAGER_HA_ENABLED: &str = "yarn.resourcemanager.ha.enabled";
pub const RESOURCEMANAGER_IDS: &str = "yarn.resourcemanager.ha.rm-ids";
pub const OOZIE_SERVICES_EXT: &str = "oozie.services.ext";
pub const OOZIE_ZK_LOCKS_SERVICE: &str = "org.apache.oozie.service.ZKLocksService";
pub const HIVE_DYNAMIC_SERVICE_DISCOVERY: &str = "hive.server2.support.dynamic.service.discovery";
pub const INITIAL_ACTIVE_NAMENODE: &str = "dfs_ha_initial_namenode_active";
pub const INITIAL_STANDBY_NAMENODE: &str = "dfs_ha_initial_namenode_standby";

pub fn is_namenode_ha_enabled(properties: &impl PropertyLookup) -> bool {
    properties.contains(HDFS_SITE, NAMESERVICES)
}

pub fn is_yarn_resourcemanager_ha_enabled(properties: &impl PropertyLookup) -> bool {
    properties.lookup(YARN_SITE, RESOURCEMANAGER_HA_ENABLED) == Some("true")
}

pub fn is_oozie_server_ha_enabled(properties: &impl PropertyLookup) -> bool {
    properties
        .lookup(OOZIE_SITE, OOZIE_SERVICES_EXT)
        .is_some_and(|services| services.contains(OOZIE_ZK_LOCKS_SERVICE))
}

pub fn is_hive_server_ha_enabled(properties: &impl PropertyLookup) -> bool {
    properties.lookup(HIVE_SITE, HIVE_DYNAMIC_SERVICE_DISCOVERY) == Some("true")
}

pub fn is_initial_active_namenode_set(properties: &impl PropertyLookup) -> bool {
    properties.contains(HADOOP_ENV, INITIAL_ACTIVE_NAMENODE)
}

pub fn is_initial_standby_namenode_set(properties: &impl PropertyLookup) -> bool {
    properties.contains(HADOOP_ENV, INITIAL_STANDBY_NAMENODE)
}

pub fn parse_name_services(properties: &impl PropertyLookup) -> Vec<&str> {
    split_and_trim(properties.lookup(HDFS_SITE, NAMESERVICES))
}

pub fn parse_name_nodes<'a>(name_service: &str, properties: &'a impl PropertyLookup) -> Vec<&'a str> {
    split_and_trim(properties.lookup(HDFS_SITE, &format!("dfs.ha.namenodes.{name_service}")))
}

pub fn parse_resource_managers(properties: &impl PropertyLookup) -> Vec<&str> {
    split_and_trim(properties.lookup(YARN_SITE, RESOURCEMANAGER_IDS))
}

fn split_and_trim(value: Option<&str>) -> Vec<&str> {
    value
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|element| !element.is_empty())
        .collect()
}

/// `hdfs-site` address updaters for every namenode of every nameservice
#[tracing::instrument(level = "trace", skip_all)]
pub fn namenode_ha_updaters(properties: &impl PropertyLookup) -> UpdaterMap {
    let mut updaters = UpdaterMap::default();
    let hdfs_site = updaters.entry(HDFS_SITE.to_string()).or_default();

    for name_service in parse_name_services(properties) {
        for name_node in parse_name_nodes(name_service, properties) {
            for address in ["https-address", "http-address", "rpc-address"] {
                let name = format!("dfs.namenode.{address}.{name_service}.{name_node}");
                tracing::trace!(%name, "register namenode HA updater");
                hdfs_site.insert(name, PropertyUpdater::single_host("NAMENODE"));
            }
        }
    }

    updaters
}

/// `yarn-site` updaters for every resourcemanager id
#[tracing::instrument(level = "trace", skip_all)]
pub fn resourcemanager_ha_updaters(properties: &impl PropertyLookup) -> UpdaterMap {
    let mut updaters = UpdaterMap::default();
    let yarn_site = updaters.entry(YARN_SITE.to_string()).or_default();

    for resource_manager in parse_resource_managers(properties) {
        for prefix in [
            "yarn.resourcemanager.hostname",
            "yarn.resourcemanager.webapp.address",
            "yarn.resourcemanager.webapp.https.address",
        ] {
            let name = format!("{prefix}.{resource_manager}");
            tracing::trace!(%name, "register resourcemanager HA updater");
            yarn_site.insert(name, PropertyUpdater::single_host("RESOURCEMANAGER"));
        }
    }

    updaters
}

/// `oozie-site` updaters only meaningful in an Oozie HA deployment
pub fn oozie_server_ha_updaters() -> UpdaterMap {
    let mut updaters = UpdaterMap::default();
    updaters.entry(OOZIE_SITE.to_string()).or_default().insert(
        "oozie.zookeeper.connection.string".to_string(),
        PropertyUpdater::multi_host("ZOOKEEPER_SERVER"),
    );
    updaters
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::properties;
    use pretty_assertions::assert_eq;

    #[test]
    fn detection() {
        let properties = properties! {
            "hdfs-site" => { "dfs.nameservices" => "mycluster" },
            "yarn-site" => { "yarn.resourcemanager.ha.enabled" => "true" },
            "oozie-site" => { "oozie.services.ext" => "org.apache.oozie.service.ZKLocksService,org.apache.oozie.service.ZKXLogStreamingService" },
            "hive-site" => { "hive.server2.support.dynamic.service.discovery" => "true" }
        };

        assert!(is_namenode_ha_enabled(&properties));
        assert!(is_yarn_resourcemanager_ha_enabled(&properties));
        assert!(is_oozie_server_ha_enabled(&properties));
        assert!(is_hive_server_ha_enabled(&properties));

        let disabled = properties! {
            "yarn-site" => { "yarn.resourcemanager.ha.enabled" => "false" },
            "hive-site" => { "hive.server2.support.dynamic.service.discovery" => "false" }
        };
        assert!(!is_namenode_ha_enabled(&disabled));
        assert!(!is_yarn_resourcemanager_ha_enabled(&disabled));
        assert!(!is_oozie_server_ha_enabled(&disabled));
        assert!(!is_hive_server_ha_enabled(&disabled));
    }

    #[test]
    fn parse_ids_trims_whitespace() {
        let properties = properties! {
            "hdfs-site" => {
                "dfs.nameservices" => "ns1, ns2",
                "dfs.ha.namenodes.ns1" => " nn1 ,nn2"
            },
            "yarn-site" => { "yarn.resourcemanager.ha.rm-ids" => "rm1,rm2," }
        };

        assert_eq!(parse_name_services(&properties), ["ns1", "ns2"]);
        assert_eq!(parse_name_nodes("ns1", &properties), ["nn1", "nn2"]);
        assert!(parse_name_nodes("ns2", &properties).is_empty());
        assert_eq!(parse_resource_managers(&properties), ["rm1", "rm2"]);
    }

    #[test]
    fn namenode_updater_names() {
        let properties = properties! {
            "hdfs-site" => {
                "dfs.nameservices" => "mycluster",
                "dfs.ha.namenodes.mycluster" => "nn1,nn2"
            }
        };

        let updaters = namenode_ha_updaters(&properties);
        let names: Vec<_> = updaters[HDFS_SITE].keys().map(String::as_str).collect();

        assert_eq!(
            names,
            [
                "dfs.namenode.https-address.mycluster.nn1",
                "dfs.namenode.http-address.mycluster.nn1",
                "dfs.namenode.rpc-address.mycluster.nn1",
                "dfs.namenode.https-address.mycluster.nn2",
                "dfs.namenode.http-address.mycluster.nn2",
                "dfs.namenode.rpc-address.mycluster.nn2",
            ]
        );
    }

    #[test]
    fn resourcemanager_updater_names() {
        let properties = properties! {
            "yarn-site" => { "yarn.resourcemanager.ha.rm-ids" => "rm1,rm2" }
        };

        let updaters = resourcemanager_ha_updaters(&properties);

        assert_eq!(updaters[YARN_SITE].len(), 6);
        assert!(updaters[YARN_SITE].contains_key("yarn.resourcemanager.hostname.rm2"));
        assert!(updaters[YARN_SITE].contains_key("yarn.resourcemanager.webapp.https.address.rm1"));
    }

    #[test]
    fn no_nameservices_means_empty_map() {
        let updaters = namenode_ha_updaters(&properties! {});
        assert!(updaters[HDFS_SITE].is_empty());
    }
}
