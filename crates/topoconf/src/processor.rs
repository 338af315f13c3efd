//! configuration pipelines
//!
//! [ConfigurationProcessor] runs the registry against a [ClusterTopology] in one of three modes:
//! - [ConfigurationProcessor::required_host_groups]: read only, which host groups are referenced
//! - [ConfigurationProcessor::update_for_cluster_create]: symbolic values -> concrete hosts
//! - [ConfigurationProcessor::update_for_blueprint_export]: concrete hosts -> symbolic values
//!
//! Each mode visits the cluster scope (merged view) and the local scope of every host group.
use crate::configuration::{Properties, PropertyLookup};
use crate::export::{self, HostTokens, PasswordPropertyFilter, PropertyFilter};
use crate::ha;
use crate::registry::{UpdaterMap, UpdaterRegistry};
use crate::topology::ClusterTopology;
use crate::updater::{HostGroupNames, PropertyUpdater, UpdateError, UpdateProperty};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationTopologyError {
    #[error(
        "NAMENODE HA requires exactly 2 hosts running NAMENODE but there are: {} Hosts: {hosts:?}",
        .hosts.len()
    )]
    NameNodeHaHostCount { hosts: Vec<String> },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error(transparent)]
    Topology(#[from] ConfigurationTopologyError),
}

/// Services whose user needs proxy user settings in `core-site`: `(service, config type, property)`
const PROXY_USERS: [(&str, &str, &str); 5] = [
    ("OOZIE", "oozie-env", "oozie_user"),
    ("HIVE", "hive-env", "hive_user"),
    ("HIVE", "hive-env", "hcat_user"),
    ("HBASE", "hbase-env", "hbase_user"),
    ("FALCON", "falcon-env", "falcon_user"),
];

/// Where a computed value is written to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Cluster,
    HostGroup(String),
}

#[derive(Debug)]
struct PendingWrite {
    scope: Scope,
    config_type: String,
    name: String,
    value: String,
}

fn bindings(updaters: &UpdaterMap) -> impl Iterator<Item = (&str, &str, &PropertyUpdater)> {
    updaters.iter().flat_map(|(config_type, type_updaters)| {
        type_updaters
            .iter()
            .map(move |(name, updater)| (config_type.as_str(), name.as_str(), updater))
    })
}

/// Applies the updater registry to a cluster topology
#[derive(Debug)]
pub struct ConfigurationProcessor<'r> {
    registry: &'r UpdaterRegistry,
    filters: Vec<Box<dyn PropertyFilter>>,
}

impl<'r> ConfigurationProcessor<'r> {
    /// Processor with the default export filter (passwords)
    pub fn new(registry: &'r UpdaterRegistry) -> Self {
        Self::with_filters(registry, vec![Box::new(PasswordPropertyFilter)])
    }

    pub fn with_filters(registry: &'r UpdaterRegistry, filters: Vec<Box<dyn PropertyFilter>>) -> Self {
        Self { registry, filters }
    }

    /// Host groups referenced by the configuration of `topology`
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn required_host_groups(&self, topology: &ClusterTopology) -> Result<HostGroupNames, UpdateError> {
        let cluster_properties = topology.configuration().full_properties();
        let mut required = HostGroupNames::new();

        for updaters in self.registry.updaters_for(topology) {
            for (config_type, name, updater) in bindings(&updaters) {
                if let Some(value) = cluster_properties.lookup(config_type, name) {
                    required.extend(updater.required_host_groups(name, value, &cluster_properties, topology)?);
                }

                for group in topology.host_groups() {
                    let local = group.configuration.properties();
                    if let Some(value) = local.lookup(config_type, name) {
                        required.extend(updater.required_host_groups(name, value, local, topology)?);
                    }
                }
            }
        }

        tracing::debug!(?required, "required host groups");
        Ok(required)
    }

    /// Resolves all topology references of `topology`'s configuration
    ///
    /// Either every scope is updated or, on error, none is.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn update_for_cluster_create(&self, topology: &mut ClusterTopology) -> Result<(), ProcessorError> {
        let cluster_properties = topology.configuration().full_properties();
        let writes = self.pending_writes(topology, &cluster_properties)?;
        let initial_namenodes = initial_namenodes(topology, &cluster_properties)?;

        tracing::debug!(writes = writes.len(), "apply cluster create updates");
        for write in writes {
            match &write.scope {
                Scope::Cluster => topology
                    .configuration_mut()
                    .set_property(write.config_type, write.name, write.value),
                Scope::HostGroup(group) => {
                    if let Some(group) = topology.host_group_mut(group) {
                        group
                            .configuration
                            .set_property(write.config_type, write.name, write.value);
                    }
                }
            }
        }

        if let Some((active, standby)) = initial_namenodes {
            tracing::debug!(%active, %standby, "assign initial namenodes");
            let configuration = topology.configuration_mut();
            configuration.set_property(ha::HADOOP_ENV, ha::INITIAL_ACTIVE_NAMENODE, active);
            configuration.set_property(ha::HADOOP_ENV, ha::INITIAL_STANDBY_NAMENODE, standby);
        }

        set_missing_proxy_users(topology, &cluster_properties);
        Ok(())
    }

    fn pending_writes(
        &self,
        topology: &ClusterTopology,
        cluster_properties: &Properties,
    ) -> Result<Vec<PendingWrite>, UpdateError> {
        let mut writes = Vec::new();

        for updaters in self.registry.updaters_for(topology) {
            for (config_type, name, updater) in bindings(&updaters) {
                if let Some(value) = cluster_properties.lookup(config_type, name) {
                    let updated = updater.update_for_cluster_create(name, value, cluster_properties, topology)?;
                    tracing::trace!(%config_type, %name, %updated, "cluster property");
                    writes.push(PendingWrite {
                        scope: Scope::Cluster,
                        config_type: config_type.to_string(),
                        name: name.to_string(),
                        value: updated,
                    });
                }

                for group in topology.host_groups() {
                    let local = group.configuration.properties();
                    if let Some(value) = local.lookup(config_type, name) {
                        let updated = updater.update_for_cluster_create(name, value, local, topology)?;
                        tracing::trace!(group = %group.name, %config_type, %name, %updated, "host group property");
                        writes.push(PendingWrite {
                            scope: Scope::HostGroup(group.name.clone()),
                            config_type: config_type.to_string(),
                            name: name.to_string(),
                            value: updated,
                        });
                    }
                }
            }
        }

        Ok(writes)
    }

    /// Replaces concrete hosts of `topology`'s configuration with host group tokens
    ///
    /// The cluster scope is collapsed into a single layer first so that removed properties do
    /// not reappear from the stack defaults.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn update_for_blueprint_export(&self, topology: &mut ClusterTopology) {
        let hosts = HostTokens::new(topology);

        let configuration = topology.configuration();
        let mut ha_single_host = Vec::new();
        if topology.is_namenode_ha_enabled() {
            ha_single_host.push(ha::namenode_ha_updaters(configuration));
        }
        if topology.is_yarn_resourcemanager_ha_enabled() {
            ha_single_host.push(ha::resourcemanager_ha_updaters(configuration));
        }
        let ha_multi_host = topology
            .is_oozie_server_ha_enabled()
            .then(ha::oozie_server_ha_updaters);

        let configuration = topology.configuration_mut();
        configuration.collapse();
        let cluster_properties = configuration.properties_mut();

        // HA properties only ever live in the cluster scope
        for updaters in &ha_single_host {
            export::single_host_export(updaters, cluster_properties, &hosts);
        }
        if let Some(updaters) = &ha_multi_host {
            export::multi_host_export(updaters, cluster_properties, &hosts);
        }

        self.export_scope(cluster_properties, &hosts);
        for group in topology.host_groups_mut() {
            tracing::trace!(group = %group.name, "export host group scope");
            self.export_scope(group.configuration.properties_mut(), &hosts);
        }
    }

    fn export_scope(&self, properties: &mut Properties, hosts: &HostTokens) {
        export::single_host_export(self.registry.single_host(), properties, hosts);
        export::single_host_export(self.registry.database(), properties, hosts);
        export::multi_host_export(self.registry.multi_host(), properties, hosts);
        export::remove_on_export(self.registry.remove_on_export(), properties);
        export::apply_filters(&self.filters, properties);
    }
}

/// `(active, standby)` namenode hosts when NameNode HA needs them assigned
fn initial_namenodes(
    topology: &ClusterTopology,
    cluster_properties: &Properties,
) -> Result<Option<(String, String)>, ConfigurationTopologyError> {
    if !topology.is_namenode_ha_enabled()
        || ha::is_initial_active_namenode_set(cluster_properties)
        || ha::is_initial_standby_namenode_set(cluster_properties)
    {
        return Ok(None);
    }

    match topology.host_assignments_for_component("NAMENODE").as_slice() {
        [active, standby] => Ok(Some((active.to_string(), standby.to_string()))),
        hosts => Err(ConfigurationTopologyError::NameNodeHaHostCount {
            hosts: hosts.iter().map(|host| host.to_string()).collect(),
        }),
    }
}

/// Adds `hadoop.proxyuser.<user>.{hosts,groups}` for the users of deployed services
fn set_missing_proxy_users(topology: &mut ClusterTopology, cluster_properties: &Properties) {
    let users: Vec<&str> = PROXY_USERS
        .iter()
        .filter(|(service, _, _)| topology.blueprint().contains_service(service))
        .filter_map(|(_, config_type, property)| {
            let user = cluster_properties.lookup(config_type, property);
            if user.is_none() {
                tracing::debug!(%config_type, %property, "no user configured for deployed service");
            }
            user
        })
        .filter(|user| !user.is_empty())
        .collect();

    let configuration = topology.configuration_mut();
    for user in users {
        for (name, default) in [
            (format!("hadoop.proxyuser.{user}.hosts"), "*"),
            (format!("hadoop.proxyuser.{user}.groups"), "users"),
        ] {
            if !configuration.contains_property("core-site", &name) {
                tracing::trace!(%name, "add missing proxy user property");
                configuration.set_property("core-site", name, default);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::properties;
    use crate::topology::TopologyBuilder;
    use pretty_assertions::assert_eq;

    fn groups(names: &[&str]) -> HostGroupNames {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn simple() -> TopologyBuilder {
        ClusterTopology::builder()
            .service("HDFS")
            .service("ZOOKEEPER")
            .host_group("master", ["NAMENODE", "ZOOKEEPER_SERVER"], ["c6401.ambari.apache.org"])
            .host_group(
                "workers",
                ["DATANODE", "ZOOKEEPER_SERVER"],
                ["c6402.ambari.apache.org", "c6403.ambari.apache.org"],
            )
    }

    fn namenode_ha() -> TopologyBuilder {
        ClusterTopology::builder()
            .service("HDFS")
            .host_group("nn_1", ["NAMENODE"], ["c6401.ambari.apache.org"])
            .host_group("nn_2", ["NAMENODE"], ["c6402.ambari.apache.org"])
    }

    #[test]
    fn create_updates_cluster_and_host_group_scopes() {
        let registry = UpdaterRegistry::default();
        let mut topology = simple()
            .defaults(properties! {
                "hadoop-env" => { "namenode_heapsize" => "1024" }
            })
            .configuration(properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://localhost:8020" },
                "hbase-site" => { "hbase.zookeeper.quorum" => "%HOSTGROUP::master%:2181,%HOSTGROUP::workers%:2181" }
            })
            .host_group("clients", ["HDFS_CLIENT"], ["c6404.ambari.apache.org"])
            .host_group_configuration(properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://%HOSTGROUP::master%:8020" }
            })
            .build();

        ConfigurationProcessor::new(&registry)
            .update_for_cluster_create(&mut topology)
            .unwrap();

        let configuration = topology.configuration();
        assert_eq!(
            configuration.property("core-site", "fs.defaultFS"),
            Some("hdfs://c6401.ambari.apache.org:8020")
        );
        assert_eq!(
            configuration.property("hbase-site", "hbase.zookeeper.quorum"),
            Some("c6401.ambari.apache.org:2181,c6402.ambari.apache.org:2181,c6403.ambari.apache.org:2181")
        );
        // the default layer is untouched, the update lands in the cluster layer
        assert_eq!(configuration.property("hadoop-env", "namenode_heapsize"), Some("1024m"));
        assert_eq!(
            configuration.parent().unwrap().property("hadoop-env", "namenode_heapsize"),
            Some("1024")
        );

        let clients = topology.host_group("clients").unwrap();
        assert_eq!(
            clients.configuration.property("core-site", "fs.defaultFS"),
            Some("hdfs://c6401.ambari.apache.org:8020")
        );
        // nothing leaks into other host groups
        assert!(topology.host_group("master").unwrap().configuration.properties().is_empty());
    }

    #[test]
    fn create_shared_edits_keep_scheme_and_journal() {
        let registry = UpdaterRegistry::default();
        let mut topology = simple()
            .configuration(properties! {
                "hdfs-site" => { "dfs.namenode.shared.edits.dir" => "qjournal://%HOSTGROUP::journal%:8485/mycluster" }
            })
            .host_group("journal", ["JOURNALNODE"], ["c6404.ambari.apache.org", "c6405.ambari.apache.org"])
            .host_group_configuration(properties! {
                "hdfs-site" => { "dfs.namenode.shared.edits.dir" => "qjournal://localhost:8485;localhost:8485/mycluster" }
            })
            .build();

        ConfigurationProcessor::new(&registry)
            .update_for_cluster_create(&mut topology)
            .unwrap();

        let expected = "qjournal://c6404.ambari.apache.org:8485;c6405.ambari.apache.org:8485/mycluster";
        assert_eq!(
            topology.configuration().property("hdfs-site", "dfs.namenode.shared.edits.dir"),
            Some(expected)
        );
        assert_eq!(
            topology
                .host_group("journal")
                .unwrap()
                .configuration
                .property("hdfs-site", "dfs.namenode.shared.edits.dir"),
            Some(expected)
        );
    }

    #[test]
    fn failed_create_leaves_scopes_untouched() {
        let registry = UpdaterRegistry::default();
        let mut topology = simple()
            .cardinality("NIMBUS", "1")
            .configuration(properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://localhost:8020" },
                "storm-site" => { "nimbus.host" => "localhost" }
            })
            .build();
        let before = topology.configuration().clone();

        let error = ConfigurationProcessor::new(&registry)
            .update_for_cluster_create(&mut topology)
            .unwrap_err();

        assert_eq!(
            error,
            ProcessorError::Update(UpdateError::Mapping {
                property: "nimbus.host".to_string(),
                component: "NIMBUS".to_string(),
            })
        );
        assert_eq!(topology.configuration(), &before);
    }

    #[test]
    fn namenode_ha_assigns_initial_namenodes() {
        let registry = UpdaterRegistry::default();
        let mut topology = namenode_ha()
            .configuration(properties! {
                "hdfs-site" => {
                    "dfs.nameservices" => "mycluster",
                    "dfs.ha.namenodes.mycluster" => "nn1,nn2",
                    "dfs.namenode.http-address.mycluster.nn1" => "%HOSTGROUP::nn_1%:50070",
                    "dfs.namenode.http-address.mycluster.nn2" => "%HOSTGROUP::nn_2%:50070"
                },
                "core-site" => { "fs.defaultFS" => "hdfs://mycluster" }
            })
            .build();

        ConfigurationProcessor::new(&registry)
            .update_for_cluster_create(&mut topology)
            .unwrap();

        let configuration = topology.configuration();
        assert_eq!(
            configuration.property("hdfs-site", "dfs.namenode.http-address.mycluster.nn2"),
            Some("c6402.ambari.apache.org:50070")
        );
        assert_eq!(configuration.property("core-site", "fs.defaultFS"), Some("hdfs://mycluster"));
        assert_eq!(
            configuration.property("hadoop-env", "dfs_ha_initial_namenode_active"),
            Some("c6401.ambari.apache.org")
        );
        assert_eq!(
            configuration.property("hadoop-env", "dfs_ha_initial_namenode_standby"),
            Some("c6402.ambari.apache.org")
        );
    }

    #[test]
    fn namenode_ha_keeps_configured_initial_namenodes() {
        let registry = UpdaterRegistry::default();
        let mut topology = namenode_ha()
            .configuration(properties! {
                "hdfs-site" => { "dfs.nameservices" => "mycluster" },
                "hadoop-env" => { "dfs_ha_initial_namenode_active" => "c6402.ambari.apache.org" }
            })
            .build();

        ConfigurationProcessor::new(&registry)
            .update_for_cluster_create(&mut topology)
            .unwrap();

        let configuration = topology.configuration();
        assert_eq!(
            configuration.property("hadoop-env", "dfs_ha_initial_namenode_active"),
            Some("c6402.ambari.apache.org")
        );
        assert_eq!(configuration.property("hadoop-env", "dfs_ha_initial_namenode_standby"), None);
    }

    #[test]
    fn namenode_ha_requires_two_hosts() {
        let registry = UpdaterRegistry::default();
        let mut topology = ClusterTopology::builder()
            .host_group("nn", ["NAMENODE"], ["h1", "h2", "h3"])
            .configuration(properties! {
                "hdfs-site" => { "dfs.nameservices" => "mycluster" },
                "core-site" => { "fs.defaultFS" => "hdfs://localhost:8020" }
            })
            .build();
        let before = topology.configuration().clone();

        let error = ConfigurationProcessor::new(&registry)
            .update_for_cluster_create(&mut topology)
            .unwrap_err();

        assert_eq!(
            error,
            ProcessorError::Topology(ConfigurationTopologyError::NameNodeHaHostCount {
                hosts: vec!["h1".to_string(), "h2".to_string(), "h3".to_string()]
            })
        );
        assert!(error.to_string().contains("there are: 3"));
        assert_eq!(topology.configuration(), &before);
    }

    #[test]
    fn missing_proxy_users_are_added() {
        let registry = UpdaterRegistry::default();
        let mut topology = ClusterTopology::builder()
            .service("OOZIE")
            .service("HIVE")
            .configuration(properties! {
                "oozie-env" => { "oozie_user" => "oozie" },
                "hive-env" => { "hive_user" => "hive", "hcat_user" => "" },
                "hbase-env" => { "hbase_user" => "hbase" },
                "core-site" => { "hadoop.proxyuser.hive.groups" => "hadoop" }
            })
            .build();

        ConfigurationProcessor::new(&registry)
            .update_for_cluster_create(&mut topology)
            .unwrap();

        let expected = properties! {
            "core-site" => {
                "hadoop.proxyuser.hive.groups" => "hadoop",
                "hadoop.proxyuser.oozie.hosts" => "*",
                "hadoop.proxyuser.oozie.groups" => "users",
                "hadoop.proxyuser.hive.hosts" => "*"
            }
        };
        assert_eq!(topology.configuration().properties()["core-site"], expected["core-site"]);
    }

    #[test]
    fn required_groups_from_all_scopes() {
        let registry = UpdaterRegistry::default();
        let topology = simple()
            .configuration(properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://%HOSTGROUP::master%:8020" },
                "hive-site" => { "hive.metastore.uris" => "thrift://meta.example.com:9083" }
            })
            .host_group("edge", ["CLIENT"], ["c6405.ambari.apache.org"])
            .host_group_configuration(properties! {
                "hbase-site" => { "hbase.zookeeper.quorum" => "%HOSTGROUP::workers%:2181" }
            })
            .build();

        let required = ConfigurationProcessor::new(&registry)
            .required_host_groups(&topology)
            .unwrap();

        assert_eq!(required, groups(&["master", "workers"]));
    }

    #[test]
    fn required_groups_do_not_mutate() {
        let registry = UpdaterRegistry::default();
        let topology = simple()
            .configuration(properties! {
                "hbase-site" => { "hbase.zookeeper.quorum" => "localhost:2181" }
            })
            .build();
        let before = topology.configuration().clone();

        let required = ConfigurationProcessor::new(&registry)
            .required_host_groups(&topology)
            .unwrap();

        assert_eq!(required, groups(&["master", "workers"]));
        assert_eq!(topology.configuration(), &before);
    }

    #[test]
    fn required_groups_unknown_token() {
        let registry = UpdaterRegistry::default();
        let topology = simple()
            .configuration(properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://%HOSTGROUP::missing%:8020" }
            })
            .build();

        assert_eq!(
            ConfigurationProcessor::new(&registry).required_host_groups(&topology),
            Err(UpdateError::UnknownHostGroup {
                group: "missing".to_string()
            })
        );
    }

    #[test]
    fn export_tokenizes_and_cleans() {
        let registry = UpdaterRegistry::default();
        let mut topology = simple()
            .defaults(properties! {
                "hdfs-site" => { "dfs.namenode.https-address" => "old.example.com:50470" }
            })
            .configuration(properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://c6401.ambari.apache.org:8020" },
                "hdfs-site" => { "dfs.namenode.http-address" => "0.0.0.0:50070" },
                "hbase-site" => { "hbase.zookeeper.quorum" => "c6402.ambari.apache.org,c6403.ambari.apache.org" },
                "oozie-site" => { "oozie.service.JPAService.jdbc.url" => "jdbc:mysql://db.example.com/oozie" },
                "ranger-env" => { "ranger_admin_password" => "secret" }
            })
            .build();

        ConfigurationProcessor::new(&registry).update_for_blueprint_export(&mut topology);

        let configuration = topology.configuration();
        assert!(configuration.parent().is_none());
        assert_eq!(
            configuration.properties(),
            &properties! {
                "hdfs-site" => { "dfs.namenode.http-address" => "0.0.0.0:50070" },
                "core-site" => { "fs.defaultFS" => "hdfs://%HOSTGROUP::master%:8020" },
                "hbase-site" => { "hbase.zookeeper.quorum" => "%HOSTGROUP::workers%" },
                "oozie-site" => {},
                "ranger-env" => {}
            }
        );
    }

    #[test]
    fn export_ha_properties() {
        let registry = UpdaterRegistry::default();
        let mut topology = ClusterTopology::builder()
            .host_group("master_1", ["NAMENODE", "RESOURCEMANAGER", "OOZIE_SERVER"], ["c6401.ambari.apache.org"])
            .host_group("master_2", ["NAMENODE", "RESOURCEMANAGER", "ZOOKEEPER_SERVER"], ["c6402.ambari.apache.org"])
            .configuration(properties! {
                "hdfs-site" => {
                    "dfs.nameservices" => "mycluster",
                    "dfs.ha.namenodes.mycluster" => "nn1,nn2",
                    "dfs.namenode.rpc-address.mycluster.nn1" => "c6401.ambari.apache.org:8020",
                    "dfs.namenode.rpc-address.mycluster.nn2" => "c6402.ambari.apache.org:8020"
                },
                "yarn-site" => {
                    "yarn.resourcemanager.ha.enabled" => "true",
                    "yarn.resourcemanager.ha.rm-ids" => "rm1,rm2",
                    "yarn.resourcemanager.hostname.rm1" => "c6401.ambari.apache.org",
                    "yarn.resourcemanager.hostname.rm2" => "c6402.ambari.apache.org"
                },
                "oozie-site" => {
                    "oozie.services.ext" => "org.apache.oozie.service.ZKLocksService",
                    "oozie.zookeeper.connection.string" => "c6402.ambari.apache.org:2181"
                }
            })
            .build();

        ConfigurationProcessor::new(&registry).update_for_blueprint_export(&mut topology);

        let configuration = topology.configuration();
        assert_eq!(
            configuration.property("hdfs-site", "dfs.namenode.rpc-address.mycluster.nn2"),
            Some("%HOSTGROUP::master_2%:8020")
        );
        assert_eq!(
            configuration.property("yarn-site", "yarn.resourcemanager.hostname.rm1"),
            Some("%HOSTGROUP::master_1%")
        );
        assert_eq!(
            configuration.property("oozie-site", "oozie.zookeeper.connection.string"),
            Some("%HOSTGROUP::master_2%:2181")
        );
    }

    #[test]
    fn export_host_group_scope() {
        let registry = UpdaterRegistry::default();
        let mut topology = simple()
            .host_group("edge", ["CLIENT"], ["c6404.ambari.apache.org"])
            .host_group_configuration(properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://c6401.ambari.apache.org:8020" },
                "hdfs-site" => { "dfs.namenode.http-address" => "external.example.com:50070" }
            })
            .build();

        ConfigurationProcessor::new(&registry).update_for_blueprint_export(&mut topology);

        assert_eq!(
            topology.host_group("edge").unwrap().configuration.properties(),
            &properties! {
                "core-site" => { "fs.defaultFS" => "hdfs://%HOSTGROUP::master%:8020" },
                "hdfs-site" => {}
            }
        );
    }

    #[test]
    fn required_groups_under_resourcemanager_ha() {
        let registry = UpdaterRegistry::default();
        let topology = ClusterTopology::builder()
            .host_group("master_1", ["RESOURCEMANAGER"], ["c6401.ambari.apache.org"])
            .host_group("master_2", ["RESOURCEMANAGER"], ["c6402.ambari.apache.org"])
            .configuration(properties! {
                "yarn-site" => {
                    "yarn.resourcemanager.ha.enabled" => "true",
                    "yarn.resourcemanager.ha.rm-ids" => "rm1,rm2",
                    "yarn.resourcemanager.hostname.rm1" => "%HOSTGROUP::master_1%",
                    "yarn.resourcemanager.hostname.rm2" => "c6402.ambari.apache.org"
                }
            })
            .build();
        let processor = ConfigurationProcessor::new(&registry);

        assert_eq!(processor.required_host_groups(&topology), Ok(groups(&["master_1"])));

        let localhost = ClusterTopology::builder()
            .host_group("master_1", ["RESOURCEMANAGER"], ["c6401.ambari.apache.org"])
            .host_group("master_2", ["RESOURCEMANAGER"], ["c6402.ambari.apache.org"])
            .configuration(properties! {
                "yarn-site" => {
                    "yarn.resourcemanager.ha.enabled" => "true",
                    "yarn.resourcemanager.ha.rm-ids" => "rm1,rm2",
                    "yarn.resourcemanager.hostname.rm1" => "localhost"
                }
            })
            .build();

        assert_eq!(
            processor.required_host_groups(&localhost),
            Err(UpdateError::Mapping {
                property: "yarn.resourcemanager.hostname.rm1".to_string(),
                component: "RESOURCEMANAGER".to_string(),
            })
        );
    }

    #[test]
    fn export_leaves_host_group_ha_properties() {
        let registry = UpdaterRegistry::default();
        let mut topology = ClusterTopology::builder()
            .host_group("master_1", ["NAMENODE"], ["c6401.ambari.apache.org"])
            .host_group("master_2", ["NAMENODE"], ["c6402.ambari.apache.org"])
            .host_group_configuration(properties! {
                "hdfs-site" => { "dfs.namenode.rpc-address.mycluster.nn1" => "c6401.ambari.apache.org:8020" }
            })
            .configuration(properties! {
                "hdfs-site" => {
                    "dfs.nameservices" => "mycluster",
                    "dfs.ha.namenodes.mycluster" => "nn1,nn2",
                    "dfs.namenode.rpc-address.mycluster.nn1" => "c6401.ambari.apache.org:8020"
                }
            })
            .build();

        ConfigurationProcessor::new(&registry).update_for_blueprint_export(&mut topology);

        assert_eq!(
            topology.configuration().property("hdfs-site", "dfs.namenode.rpc-address.mycluster.nn1"),
            Some("%HOSTGROUP::master_1%:8020")
        );
        // HA rules are only applied to the cluster scope
        assert_eq!(
            topology.host_group("master_2").unwrap().configuration.properties(),
            &properties! {
                "hdfs-site" => { "dfs.namenode.rpc-address.mycluster.nn1" => "c6401.ambari.apache.org:8020" }
            }
        );
    }
}
