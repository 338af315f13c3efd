//! updater registry
//!
//! Binds `(config type, property name)` to the [PropertyUpdater] rewriting it. The static
//! catalog is split into rule classes because create and export treat the classes
//! differently:
//!
//! | class            | create               | export                              |
//! |------------------|----------------------|-------------------------------------|
//! | single host      | resolve one host     | host -> token, remove if unmatched  |
//! | multi host       | expand all hosts     | hosts -> tokens, deduplicated       |
//! | database         | single host, managed | like single host                    |
//! | unit suffix      | append unit          | untouched                           |
//! | remove on export | untouched            | always removed                      |
//!
//! HA bindings are not part of the registry, their property names depend on the cluster.
//! See [UpdaterRegistry::updaters_for].
use crate::ha;
use crate::topology::ClusterTopology;
use crate::updater::{FlowStyle, PropertyUpdater};
use indexmap::IndexMap;
use std::borrow::Cow;

/// `config type -> property name -> updater`
pub type UpdaterMap = IndexMap<String, IndexMap<String, PropertyUpdater>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleClass {
    SingleHost,
    MultiHost,
    Database,
    UnitSuffix,
    RemoveOnExport,
}

/// The static updater catalog
///
/// Built once and shared by reference. [Default] holds the complete catalog, [UpdaterRegistry::new]
/// starts empty.
#[derive(Debug, Clone)]
pub struct UpdaterRegistry {
    single_host: UpdaterMap,
    multi_host: UpdaterMap,
    database: UpdaterMap,
    unit_suffix: UpdaterMap,
    remove_on_export: UpdaterMap,
}

impl UpdaterRegistry {
    pub fn new() -> Self {
        Self {
            single_host: UpdaterMap::default(),
            multi_host: UpdaterMap::default(),
            database: UpdaterMap::default(),
            unit_suffix: UpdaterMap::default(),
            remove_on_export: UpdaterMap::default(),
        }
    }

    pub fn register(
        &mut self,
        class: RuleClass,
        config_type: impl Into<String>,
        name: impl Into<String>,
        updater: PropertyUpdater,
    ) -> &mut Self {
        let map = match class {
            RuleClass::SingleHost => &mut self.single_host,
            RuleClass::MultiHost => &mut self.multi_host,
            RuleClass::Database => &mut self.database,
            RuleClass::UnitSuffix => &mut self.unit_suffix,
            RuleClass::RemoveOnExport => &mut self.remove_on_export,
        };
        map.entry(config_type.into())
            .or_default()
            .insert(name.into(), updater);
        self
    }

    pub fn single_host(&self) -> &UpdaterMap {
        &self.single_host
    }

    pub fn multi_host(&self) -> &UpdaterMap {
        &self.multi_host
    }

    pub fn database(&self) -> &UpdaterMap {
        &self.database
    }

    pub fn unit_suffix(&self) -> &UpdaterMap {
        &self.unit_suffix
    }

    pub fn remove_on_export(&self) -> &UpdaterMap {
        &self.remove_on_export
    }

    /// Every map applied when creating `topology`, in evaluation order
    ///
    /// The static maps are borrowed, the HA maps are derived from the cluster configuration.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn updaters_for(&self, topology: &ClusterTopology) -> Vec<Cow<'_, UpdaterMap>> {
        let mut updaters = vec![
            Cow::Borrowed(&self.single_host),
            Cow::Borrowed(&self.multi_host),
            Cow::Borrowed(&self.database),
            Cow::Borrowed(&self.unit_suffix),
        ];

        let configuration = topology.configuration();
        if topology.is_namenode_ha_enabled() {
            tracing::debug!("namenode HA enabled");
            updaters.push(Cow::Owned(ha::namenode_ha_updaters(configuration)));
        }
        if topology.is_yarn_resourcemanager_ha_enabled() {
            tracing::debug!("resourcemanager HA enabled");
            updaters.push(Cow::Owned(ha::resourcemanager_ha_updaters(configuration)));
        }
        if topology.is_oozie_server_ha_enabled() {
            tracing::debug!("oozie server HA enabled");
            updaters.push(Cow::Owned(ha::oozie_server_ha_updaters()));
        }

        updaters
    }

    fn register_all<'a>(
        &mut self,
        class: RuleClass,
        bindings: impl IntoIterator<Item = (&'a str, &'a str, PropertyUpdater)>,
    ) {
        for (config_type, name, updater) in bindings {
            self.register(class, config_type, name, updater);
        }
    }
}

/// `(config type, property, component)`
const SINGLE_HOST_BINDINGS: &[(&str, &str, &str)] = &[
    ("hdfs-site", "dfs.http.address", "NAMENODE"),
    ("hdfs-site", "dfs.https.address", "NAMENODE"),
    ("hdfs-site", "dfs.namenode.http-address", "NAMENODE"),
    ("hdfs-site", "dfs.namenode.https-address", "NAMENODE"),
    ("hdfs-site", "dfs.namenode.rpc-address", "NAMENODE"),
    ("hdfs-site", "dfs.secondary.http.address", "SECONDARY_NAMENODE"),
    ("hdfs-site", "dfs.namenode.secondary.http-address", "SECONDARY_NAMENODE"),
    ("core-site", "fs.default.name", "NAMENODE"),
    ("core-site", "fs.defaultFS", "NAMENODE"),
    ("hbase-site", "hbase.rootdir", "NAMENODE"),
    ("accumulo-site", "instance.volumes", "NAMENODE"),
    ("mapred-site", "mapred.job.tracker", "JOBTRACKER"),
    ("mapred-site", "mapred.job.tracker.http.address", "JOBTRACKER"),
    ("mapred-site", "mapreduce.history.server.http.address", "JOBTRACKER"),
    ("mapred-site", "mapreduce.jobhistory.webapp.address", "HISTORYSERVER"),
    ("mapred-site", "mapreduce.jobhistory.address", "HISTORYSERVER"),
    ("yarn-site", "yarn.log.server.url", "HISTORYSERVER"),
    ("yarn-site", "yarn.resourcemanager.hostname", "RESOURCEMANAGER"),
    ("yarn-site", "yarn.resourcemanager.resource-tracker.address", "RESOURCEMANAGER"),
    ("yarn-site", "yarn.resourcemanager.webapp.address", "RESOURCEMANAGER"),
    ("yarn-site", "yarn.resourcemanager.scheduler.address", "RESOURCEMANAGER"),
    ("yarn-site", "yarn.resourcemanager.address", "RESOURCEMANAGER"),
    ("yarn-site", "yarn.resourcemanager.admin.address", "RESOURCEMANAGER"),
    ("yarn-site", "yarn.resourcemanager.webapp.https.address", "RESOURCEMANAGER"),
    ("yarn-site", "yarn.timeline-service.address", "APP_TIMELINE_SERVER"),
    ("yarn-site", "yarn.timeline-service.webapp.address", "APP_TIMELINE_SERVER"),
    ("yarn-site", "yarn.timeline-service.webapp.https.address", "APP_TIMELINE_SERVER"),
    ("hive-env", "hive_hostname", "HIVE_SERVER"),
    ("oozie-site", "oozie.base.url", "OOZIE_SERVER"),
    ("oozie-site", "oozie.authentication.kerberos.principal", "OOZIE_SERVER"),
    ("oozie-site", "oozie.service.HadoopAccessorService.kerberos.principal", "OOZIE_SERVER"),
    ("oozie-env", "oozie_hostname", "OOZIE_SERVER"),
    ("storm-site", "nimbus.host", "NIMBUS"),
    ("falcon-startup.properties", "*.broker.url", "FALCON_SERVER"),
    ("falcon-startup.properties", "*.falcon.service.authentication.kerberos.principal", "FALCON_SERVER"),
    ("falcon-startup.properties", "*.falcon.http.authentication.kerberos.principal", "FALCON_SERVER"),
];

/// Ganglia is optional, its hosts are only substituted when deployed
const OPTIONAL_SINGLE_HOST_BINDINGS: &[(&str, &str, &str)] = &[
    ("storm-site", "worker.childopts", "GANGLIA_SERVER"),
    ("storm-site", "supervisor.childopts", "GANGLIA_SERVER"),
    ("storm-site", "nimbus.childopts", "GANGLIA_SERVER"),
    ("kafka-broker", "kafka.ganglia.metrics.host", "GANGLIA_SERVER"),
];

/// `(config type, property, component)`, comma separated
const MULTI_HOST_BINDINGS: &[(&str, &str, &str)] = &[
    ("hive-site", "hive.zookeeper.quorum", "ZOOKEEPER_SERVER"),
    ("hive-site", "hive.cluster.delegation.token.store.zookeeper.connectString", "ZOOKEEPER_SERVER"),
    ("core-site", "hadoop.proxyuser.hive.hosts", "HIVE_SERVER"),
    ("core-site", "hadoop.proxyuser.HTTP.hosts", "WEBHCAT_SERVER"),
    ("core-site", "hadoop.proxyuser.hcat.hosts", "WEBHCAT_SERVER"),
    ("core-site", "hadoop.proxyuser.oozie.hosts", "OOZIE_SERVER"),
    ("core-site", "hadoop.proxyuser.knox.hosts", "KNOX_GATEWAY"),
    ("core-site", "ha.zookeeper.quorum", "ZOOKEEPER_SERVER"),
    ("webhcat-site", "templeton.kerberos.principal", "WEBHCAT_SERVER"),
    ("webhcat-site", "templeton.zookeeper.hosts", "ZOOKEEPER_SERVER"),
    ("webhcat-site", "webhcat.proxyuser.knox.hosts", "KNOX_GATEWAY"),
    ("hbase-site", "hbase.zookeeper.quorum", "ZOOKEEPER_SERVER"),
    ("yarn-site", "hadoop.registry.zk.quorum", "ZOOKEEPER_SERVER"),
    ("yarn-site", "yarn.resourcemanager.zk-address", "ZOOKEEPER_SERVER"),
    ("slider-client", "slider.zookeeper.quorum", "ZOOKEEPER_SERVER"),
    ("kafka-broker", "zookeeper.connect", "ZOOKEEPER_SERVER"),
    ("accumulo-site", "instance.zookeeper.host", "ZOOKEEPER_SERVER"),
    ("oozie-site", "hadoop.proxyuser.knox.hosts", "KNOX_GATEWAY"),
    ("oozie-site", "oozie.service.ProxyUserService.proxyuser.knox.hosts", "KNOX_GATEWAY"),
];

/// Heap sizes in megabytes
const UNIT_SUFFIX_BINDINGS: &[(&str, &str)] = &[
    ("hadoop-env", "namenode_heapsize"),
    ("hadoop-env", "namenode_opt_newsize"),
    ("hadoop-env", "namenode_opt_maxnewsize"),
    ("hadoop-env", "namenode_opt_permsize"),
    ("hadoop-env", "namenode_opt_maxpermsize"),
    ("hadoop-env", "dtnode_heapsize"),
    ("mapred-env", "jtnode_opt_newsize"),
    ("mapred-env", "jtnode_opt_maxnewsize"),
    ("mapred-env", "jtnode_heapsize"),
    ("hbase-env", "hbase_master_heapsize"),
    ("hbase-env", "hbase_regionserver_heapsize"),
];

/// Properties that may point to an external database host
const REMOVE_ON_EXPORT_BINDINGS: &[(&str, &str)] = &[
    ("oozie-env", "oozie_existing_mysql_host"),
    ("oozie-site", "oozie.service.JPAService.jdbc.url"),
];

impl Default for UpdaterRegistry {
    fn default() -> Self {
        let mut registry = Self::new();

        registry.register_all(
            RuleClass::SingleHost,
            SINGLE_HOST_BINDINGS
                .iter()
                .map(|&(config_type, name, component)| {
                    (config_type, name, PropertyUpdater::single_host(component))
                }),
        );
        registry.register_all(
            RuleClass::SingleHost,
            OPTIONAL_SINGLE_HOST_BINDINGS
                .iter()
                .map(|&(config_type, name, component)| {
                    (config_type, name, PropertyUpdater::optional_single_host(component))
                }),
        );

        registry
            .register(
                RuleClass::MultiHost,
                "hdfs-site",
                "dfs.namenode.shared.edits.dir",
                PropertyUpdater::multi_host_with("JOURNALNODE", ';', false),
            )
            .register(
                RuleClass::MultiHost,
                "hive-site",
                "hive.metastore.uris",
                PropertyUpdater::multi_host_with("HIVE_METASTORE", ',', true),
            )
            .register(
                RuleClass::MultiHost,
                "webhcat-site",
                "templeton.hive.properties",
                PropertyUpdater::templeton_hive_properties(),
            )
            .register(
                RuleClass::MultiHost,
                "storm-site",
                "storm.zookeeper.servers",
                PropertyUpdater::yaml_list(
                    PropertyUpdater::multi_host("ZOOKEEPER_SERVER"),
                    FlowStyle::SingleQuoted,
                ),
            )
            .register(
                RuleClass::MultiHost,
                "storm-site",
                "nimbus.seeds",
                PropertyUpdater::yaml_list(PropertyUpdater::multi_host("NIMBUS"), FlowStyle::Plain),
            );
        registry.register_all(
            RuleClass::MultiHost,
            MULTI_HOST_BINDINGS
                .iter()
                .map(|&(config_type, name, component)| {
                    (config_type, name, PropertyUpdater::multi_host(component))
                }),
        );

        registry.register(
            RuleClass::Database,
            "hive-site",
            "javax.jdo.option.ConnectionURL",
            PropertyUpdater::database("MYSQL_SERVER", "hive-env", "hive_database"),
        );

        registry.register_all(
            RuleClass::UnitSuffix,
            UNIT_SUFFIX_BINDINGS
                .iter()
                .map(|&(config_type, name)| (config_type, name, PropertyUpdater::unit_suffix("m"))),
        );

        registry.register_all(
            RuleClass::RemoveOnExport,
            REMOVE_ON_EXPORT_BINDINGS
                .iter()
                .map(|&(config_type, name)| (config_type, name, PropertyUpdater::OriginalValue)),
        );

        registry
    }
}
