//! # topoconf - topology aware blueprint configuration
//!
//! For CLI usage see the `README.md` of the repository.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `topoconf` works internally.
//!
//! ### Terms
//!
//! - a `blueprint` declares services and `host groups`
//! - a `host group` declares the components it runs and gets concrete `hosts` assigned
//! - `properties` are grouped by `config type` (`core-site`, `hdfs-site`, ...)
//! - a `host group token` (`%HOSTGROUP::master%`) stands for the host(s) of a group
//!
//! A blueprint is portable because its configuration does not name hosts, only tokens or the
//! `localhost` placeholder. A cluster is concrete: every property names real hosts.
//!
//! ### Scopes
//!
//! see [configuration::Configuration]
//!
//! Properties live in layered scopes. The cluster scope cascades from stack defaults over the
//! blueprint to cluster overrides and is read through its merged view. Every host group has a
//! local scope of its own overrides which is never merged with anything.
//!
//! ### Rewriting rules
//!
//! see [updater::UpdateProperty]
//!
//! A rule belongs to one `(config type, property name)` and knows the component(s) the value
//! points to. The [registry::UpdaterRegistry] holds the static catalog of rules, split into
//! classes that create and export treat differently. Rules for HA deployments are derived from
//! the cluster configuration itself on every run ([ha]).
//!
//! **Example**
//!
//! NAMENODE runs in host group `master` on `c6401`.
//!
//! | property                           | blueprint                      | cluster                 |
//! |------------------------------------|--------------------------------|-------------------------|
//! | `core-site/fs.defaultFS`           | `hdfs://%HOSTGROUP::master%:8020` | `hdfs://c6401:8020`  |
//! | `hdfs-site/dfs.namenode.http-address` | `localhost:50070`          | `c6401:50070`           |
//! | `hbase-site/hbase.zookeeper.quorum`| `%HOSTGROUP::zk%:2181`         | `zk1:2181,zk2:2181`     |
//!
//! ### Pipelines
//!
//! see [processor::ConfigurationProcessor]
//!
//! - **create**: blueprint -> cluster. All new values are computed first and only written once
//!   every rule succeeded. NameNode HA gets its initial active/standby hosts and deployed
//!   services get default proxy user settings.
//! - **export**: cluster -> blueprint. Hosts are replaced by tokens ([export]), single host
//!   properties without a known host are dropped, multi host lists are deduplicated. Passwords
//!   and properties that may point to external databases never leave the cluster.
//! - **required host groups**: which groups a configuration references, without changing it.
//!
//! ### Input and output
//!
//! The CLI reads a [document::ClusterDocument] (YAML, JSON or HCL) and prints a
//! [document::ConfigurationReport].
//!
pub mod configuration;
pub mod document;
pub mod export;
pub mod ha;
pub mod processor;
pub mod registry;
pub mod token;
pub mod topology;
pub mod updater;
