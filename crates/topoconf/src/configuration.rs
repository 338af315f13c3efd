//! configuration scopes
//!
//! A [Configuration] is one layer of properties plus an optional parent layer.
//! Lookups cascade from the child towards the root, writes always land in the
//! layer they were issued against.
//!
//! ```text
//! stack defaults  <-  blueprint  <-  cluster overrides
//!     (parent)                          (own layer)
//! ```
use indexmap::IndexMap;

/// Properties of a single config type (`property name -> value`)
pub type TypeProperties = IndexMap<String, String>;

/// All properties of a scope (`config type -> property name -> value`)
pub type Properties = IndexMap<String, TypeProperties>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    properties: Properties,
    parent: Option<Box<Configuration>>,
}

impl Configuration {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            parent: None,
        }
    }

    pub fn with_parent(properties: Properties, parent: Configuration) -> Self {
        Self {
            properties,
            parent: Some(Box::new(parent)),
        }
    }

    /// Properties of this layer only
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn parent(&self) -> Option<&Configuration> {
        self.parent.as_deref()
    }

    /// Merged view of this layer and all of its ancestors
    ///
    /// Keys keep the position of the layer that introduced them, values come
    /// from the most specific layer.
    pub fn full_properties(&self) -> Properties {
        let mut merged = match &self.parent {
            Some(parent) => parent.full_properties(),
            None => Properties::default(),
        };

        for (config_type, type_properties) in &self.properties {
            let target = merged.entry(config_type.clone()).or_default();
            for (name, value) in type_properties {
                target.insert(name.clone(), value.clone());
            }
        }

        merged
    }

    /// Cascading lookup of a single property
    pub fn property(&self, config_type: &str, name: &str) -> Option<&str> {
        self.properties
            .get(config_type)
            .and_then(|type_properties| type_properties.get(name))
            .map(String::as_str)
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|parent| parent.property(config_type, name))
            })
    }

    pub fn contains_property(&self, config_type: &str, name: &str) -> bool {
        self.property(config_type, name).is_some()
    }

    pub fn set_property(
        &mut self,
        config_type: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.properties
            .entry(config_type.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Folds all ancestors into this layer
    ///
    /// Afterwards [Configuration::properties] equals [Configuration::full_properties]. Required
    /// before removing properties, otherwise a removed key would reappear from a parent.
    pub fn collapse(&mut self) {
        if self.parent.is_none() {
            return;
        }

        self.properties = self.full_properties();
        self.parent = None;
        tracing::trace!("configuration collapsed into a single layer");
    }
}

/// Read access to single properties, regardless of how they are layered
pub trait PropertyLookup {
    fn lookup(&self, config_type: &str, name: &str) -> Option<&str>;

    fn contains(&self, config_type: &str, name: &str) -> bool {
        self.lookup(config_type, name).is_some()
    }
}

impl PropertyLookup for Properties {
    fn lookup(&self, config_type: &str, name: &str) -> Option<&str> {
        self.get(config_type)
            .and_then(|type_properties| type_properties.get(name))
            .map(String::as_str)
    }
}

impl PropertyLookup for Configuration {
    fn lookup(&self, config_type: &str, name: &str) -> Option<&str> {
        self.property(config_type, name)
    }
}

impl From<Properties> for Configuration {
    fn from(value: Properties) -> Self {
        Configuration::new(value)
    }
}

/// Utility macro to create [Properties]
///
/// ```
/// # use topoconf::properties;
/// let properties = properties! {
///     "core-site" => { "fs.defaultFS" => "hdfs://localhost:8020" },
///     "hdfs-site" => {
///         "dfs.nameservices" => "mycluster",
///         "dfs.ha.namenodes.mycluster" => "nn1,nn2"
///     }
/// };
/// assert_eq!(properties["hdfs-site"].len(), 2);
/// ```
///
/// An empty map
/// ```
/// # use topoconf::properties;
/// let properties = properties! {};
/// assert!(properties.is_empty());
/// ```
#[macro_export]
macro_rules! properties {
    {} => {
        $crate::configuration::Properties::default()
    };
    { $($config_type:expr => { $($name:expr => $value:expr),* $(,)? }),+ $(,)? } => {{
        let mut properties = $crate::configuration::Properties::default();
        $(
            #[allow(unused_variables)]
            let type_properties = properties.entry($config_type.to_string()).or_default();
            $(
                type_properties.insert($name.to_string(), $value.to_string());
            )*
        )+
        properties
    }};
}
