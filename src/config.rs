use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::datasource::DataSource;
use crate::error::DaoError;

/// Property bag handed to the directory service along with a lookup name
pub type JndiEnvironment = HashMap<String, String>;

/// Top-level configuration of the policy management repository
#[derive(Debug, Deserialize, Clone)]
pub struct PolicyConfig {
    #[serde(default)]
    pub logging: LogConfig,
    /// PostgreSQL connection URL bound under the data source lookup name
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub data_source: Option<DataSourceConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Emit sqlx per-statement logs
    #[serde(default)]
    pub log_statements: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "policy-mgt-dao.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            log_statements: false,
        }
    }
}

/// Connection source descriptor
///
/// Either a direct handle (set programmatically, never deserialized) or a
/// directory lookup definition. A direct handle wins when both are present.
#[derive(Deserialize, Clone, Default)]
pub struct DataSourceConfig {
    #[serde(default)]
    pub xa_enabled: bool,
    #[serde(default)]
    pub jndi_lookup_definition: Option<JndiLookupDefinition>,
    /// Coordinator lookup name; the standard name when absent
    #[serde(default)]
    pub transaction_manager_name: Option<String>,
    #[serde(skip)]
    pub direct: Option<Arc<dyn DataSource>>,
}

impl DataSourceConfig {
    /// Descriptor resolved through the directory service
    pub fn lookup(definition: JndiLookupDefinition, xa_enabled: bool) -> Self {
        Self {
            xa_enabled,
            jndi_lookup_definition: Some(definition),
            transaction_manager_name: None,
            direct: None,
        }
    }

    /// Descriptor carrying an already constructed source
    pub fn direct(source: Arc<dyn DataSource>, xa_enabled: bool) -> Self {
        Self {
            xa_enabled,
            jndi_lookup_definition: None,
            transaction_manager_name: None,
            direct: Some(source),
        }
    }

    pub fn with_transaction_manager_name(mut self, name: impl Into<String>) -> Self {
        self.transaction_manager_name = Some(name.into());
        self
    }
}

impl fmt::Debug for DataSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceConfig")
            .field("xa_enabled", &self.xa_enabled)
            .field("jndi_lookup_definition", &self.jndi_lookup_definition)
            .field("transaction_manager_name", &self.transaction_manager_name)
            .field("direct", &self.direct.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JndiLookupDefinition {
    pub name: String,
    /// Ordered; absent means no environment is passed to the lookup
    #[serde(default)]
    pub properties: Option<Vec<JndiProperty>>,
}

impl JndiLookupDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: None,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.get_or_insert_with(Vec::new).push(JndiProperty {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Property bag for the lookup; later duplicates overwrite earlier ones
    pub fn environment(&self) -> Option<JndiEnvironment> {
        self.properties.as_ref().map(|props| {
            props
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect()
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JndiProperty {
    pub name: String,
    pub value: String,
}

impl PolicyConfig {
    /// Load `config/{env}.yaml`
    pub fn load(env: &str) -> Result<Self, DaoError> {
        Self::from_file(&format!("config/{}.yaml", env))
    }

    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> Result<Self, DaoError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DaoError::Configuration(format!("failed to read config file {}: {}", path, e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, DaoError> {
        serde_yaml::from_str(content).map_err(|e| DaoError::Configuration(e.to_string()))
    }
}
