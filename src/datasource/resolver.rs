//! Data source resolution from configuration

use std::sync::Arc;

use tracing::debug;

use super::DataSource;
use crate::config::DataSourceConfig;
use crate::error::DaoError;
use crate::naming::Naming;

/// Resolve the data source described by `config`
///
/// A direct handle is returned unchanged. Otherwise the lookup definition is
/// resolved through `naming`, passing the property bag only when the
/// definition lists properties.
pub async fn resolve_data_source(
    config: Option<&DataSourceConfig>,
    naming: &dyn Naming,
) -> Result<Arc<dyn DataSource>, DaoError> {
    let config = config.ok_or_else(|| {
        DaoError::Configuration(
            "Policy Management Repository data source configuration is null and thus, is not initialized"
                .to_string(),
        )
    })?;

    if let Some(source) = &config.direct {
        debug!(source = source.name(), "Using directly supplied data source");
        return Ok(source.clone());
    }

    let definition = config.jndi_lookup_definition.as_ref().ok_or_else(|| {
        DaoError::Configuration(
            "data source configuration has neither a data source nor a JNDI lookup definition"
                .to_string(),
        )
    })?;

    debug!(
        name = %definition.name,
        "Initializing Policy Management Repository data source using the JNDI Lookup Definition"
    );
    let environment = definition.environment();
    naming
        .lookup_data_source(&definition.name, environment.as_ref())
        .await
        .map_err(|e| DaoError::lookup(definition.name.as_str(), e))
}
