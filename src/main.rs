//! Policy Management DAO - smoke check
//!
//! Loads `config/<env>.yaml`, binds a PostgreSQL data source under the
//! configured lookup name and runs one unit of work against it:
//!
//! ```text
//! begin_transaction → get_connection → SELECT 1 → commit_transaction → close_connection
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use policy_mgt_dao::{DaoFactory, NamingRegistry, PgDataSource, PolicyConfig, UnitOfWork};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = PolicyConfig::load(&env)?;
    let _log_guard = policy_mgt_dao::logging::init_logging(&config.logging);

    let data_source_config = config
        .data_source
        .as_ref()
        .context("data_source section missing from configuration")?;
    let postgres_url = config
        .postgres_url
        .as_deref()
        .context("postgres_url missing from configuration")?;

    let registry = Arc::new(NamingRegistry::new());
    if let Some(definition) = &data_source_config.jndi_lookup_definition {
        let source = PgDataSource::connect(definition.name.clone(), postgres_url).await?;
        source.health_check().await?;
        registry.bind_data_source(definition.name.clone(), Arc::new(source));
    }

    let factory = DaoFactory::new(registry);
    factory.init(Some(data_source_config)).await?;

    let mut uow = UnitOfWork::new();
    let result = run_smoke_unit(&factory, &mut uow).await;
    factory.close_connection(&mut uow).await;
    result?;

    info!(env = %env, "Smoke check passed");
    Ok(())
}

async fn run_smoke_unit(factory: &DaoFactory, uow: &mut UnitOfWork) -> anyhow::Result<()> {
    factory.begin_transaction(uow).await?;
    let conn = factory.get_connection(uow).await?;
    if let Err(e) = conn.execute("SELECT 1").await {
        factory.rollback_transaction(uow).await?;
        return Err(anyhow::anyhow!(e).context("smoke query failed"));
    }
    factory.commit_transaction(uow).await?;
    Ok(())
}
