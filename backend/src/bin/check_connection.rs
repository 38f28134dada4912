//! Connectivity check: prints the database name, server time and tables

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_reports::{services::TableService, Config, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "check_connection=info,inventory_reports=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let db = Database::new(config.database);

    let pool = db.acquire().await?;
    let service = TableService::new(pool);

    let outcome = async {
        let info = service.check_connection().await?;
        println!("Database: {}", info.database);
        println!("Server:   {}", info.server);
        println!("Time:     {}", info.server_time);

        let tables = service.list_tables().await?;
        let base_tables: Vec<_> = tables.iter().filter(|t| t.is_base_table()).collect();
        println!("Tables ({}):", base_tables.len());
        for table in base_tables {
            println!("  {}.{} ({} columns)", table.schema, table.name, table.columns);
        }
        Ok::<_, inventory_reports::error::AppError>(())
    }
    .await;

    db.release().await;
    outcome?;
    Ok(())
}
