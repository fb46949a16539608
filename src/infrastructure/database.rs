use crate::entities::{file_records, profiles};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", db_url);

    // Every connection to an in-memory SQLite database sees its own database
    let (max, min) = if db_url.contains(":memory:") {
        (1, 1)
    } else {
        (100, 5)
    };

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(max)
        .min_connections(min)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Parents before children: file_records references profiles
    let stmts = vec![
        (
            "profiles",
            schema
                .create_table_from_entity(profiles::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "file_records",
            schema
                .create_table_from_entity(file_records::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        let stmt = builder.build(&stmt);
        db.execute(stmt).await.map_err(|e| {
            tracing::error!("   - Failed to create table '{}': {}", name, e);
            e
        })?;
        info!("   - Table '{}' checked/created", name);
    }

    Ok(())
}
