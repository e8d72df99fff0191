use crate::entities::{claims, items, marketplace_items, users};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    crate::infrastructure::seed::seed_initial_admin(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    if db_url.starts_with("postgres://") {
        info!("🔄 Running SQLx migrations for PostgreSQL...");
        let pool = sqlx::PgPool::connect(&db_url).await?;
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            info!("⚠️ SQLx migration error: {}. Skipping as requested.", e);
        }
    } else {
        info!("🔄 Running SeaORM auto-migrations for SQLite/Other...");
        let builder = db.get_database_backend();
        let schema = Schema::new(builder);

        let stmts = vec![
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
            schema
                .create_table_from_entity(items::Entity)
                .if_not_exists()
                .to_owned(),
            schema
                .create_table_from_entity(claims::Entity)
                .if_not_exists()
                .to_owned(),
            schema
                .create_table_from_entity(marketplace_items::Entity)
                .if_not_exists()
                .to_owned(),
        ];

        for stmt in stmts {
            let stmt = builder.build(&stmt);
            let _ = db.execute(stmt).await;
        }

        // Hot paths filter on these; the unique index on marketplace item_id
        // comes from the entity definition itself.
        let _ = db
            .execute(sea_orm::Statement::from_string(
                builder,
                "CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);".to_string(),
            ))
            .await;
        let _ = db
            .execute(sea_orm::Statement::from_string(
                builder,
                "CREATE INDEX IF NOT EXISTS idx_claims_status ON claims(status);".to_string(),
            ))
            .await;
    }

    Ok(())
}
