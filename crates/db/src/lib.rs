use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use utils::assets::{database_path, ensure_asset_dir};

pub mod entities;
pub mod models;
pub mod types;

pub use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, SqlErr, TransactionTrait};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Clone)]
pub struct DBService {
    pub pool: DatabaseConnection,
}

impl DBService {
    /// Connects to `DATABASE_URL`, or to `db.sqlite` inside the asset
    /// directory, and runs pending migrations.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = match std::env::var(DATABASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                ensure_asset_dir().map_err(|err| DbErr::Custom(err.to_string()))?;
                format!("sqlite://{}?mode=rwc", database_path().to_string_lossy())
            }
        };
        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.sqlx_logging(false);
        let pool = Database::connect(options).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::debug!(backend = ?pool.get_database_backend(), "database ready");
        Ok(DBService { pool })
    }
}
