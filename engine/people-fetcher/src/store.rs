use crate::config::DatabaseConfig;
use crate::error::{FetcherError, Result};
use crate::models::PersonRecord;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, info};

const INSERT_PERSON: &str = r#"
    INSERT INTO people (id, name, birth_year, death_year, photo, bio, nationality)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (id) DO NOTHING
"#;

/// Destination for people records
#[async_trait::async_trait]
pub trait PeopleStore: Send {
    /// Insert a record, leaving any existing row with the same id untouched.
    ///
    /// Returns `true` when a new row was written.
    async fn insert_person(&mut self, record: &PersonRecord) -> Result<bool>;

    /// Make every insert since the last commit durable
    async fn commit(&mut self) -> Result<()>;

    /// Release the connection. Uncommitted inserts are rolled back.
    async fn close(&mut self);
}

/// PostgreSQL-backed store holding a single connection
pub struct PgPeopleStore {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgPeopleStore {
    /// Open the connection, failing with [`FetcherError::Connection`]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = connect_options(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(FetcherError::Connection)?;

        info!("Database connection successful");
        Ok(Self { pool, tx: None })
    }

    async fn transaction(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(self.tx.insert(tx))
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    let host = config
        .host
        .as_deref()
        .ok_or_else(|| FetcherError::config("database host is not set"))?;
    let password = config
        .password
        .as_deref()
        .ok_or_else(|| FetcherError::config("database password is not set"))?;

    Ok(PgConnectOptions::new()
        .host(host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(password))
}

#[async_trait::async_trait]
impl PeopleStore for PgPeopleStore {
    async fn insert_person(&mut self, record: &PersonRecord) -> Result<bool> {
        let tx = self.transaction().await?;

        let result = sqlx::query(INSERT_PERSON)
            .bind(record.id)
            .bind(&record.name)
            .bind(record.birth_year)
            .bind(record.death_year)
            .bind(&record.photo)
            .bind(&record.bio)
            .bind(&record.nationality)
            .execute(&mut **tx)
            .await?;

        debug!("Insert for person {} affected {} rows", record.id, result.rows_affected());
        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn close(&mut self) {
        // Dropping the open transaction returns the connection with a rollback queued.
        self.tx.take();
        self.pool.close().await;
        info!("Database connection closed");
    }
}
