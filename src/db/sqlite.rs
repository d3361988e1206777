use crate::db::models::DbLead;
use crate::db::schema::{REFRESH_TOKEN_KEY, SQLITE_INIT};
use crate::db::traits::{LeadStore, TokenStore};
use crate::error::LeadsError;
use crate::types::lead::LeadRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::debug;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database and apply the bundled schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, LeadsError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let mut pool_opts = SqlitePoolOptions::new();
    if database_url.contains(":memory:") {
        // every connection to `:memory:` is a separate database
        pool_opts = pool_opts.max_connections(1);
    }
    let pool = pool_opts.connect_with(connect_opts).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), LeadsError> {
    // execute multiple statements one by one (sqlx::query runs a single statement)
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct KvStorage {
    pool: SqlitePool,
}

impl KvStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, LeadsError> {
        let rec: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec.map(|r| r.0))
    }

    /// Overwrite the value for `key`; no history is kept.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), LeadsError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value=excluded.value,
                updated_at=excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for KvStorage {
    async fn get_refresh_token(&self) -> Result<Option<String>, LeadsError> {
        self.get(REFRESH_TOKEN_KEY).await
    }

    async fn put_refresh_token(&self, token: &str) -> Result<(), LeadsError> {
        self.put(REFRESH_TOKEN_KEY, token).await?;
        debug!("refresh token stored");
        Ok(())
    }
}

#[derive(Clone)]
pub struct LeadsStorage {
    pool: SqlitePool,
}

impl LeadsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert unless a row with the same `email_id` exists. Returns true when a row was written.
    pub async fn insert_if_absent(&self, lead: &LeadRecord) -> Result<bool, LeadsError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leads (
                email_id, received_date, created_at, lead_name, lead_email,
                lead_phone, wedding_venue, inquiry_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email_id) DO NOTHING
            "#,
        )
        .bind(&lead.email_id)
        .bind(lead.received_date.map(|d| d.to_rfc3339()))
        .bind(Utc::now().to_rfc3339())
        .bind(&lead.lead_name)
        .bind(&lead.lead_email)
        .bind(&lead.lead_phone)
        .bind(&lead.wedding_venue)
        .bind(&lead.inquiry_details)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self) -> Result<Vec<DbLead>, LeadsError> {
        let rows = sqlx::query(
            r#"SELECT id, email_id, received_date, created_at, lead_name, lead_email,
               lead_phone, wedding_venue, inquiry_details
               FROM leads ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    fn row_to_model(row: SqliteRow) -> Result<DbLead, LeadsError> {
        let received_str: Option<String> = row.try_get("received_date")?;
        let created_str: String = row.try_get("created_at")?;

        let received_date = received_str.as_deref().map(parse_rfc3339).transpose()?;
        let created_at = parse_rfc3339(&created_str)?;

        Ok(DbLead {
            id: row.try_get("id")?,
            email_id: row.try_get("email_id")?,
            received_date,
            created_at,
            lead_name: row.try_get("lead_name")?,
            lead_email: row.try_get("lead_email")?,
            lead_phone: row.try_get("lead_phone")?,
            wedding_venue: row.try_get("wedding_venue")?,
            inquiry_details: row.try_get("inquiry_details")?,
        })
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, LeadsError> {
    let dt = DateTime::parse_from_rfc3339(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(dt.with_timezone(&Utc))
}

#[async_trait]
impl LeadStore for LeadsStorage {
    async fn insert(&self, lead: &LeadRecord) -> Result<(), LeadsError> {
        let written = self.insert_if_absent(lead).await?;
        debug!(email_id = %lead.email_id, written, "lead insert");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        connect("sqlite::memory:").await.expect("open in-memory db")
    }

    fn lead(email_id: &str, name: &str) -> LeadRecord {
        LeadRecord {
            email_id: email_id.to_string(),
            received_date: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            lead_name: Some(name.to_string()),
            lead_email: Some("jane@x.com".to_string()),
            lead_phone: None,
            wedding_venue: Some("Oak Hall".to_string()),
            inquiry_details: None,
        }
    }

    #[tokio::test]
    async fn refresh_token_is_absent_until_stored() {
        let store = KvStorage::new(memory_pool().await);
        assert_eq!(store.get_refresh_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn refresh_token_put_overwrites() {
        let store = KvStorage::new(memory_pool().await);
        store.put_refresh_token("first").await.unwrap();
        store.put_refresh_token("second").await.unwrap();
        assert_eq!(
            store.get_refresh_token().await.unwrap().as_deref(),
            Some("second")
        );

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn lead_insert_dedups_on_email_id() {
        let store = LeadsStorage::new(memory_pool().await);
        assert!(store.insert_if_absent(&lead("m1", "Jane")).await.unwrap());
        assert!(!store.insert_if_absent(&lead("m1", "Other")).await.unwrap());
        store.insert(&lead("m2", "Bob")).await.unwrap();

        let rows = store.list().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lead_name.as_deref(), Some("Jane"));
        let record: LeadRecord = rows[1].clone().into();
        assert_eq!(record, lead("m2", "Bob"));
    }
}
