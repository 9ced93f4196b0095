use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use super::{ArtifactKey, ArtifactStore, StoreError};

#[derive(Clone, Debug)]
pub struct DB {
    pool: SqlitePool,
}

impl DB {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options =
            SqliteConnectOptions::from_str(&path.to_string_lossy())?.create_if_missing(true);

        Self::connect(options, 5).await
    }

    async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[cfg(test)]
impl DB {
    /// Every in-memory connection is its own database, so keep just one.
    pub async fn new_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options, 1).await
    }
}

impl ArtifactStore for DB {
    async fn put(&self, key: &ArtifactKey, value: &Value) -> Result<(), StoreError> {
        let key = key.as_key();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO artifacts (key, body, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (key)
            DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&key)
        .bind(value.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(%key, "stored artifact");
        Ok(())
    }

    async fn get(&self, key: &ArtifactKey) -> Result<Option<Value>, StoreError> {
        let key = key.as_key();
        let body: Option<String> =
            sqlx::query_scalar(r#"SELECT body FROM artifacts WHERE key = ?"#)
                .bind(&key)
                .fetch_optional(&self.pool)
                .await?;

        body.map(|body| {
            serde_json::from_str(&body).map_err(|source| StoreError::Decode { key, source })
        })
        .transpose()
    }

    async fn remove(&self, key: &ArtifactKey) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"DELETE FROM artifacts WHERE key = ?"#)
            .bind(key.as_key())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_db_connection() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("newsdrill.db");

        let db = DB::open(&db_path).await.unwrap();
        db.put(&ArtifactKey::ClozeTest, &json!({"question": "", "ans": []}))
            .await
            .unwrap();
        drop(db);

        let reopened = DB::open(&db_path).await.unwrap();
        assert_eq!(
            reopened.get(&ArtifactKey::ClozeTest).await.unwrap(),
            Some(json!({"question": "", "ans": []}))
        );
    }

    #[tokio::test]
    async fn upsert_get_and_remove() {
        let db = DB::new_in_memory().await.unwrap();
        let key = ArtifactKey::Quiz("abc".into());

        assert_eq!(db.get(&key).await.unwrap(), None);
        db.put(&key, &json!([1])).await.unwrap();
        db.put(&key, &json!([1, 2])).await.unwrap();
        assert_eq!(db.get(&key).await.unwrap(), Some(json!([1, 2])));

        assert!(db.remove(&key).await.unwrap());
        assert!(!db.remove(&key).await.unwrap());
    }
}
