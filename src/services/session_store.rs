use chrono::{DateTime, Utc};
use moka::sync::Cache;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::models::{ColumnStats, DataSession, StatusCheck};

const SESSION_CACHE_SIZE: u64 = 64;

/// Sqlite-backed persistence for session documents and status checks. Each
/// session is stored as one JSON document, read through a small cache since
/// paginated data and analytics requests re-read the same session.
pub struct SessionStore {
    conn: Mutex<Connection>,
    cache: Cache<String, Arc<DataSession>>,
}

impl SessionStore {
    pub fn new(path: Option<&str>) -> Result<Self, AppError> {
        info!("Opening session store ({})", path.unwrap_or("in-memory"));
        let conn = match path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(|e| {
            error!("Failed to open database: {}", e);
            AppError::from(e)
        })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                doc        TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS status_checks (
                id          TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            cache: Cache::new(SESSION_CACHE_SIZE),
        })
    }

    pub async fn insert_session(&self, session: &DataSession) -> Result<(), AppError> {
        debug!("Persisting session {} ({} rows)", session.id, session.row_count);
        let doc = serde_json::to_string(session)?;
        {
            let conn = self.conn.lock();
            conn.execute(
                "INSERT OR REPLACE INTO sessions (id, doc, created_at) VALUES (?1, ?2, ?3)",
                params![session.id, doc, session.created_at.to_rfc3339()],
            )?;
        }
        self.cache.insert(session.id.clone(), Arc::new(session.clone()));
        Ok(())
    }

    pub async fn get_session(&self, id: &str) -> Result<Arc<DataSession>, AppError> {
        if let Some(hit) = self.cache.get(id) {
            return Ok(hit);
        }

        let doc: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row("SELECT doc FROM sessions WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?
        };

        let doc = doc.ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        let session: Arc<DataSession> = Arc::new(serde_json::from_str(&doc)?);
        self.cache.insert(id.to_string(), session.clone());
        Ok(session)
    }

    pub async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        let deleted = {
            let conn = self.conn.lock();
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?
        };
        self.cache.invalidate(id);
        if deleted == 0 {
            return Err(AppError::SessionNotFound(id.to_string()));
        }
        info!("Deleted session {}", id);
        Ok(())
    }

    /// Attach analysis results to an existing session document.
    pub async fn save_analytics(
        &self,
        id: &str,
        analytics: Vec<ColumnStats>,
        analyzed_columns: Vec<String>,
    ) -> Result<(), AppError> {
        let session = self.get_session(id).await?;
        let mut updated = (*session).clone();
        updated.analytics = Some(analytics);
        updated.analyzed_columns = Some(analyzed_columns);
        self.insert_session(&updated).await
    }

    pub async fn insert_status(&self, check: &StatusCheck) -> Result<(), AppError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO status_checks (id, client_name, timestamp) VALUES (?1, ?2, ?3)",
            params![check.id, check.client_name, check.timestamp.to_rfc3339()],
        )?;
        Ok(())
    }

    pub async fn list_status(&self, limit: usize) -> Result<Vec<StatusCheck>, AppError> {
        let rows: Vec<(String, String, String)> = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare("SELECT id, client_name, timestamp FROM status_checks LIMIT ?1")?;
            let mapped = stmt.query_map(params![limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            mapped.collect::<Result<Vec<_>, _>>()?
        };

        rows.into_iter()
            .map(|(id, client_name, timestamp)| {
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .map_err(|e| AppError::Internal(format!("Corrupt timestamp: {}", e)))?
                    .with_timezone(&Utc);
                Ok(StatusCheck {
                    id,
                    client_name,
                    timestamp,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnType;
    use indexmap::IndexMap;
    use serde_json::json;

    fn sample_session() -> DataSession {
        let mut row = crate::models::Row::new();
        row.insert("a".to_string(), json!(1));
        let mut types = IndexMap::new();
        types.insert("a".to_string(), ColumnType::Numeric);
        DataSession::new(
            "http://example.com/hook".to_string(),
            vec![row],
            vec!["a".to_string()],
            types,
        )
    }

    #[tokio::test]
    async fn session_round_trips() {
        let store = SessionStore::new(None).unwrap();
        let session = sample_session();
        store.insert_session(&session).await.unwrap();

        let loaded = store.get_session(&session.id).await.unwrap();
        assert_eq!(loaded.url, session.url);
        assert_eq!(loaded.row_count, 1);
        assert_eq!(loaded.column_types["a"], ColumnType::Numeric);
    }

    #[tokio::test]
    async fn missing_session_is_an_explicit_error() {
        let store = SessionStore::new(None).unwrap();
        let err = store.get_session("nope").await.unwrap_err();
        assert!(matches!(err, AppError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_the_session() {
        let store = SessionStore::new(None).unwrap();
        let session = sample_session();
        store.insert_session(&session).await.unwrap();

        store.delete_session(&session.id).await.unwrap();
        assert!(store.get_session(&session.id).await.is_err());
        assert!(matches!(
            store.delete_session(&session.id).await.unwrap_err(),
            AppError::SessionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn analytics_are_saved_onto_the_session() {
        let store = SessionStore::new(None).unwrap();
        let session = sample_session();
        store.insert_session(&session).await.unwrap();

        let stats = crate::services::stats::analyze_column(
            "a",
            &[json!(1)],
            ColumnType::Numeric,
        );
        store
            .save_analytics(&session.id, vec![stats], vec!["a".to_string()])
            .await
            .unwrap();

        let loaded = store.get_session(&session.id).await.unwrap();
        let analytics = loaded.analytics.as_ref().unwrap();
        assert_eq!(analytics.len(), 1);
        assert_eq!(analytics[0].column, "a");
        assert_eq!(loaded.analyzed_columns.as_deref(), Some(&["a".to_string()][..]));
    }

    #[tokio::test]
    async fn status_checks_round_trip() {
        let store = SessionStore::new(None).unwrap();
        let check = StatusCheck::new("probe".to_string());
        store.insert_status(&check).await.unwrap();

        let listed = store.list_status(1000).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].client_name, "probe");
        assert_eq!(listed[0].id, check.id);
    }
}
