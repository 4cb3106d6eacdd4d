//! libSQL storage for SpeakerScout.
//!
//! The [`Storage`] struct wraps a local libSQL database holding the
//! explanation cache (keyed by prompt hash and model) and the history of
//! pipeline runs.
//!
//! The CLI `run` command opens it read-write; `history` opens it read-only.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use serde::Serialize;
use speakerscout_shared::{Result, ScoutError};
use uuid::Uuid;

fn db_err(e: libsql::Error) -> ScoutError {
    ScoutError::Storage(e.to_string())
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// A run about to start.
#[derive(Debug, Clone)]
pub struct NewRun<'a> {
    pub topic: &'a str,
    pub subtopic: &'a str,
    pub event_location: Option<&'a str>,
    pub keyword_mode: &'a str,
    pub rows_in: usize,
}

/// How a run ended.
#[derive(Debug, Clone)]
pub struct RunCompletion<'a> {
    /// `"completed"`, `"emptied"` or `"failed"`.
    pub outcome: &'a str,
    pub rows_out: usize,
    pub emptied_stage: Option<&'a str>,
    /// Per-stage row counts, serialized by the caller.
    pub stages_json: &'a str,
}

/// One row of run history.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: String,
    pub topic: String,
    pub subtopic: String,
    pub event_location: Option<String>,
    pub keyword_mode: String,
    pub rows_in: i64,
    pub rows_out: Option<i64>,
    pub outcome: Option<String>,
    pub emptied_stage: Option<String>,
    pub stages_json: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;
        let conn = db.connect().map_err(db_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` for reading only.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScoutError::Storage(format!(
                "no database at {}",
                path.display()
            )));
        }
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;
        let conn = db.connect().map_err(db_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ScoutError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 on a fresh database.
    async fn schema_version(&self) -> u32 {
        let Ok(mut rows) = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await
        else {
            return 0;
        };
        match rows.next().await {
            Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
            _ => 0,
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ScoutError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Explanation cache
    // -----------------------------------------------------------------------

    pub async fn cached_explanation(
        &self,
        prompt_hash: &str,
        model_id: &str,
    ) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT explanation FROM explanation_cache
                 WHERE prompt_hash = ?1 AND model_id = ?2",
                params![prompt_hash, model_id],
            )
            .await
            .map_err(db_err)?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row.get::<String>(0).map_err(db_err)?)),
            None => Ok(None),
        }
    }

    /// Store an explanation (upserts).
    pub async fn store_explanation(
        &self,
        prompt_hash: &str,
        model_id: &str,
        explanation: &str,
    ) -> Result<()> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO explanation_cache (id, prompt_hash, model_id, explanation, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(prompt_hash, model_id) DO UPDATE SET
                   explanation = excluded.explanation,
                   created_at = excluded.created_at",
                params![id.as_str(), prompt_hash, model_id, explanation, now.as_str()],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Drop every cached explanation. Returns the number removed.
    pub async fn clear_explanations(&self) -> Result<u64> {
        self.check_writable()?;
        self.conn
            .execute("DELETE FROM explanation_cache", params![])
            .await
            .map_err(db_err)
    }

    // -----------------------------------------------------------------------
    // Run history
    // -----------------------------------------------------------------------

    /// Record the start of a run. Returns the generated run ID.
    pub async fn start_run(&self, run: &NewRun<'_>) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO runs (id, topic, subtopic, event_location, keyword_mode, rows_in, started_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.as_str(),
                    run.topic,
                    run.subtopic,
                    run.event_location,
                    run.keyword_mode,
                    run.rows_in as i64,
                    now.as_str()
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(id)
    }

    pub async fn finish_run(&self, run_id: &str, done: &RunCompletion<'_>) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE runs SET finished_at = ?1, outcome = ?2, rows_out = ?3,
                   emptied_stage = ?4, stages_json = ?5
                 WHERE id = ?6",
                params![
                    now.as_str(),
                    done.outcome,
                    done.rows_out as i64,
                    done.emptied_stage,
                    done.stages_json,
                    run_id
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Most recent runs first.
    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, topic, subtopic, event_location, keyword_mode, rows_in, rows_out,
                        outcome, emptied_stage, stages_json, started_at, finished_at
                 FROM runs ORDER BY started_at DESC, id DESC LIMIT ?1",
                params![limit as i64],
            )
            .await
            .map_err(db_err)?;

        let mut runs = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            runs.push(RunRecord {
                id: row.get(0).map_err(db_err)?,
                topic: row.get(1).map_err(db_err)?,
                subtopic: row.get(2).map_err(db_err)?,
                event_location: row.get(3).map_err(db_err)?,
                keyword_mode: row.get(4).map_err(db_err)?,
                rows_in: row.get(5).map_err(db_err)?,
                rows_out: row.get(6).map_err(db_err)?,
                outcome: row.get(7).map_err(db_err)?,
                emptied_stage: row.get(8).map_err(db_err)?,
                stages_json: row.get(9).map_err(db_err)?,
                started_at: row.get(10).map_err(db_err)?,
                finished_at: row.get(11).map_err(db_err)?,
            });
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("scout_test_{}.db", Uuid::now_v7()))
    }

    async fn test_storage() -> Storage {
        Storage::open(&temp_db()).await.expect("open test db")
    }

    fn new_run(topic: &str) -> NewRun<'_> {
        NewRun {
            topic,
            subtopic: "healthcare",
            event_location: None,
            keyword_mode: "classified",
            rows_in: 120,
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.schema_version().await, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = temp_db();
        let first = Storage::open(&tmp).await.expect("first open");
        drop(first);
        let second = Storage::open(&tmp).await.expect("second open");
        assert_eq!(second.schema_version().await, 2);
    }

    #[tokio::test]
    async fn explanation_cache_roundtrip_and_upsert() {
        let storage = test_storage().await;
        assert!(
            storage
                .cached_explanation("h1", "model-a")
                .await
                .unwrap()
                .is_none()
        );

        storage.store_explanation("h1", "model-a", "first").await.unwrap();
        storage.store_explanation("h1", "model-a", "second").await.unwrap();
        storage.store_explanation("h1", "model-b", "other").await.unwrap();

        assert_eq!(
            storage.cached_explanation("h1", "model-a").await.unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(storage.clear_explanations().await.unwrap(), 2);
        assert!(storage.cached_explanation("h1", "model-b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn run_lifecycle() {
        let storage = test_storage().await;
        let first = storage.start_run(&new_run("AI")).await.unwrap();
        let second = storage.start_run(&new_run("Robotics")).await.unwrap();
        storage
            .finish_run(
                &second,
                &RunCompletion {
                    outcome: "emptied",
                    rows_out: 0,
                    emptied_stage: Some("location filter"),
                    stages_json: "[]",
                },
            )
            .await
            .unwrap();

        let runs = storage.recent_runs(10).await.unwrap();
        assert_eq!(runs.len(), 2);
        let finished = runs.iter().find(|r| r.id == second).unwrap();
        assert_eq!(finished.outcome.as_deref(), Some("emptied"));
        assert_eq!(finished.emptied_stage.as_deref(), Some("location filter"));
        assert_eq!(finished.rows_out, Some(0));
        let open = runs.iter().find(|r| r.id == first).unwrap();
        assert!(open.finished_at.is_none());
        assert_eq!(open.rows_in, 120);

        assert_eq!(storage.recent_runs(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = temp_db();
        let rw = Storage::open(&tmp).await.unwrap();
        rw.start_run(&new_run("AI")).await.unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.recent_runs(5).await.unwrap().len(), 1);
        let err = ro.store_explanation("h", "m", "x").await.unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        assert!(Storage::open_readonly(&temp_db()).await.is_err());
    }
}
