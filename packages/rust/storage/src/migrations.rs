//! SQL migration definitions for the SpeakerScout database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: explanation_cache",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One generated explanation per (prompt, model)
CREATE TABLE IF NOT EXISTS explanation_cache (
    id          TEXT PRIMARY KEY,
    prompt_hash TEXT NOT NULL,
    model_id    TEXT NOT NULL,
    explanation TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE(prompt_hash, model_id)
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Run history",
            sql: r#"
CREATE TABLE IF NOT EXISTS runs (
    id             TEXT PRIMARY KEY,
    topic          TEXT NOT NULL,
    subtopic       TEXT NOT NULL,
    event_location TEXT,
    keyword_mode   TEXT NOT NULL,
    rows_in        INTEGER NOT NULL,
    rows_out       INTEGER,
    outcome        TEXT,
    emptied_stage  TEXT,
    stages_json    TEXT,
    started_at     TEXT NOT NULL,
    finished_at    TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_ascend_and_record_themselves() {
        let all = all_migrations();
        for (i, m) in all.iter().enumerate() {
            assert_eq!(m.version as usize, i + 1);
            assert!(m.sql.contains(&format!("VALUES ({})", m.version)));
        }
    }
}
