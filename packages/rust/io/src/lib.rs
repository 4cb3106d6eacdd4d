//! File ingestion and export for SpeakerScout.
//!
//! Profile batches are JSON arrays of objects or JSON Lines. Reference
//! tables are JSON arrays (objects keyed by a configured column, or bare
//! strings) or plain text with one name per line. Results are exported
//! as JSON or JSON Lines, chosen by file extension.

use std::path::Path;

use serde_json::{Map, Value};
use speakerscout_filters::ReferenceTables;
use speakerscout_shared::{ReferenceConfig, Result, ScoutError, expand_home};
use tracing::{info, instrument, warn};

/// Row as read from or written to disk.
pub type Row = Map<String, Value>;

/// On-disk table encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Json,
    JsonLines,
    /// One value per line; only valid for reference tables.
    Text,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jsonl" | "ndjson") => Self::JsonLines,
            Some("txt") => Self::Text,
            _ => Self::Json,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a profile batch. Column validation happens when the rows become a
/// `RecordSet`, not here.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_profiles(path: &Path) -> Result<Vec<Row>> {
    let content = std::fs::read_to_string(path).map_err(|e| ScoutError::io(path, e))?;
    let rows = match TableFormat::from_path(path) {
        TableFormat::JsonLines => parse_json_lines(&content)?,
        TableFormat::Json => parse_json_array(&content)?,
        TableFormat::Text => {
            return Err(ScoutError::validation(format!(
                "{} is plain text; profile batches must be JSON or JSON Lines",
                path.display()
            )));
        }
    };
    info!(rows = rows.len(), "loaded profile batch");
    Ok(rows)
}

fn parse_json_array(content: &str) -> Result<Vec<Row>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| ScoutError::parse(format!("invalid JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(ScoutError::parse("expected a JSON array of objects"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(ScoutError::parse(format!("row {i} is not a JSON object"))),
        })
        .collect()
}

fn parse_json_lines(content: &str) -> Result<Vec<Row>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<Row>(line)
                .map_err(|e| ScoutError::parse(format!("line {}: {e}", n + 1)))
        })
        .collect()
}

/// Load the names in one reference table.
///
/// For JSON object rows the `column` value is taken; rows without it are
/// skipped. Names are returned as written (no case folding).
pub fn load_reference_names(path: &Path, column: &str) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ScoutError::io(path, e))?;

    if TableFormat::from_path(path) == TableFormat::Text {
        return Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect());
    }

    let items: Vec<Value> = match TableFormat::from_path(path) {
        TableFormat::JsonLines => content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str::<Value>(l))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| ScoutError::parse(format!("{}: {e}", path.display())))?,
        _ => serde_json::from_str(&content)
            .map_err(|e| ScoutError::parse(format!("{}: {e}", path.display())))?,
    };

    let mut names = Vec::with_capacity(items.len());
    let mut missing = 0usize;
    for item in items {
        let cell = match item {
            Value::Object(mut row) => row.remove(column),
            other => Some(other),
        };
        match cell {
            Some(Value::String(s)) => names.push(s),
            Some(Value::Number(n)) => names.push(n.to_string()),
            _ => missing += 1,
        }
    }
    if missing > 0 {
        warn!(path = %path.display(), column, missing, "reference rows without a name were skipped");
    }
    Ok(names)
}

/// Load all three reference tables described by the config.
///
/// An unset table is treated as empty.
#[instrument(skip_all)]
pub fn load_reference_tables(config: &ReferenceConfig) -> Result<ReferenceTables> {
    let load = |path: &Option<String>, column: &str, label: &str| -> Result<Vec<String>> {
        match path {
            Some(p) => load_reference_names(&expand_home(p)?, column),
            None => {
                warn!(table = label, "reference table not configured, using an empty table");
                Ok(Vec::new())
            }
        }
    };

    let excluded = load(&config.excluded_companies, &config.columns.excluded, "excluded")?;
    let category_a = load(&config.category_a, &config.columns.category, "category_a")?;
    let category_b = load(&config.category_b, &config.columns.category, "category_b")?;

    let tables = ReferenceTables::new(excluded, category_a, category_b);
    let (a, b) = tables.category_lens();
    info!(excluded = tables.excluded_len(), category_a = a, category_b = b, "reference tables loaded");
    Ok(tables)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write rows as a JSON array, or JSON Lines for `.jsonl`/`.ndjson`.
#[instrument(skip_all, fields(path = %path.display(), rows = rows.len()))]
pub fn write_rows(path: &Path, rows: &[Row]) -> Result<()> {
    let content = match TableFormat::from_path(path) {
        TableFormat::JsonLines => {
            let mut out = String::new();
            for row in rows {
                let line = serde_json::to_string(row)
                    .map_err(|e| ScoutError::parse(e.to_string()))?;
                out.push_str(&line);
                out.push('\n');
            }
            out
        }
        TableFormat::Json | TableFormat::Text => serde_json::to_string_pretty(rows)
            .map_err(|e| ScoutError::parse(e.to_string()))?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScoutError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| ScoutError::io(path, e))?;
    info!("results written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scout_io_test_{}.{ext}", Uuid::now_v7()))
    }

    #[test]
    fn loads_json_array_profiles() {
        let path = temp_path("json");
        std::fs::write(
            &path,
            r#"[{"title": "CTO", "companyName": "Acme"}, {"title": "CEO", "summary": null}]"#,
        )
        .unwrap();
        let rows = load_profiles(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["title"], "CEO");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn loads_json_lines_and_skips_blank_lines() {
        let path = temp_path("jsonl");
        std::fs::write(&path, "{\"title\": \"CTO\"}\n\n{\"title\": \"CEO\"}\n").unwrap();
        assert_eq!(load_profiles(&path).unwrap().len(), 2);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn non_object_rows_are_rejected() {
        let path = temp_path("json");
        std::fs::write(&path, r#"[{"title": "CTO"}, 42]"#).unwrap();
        let err = load_profiles(&path).unwrap_err();
        assert!(err.to_string().contains("row 1"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reference_names_from_objects_strings_and_text() {
        let json = temp_path("json");
        std::fs::write(
            &json,
            r#"[{"Account Name": "Acme"}, {"Other": "x"}, "Globex", {"Account Name": null}]"#,
        )
        .unwrap();
        assert_eq!(
            load_reference_names(&json, "Account Name").unwrap(),
            vec!["Acme", "Globex"]
        );

        let txt = temp_path("txt");
        std::fs::write(&txt, "Initech\n\n  Umbrella  \n").unwrap();
        assert_eq!(
            load_reference_names(&txt, "company").unwrap(),
            vec!["Initech", "Umbrella"]
        );

        let _ = std::fs::remove_file(json);
        let _ = std::fs::remove_file(txt);
    }

    #[test]
    fn unset_reference_tables_are_empty() {
        let tables = load_reference_tables(&ReferenceConfig::default()).unwrap();
        assert_eq!(tables.excluded_len(), 0);
        assert_eq!(tables.category_lens(), (0, 0));
    }

    #[test]
    fn writes_json_lines_by_extension() {
        let path = temp_path("jsonl");
        let mut row = Row::new();
        row.insert("title".into(), Value::String("CTO".into()));
        write_rows(&path, &[row.clone(), row]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert_eq!(load_profiles(&path).unwrap().len(), 2);
        let _ = std::fs::remove_file(path);
    }
}
