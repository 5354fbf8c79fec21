// 📥 Task Records - Input side of the ranking
// Tabulación task exports as the dashboards hand them over: CSV, JSON or plain text

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One tabulación task. Only the free-text name matters for ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Passthrough identifier (not used for ranking)
    #[serde(default, alias = "ID", alias = "Id")]
    pub id: Option<String>,

    /// Free-text task name, as typed by the operator
    #[serde(
        default,
        alias = "Name",
        alias = "nombre",
        alias = "Nombre",
        alias = "task_name"
    )]
    pub name: Option<String>,
}

impl TaskRecord {
    pub fn new(name: &str) -> Self {
        TaskRecord {
            id: None,
            name: Some(name.to_string()),
        }
    }

    /// Builder pattern: add identifier
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Task name, empty when missing
    pub fn raw_text(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// JSON accepts full objects or bare strings
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRecord {
    Text(String),
    Record(TaskRecord),
}

// ============================================================================
// LOADERS
// ============================================================================

/// Load records from a CSV file with a header row
pub fn load_csv(csv_path: &Path) -> Result<Vec<TaskRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut records = Vec::new();

    for (line_num, result) in rdr.deserialize().enumerate() {
        let record: TaskRecord = result.with_context(|| {
            format!(
                "Failed to parse CSV line {} in {}",
                line_num + 2,
                csv_path.display()
            )
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load records from a JSON array (objects or strings)
pub fn load_json(json_path: &Path) -> Result<Vec<TaskRecord>> {
    let content = fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read JSON file: {}", json_path.display()))?;

    let raw: Vec<JsonRecord> =
        serde_json::from_str(&content).context("Failed to parse task records JSON")?;

    Ok(raw
        .into_iter()
        .map(|record| match record {
            JsonRecord::Text(name) => TaskRecord::new(&name),
            JsonRecord::Record(record) => record,
        })
        .collect())
}

/// Load one task name per line
pub fn load_text(text_path: &Path) -> Result<Vec<TaskRecord>> {
    let content = fs::read_to_string(text_path)
        .with_context(|| format!("Failed to read text file: {}", text_path.display()))?;

    Ok(content.lines().map(TaskRecord::new).collect())
}

/// Pick a loader from the file extension
pub fn load_records(path: &Path) -> Result<Vec<TaskRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "txt" => load_text(path),
        _ => bail!(
            "Unsupported task file (expected .csv, .json or .txt): {}",
            path.display()
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_raw_text_defaults_to_empty() {
        assert_eq!(TaskRecord::default().raw_text(), "");
        assert_eq!(TaskRecord::new("tab.abono").with_id("7").raw_text(), "tab.abono");
    }

    #[test]
    fn test_load_csv_with_missing_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "tareas.csv",
            "id,name,estado\n1,tab.abono 2,cerrada\n2,,abierta\n3,TAB.ABONO,cerrada\n",
        );

        let records = load_csv(&path).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].raw_text(), "tab.abono 2");
        assert_eq!(records[1].name, None);
        assert_eq!(records[1].raw_text(), "");
        assert_eq!(records[2].id.as_deref(), Some("3"));
    }

    #[test]
    fn test_load_csv_spanish_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "tareas.csv", "nombre\ntab.portacancelada\n");

        let records = load_csv(&path).unwrap();
        assert_eq!(records, vec![TaskRecord::new("tab.portacancelada")]);
    }

    #[test]
    fn test_load_json_mixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "tareas.json",
            r#"["tab.abono", {"id": "9", "name": "tap.abono v2"}, {"name": null}, {}]"#,
        );

        let records = load_json(&path).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].raw_text(), "tab.abono");
        assert_eq!(records[1].id.as_deref(), Some("9"));
        assert_eq!(records[2].raw_text(), "");
        assert_eq!(records[3].raw_text(), "");
    }

    #[test]
    fn test_load_records_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write(&dir, "tareas.txt", "tab.abono\n\nTicket - tab.soportefanftth\n");
        let other = write(&dir, "tareas.xml", "<x/>");

        assert_eq!(load_records(&txt).unwrap().len(), 3);
        assert!(load_records(&other).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_records(Path::new("/no/such/tareas.csv")).is_err());
    }
}
