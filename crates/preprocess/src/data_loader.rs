//! Review dataset loading and saving (JSON, JSONL, CSV)

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use ulasan_common::{Result, UlasanError};

/// One dataset row, keyed by column/field name in file order
pub type ReviewRecord = Map<String, Value>;

/// Extensions tried, in order, when looking up a dataset split
const SPLIT_EXTENSIONS: &[&str] = &["json", "jsonl", "csv"];

/// Default split names for [`load_dataset_splits`]
pub const DEFAULT_SPLITS: &[&str] = &["train", "val", "test"];

/// Dataset file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Detect from the file extension
    #[default]
    Auto,
    Json,
    Jsonl,
    Csv,
}

impl FileFormat {
    /// Resolve `Auto` against a path's extension
    pub fn resolve(self, path: &Path) -> Result<Self> {
        if self != Self::Auto {
            return Ok(self);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            _ => Err(UlasanError::unsupported_format(format!(
                "Cannot auto-detect format for .{} files",
                ext
            ))),
        }
    }
}

impl FromStr for FileFormat {
    type Err = UlasanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "json" => Ok(Self::Json),
            "jsonl" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            other => Err(UlasanError::unsupported_format(other.to_string())),
        }
    }
}

/// Load reviews from a JSON, JSONL or CSV file
///
/// A JSON file holding a single object yields a one-element list. Blank
/// JSONL lines are skipped. CSV cells are loaded as strings.
pub fn load_reviews(path: &Path, format: FileFormat) -> Result<Vec<ReviewRecord>> {
    if !path.exists() {
        return Err(UlasanError::not_found(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let format = format.resolve(path)?;
    debug!("Loading {:?} dataset from {}", format, path.display());

    let records = match format {
        FileFormat::Json => load_json(path)?,
        FileFormat::Jsonl => load_jsonl(path)?,
        FileFormat::Csv => load_csv(path)?,
        FileFormat::Auto => unreachable!("format resolved above"),
    };

    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn into_record(value: Value, origin: &str) -> Result<ReviewRecord> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(UlasanError::invalid_input(format!(
            "Expected a JSON object in {}, found {}",
            origin, other
        ))),
    }
}

fn load_json(path: &Path) -> Result<Vec<ReviewRecord>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let origin = path.display().to_string();

    let value: Value = serde_json::from_reader(reader)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| into_record(item, &origin))
            .collect(),
        value => Ok(vec![into_record(value, &origin)?]),
    }
}

fn load_jsonl(path: &Path) -> Result<Vec<ReviewRecord>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let origin = format!("{} line {}", path.display(), line_no + 1);
        let value: Value = serde_json::from_str(line)?;
        records.push(into_record(value, &origin)?);
    }

    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<ReviewRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let record: ReviewRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Save processed records, creating parent directories as needed
///
/// JSON is pretty-printed with non-ASCII text kept as-is. CSV takes its header
/// from the first record's keys and writes nothing when `records` is empty.
pub fn save_processed_data(records: &[ReviewRecord], path: &Path, format: FileFormat) -> Result<()> {
    let format = format.resolve(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            UlasanError::file_system(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    match format {
        FileFormat::Json => {
            let data = serde_json::to_string_pretty(records)?;
            fs::write(path, data)?;
        }
        FileFormat::Jsonl => {
            let mut writer = BufWriter::new(fs::File::create(path)?);
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        FileFormat::Csv => save_csv(records, path)?,
        FileFormat::Auto => unreachable!("format resolved above"),
    }

    info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

fn save_csv(records: &[ReviewRecord], path: &Path) -> Result<()> {
    let Some(first) = records.first() else {
        debug!("No records to write, skipping {}", path.display());
        return Ok(());
    };

    let headers: Vec<&String> = first.keys().collect();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&headers)?;

    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|key| csv_cell(record.get(key.as_str())))
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Load dataset splits (e.g. train/val/test) from a directory
///
/// For each split the first existing file among `{split}.json`,
/// `{split}.jsonl` and `{split}.csv` is loaded. Missing splits are skipped.
pub fn load_dataset_splits(
    dir: &Path,
    splits: Option<&[&str]>,
) -> Result<BTreeMap<String, Vec<ReviewRecord>>> {
    let splits = splits.unwrap_or(DEFAULT_SPLITS);
    let mut datasets = BTreeMap::new();

    for split in splits {
        let found = SPLIT_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", split, ext)))
            .find(|candidate| candidate.exists());

        match found {
            Some(path) => {
                datasets.insert(split.to_string(), load_reviews(&path, FileFormat::Auto)?);
            }
            None => debug!("Split '{}' not found in {}", split, dir.display()),
        }
    }

    Ok(datasets)
}

/// Fetch a string field from a record, treating non-strings as absent
pub fn text_field<'a>(record: &'a ReviewRecord, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> ReviewRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resolve_format_from_extension() {
        assert_eq!(FileFormat::Auto.resolve(Path::new("a/b.JSON")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::Auto.resolve(Path::new("x.jsonl")).unwrap(), FileFormat::Jsonl);
        assert_eq!(FileFormat::Auto.resolve(Path::new("x.csv")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::Csv.resolve(Path::new("x.txt")).unwrap(), FileFormat::Csv);
        assert!(matches!(
            FileFormat::Auto.resolve(Path::new("x.txt")),
            Err(UlasanError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSONL".parse::<FileFormat>().unwrap(), FileFormat::Jsonl);
        assert!("parquet".parse::<FileFormat>().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_reviews(Path::new("/nonexistent/reviews.json"), FileFormat::Auto).unwrap_err();
        assert!(matches!(err, UlasanError::NotFound(_)));
    }

    #[test]
    fn test_load_json_single_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.json");
        fs::write(&path, r#"{"id": 1, "review": "Barang bagus"}"#).unwrap();

        let records = load_reviews(&path, FileFormat::Auto).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(text_field(&records[0], "review"), Some("Barang bagus"));
    }

    #[test]
    fn test_load_json_rejects_non_objects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"review": "ok"}, 3]"#).unwrap();

        let err = load_reviews(&path, FileFormat::Auto).unwrap_err();
        assert!(matches!(err, UlasanError::InvalidInput(_)));
    }

    #[test]
    fn test_load_jsonl_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.jsonl");
        fs::write(
            &path,
            "{\"review\": \"satu\"}\n\n   \n{\"review\": \"dua\"}\n",
        )
        .unwrap();

        let records = load_reviews(&path, FileFormat::Auto).unwrap();
        let texts: Vec<_> = records.iter().filter_map(|r| text_field(r, "review")).collect();
        assert_eq!(texts, vec!["satu", "dua"]);
    }

    #[test]
    fn test_json_roundtrip_keeps_unicode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/processed.json");
        let records = vec![record(json!({"review": "mantap 😊", "rating": 5}))];

        save_processed_data(&records, &path, FileFormat::Auto).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("mantap 😊"));
        assert_eq!(load_reviews(&path, FileFormat::Auto).unwrap(), records);
    }

    #[test]
    fn test_csv_roundtrip_uses_first_record_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        let records = vec![
            record(json!({"id": "1", "review": "bagus, cepat"})),
            record(json!({"id": "2", "review": "kurang", "extra": "ignored"})),
            record(json!({"review": "tanpa id"})),
        ];

        save_processed_data(&records, &path, FileFormat::Csv).unwrap();
        let loaded = load_reviews(&path, FileFormat::Auto).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].keys().collect::<Vec<_>>(), vec!["id", "review"]);
        assert_eq!(text_field(&loaded[0], "review"), Some("bagus, cepat"));
        assert!(loaded[1].get("extra").is_none());
        assert_eq!(text_field(&loaded[2], "id"), Some(""));
    }

    #[test]
    fn test_csv_empty_data_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        save_processed_data(&[], &path, FileFormat::Auto).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_load_dataset_splits() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("train.jsonl"), "{\"review\": \"a\"}\n{\"review\": \"b\"}\n").unwrap();
        fs::write(dir.path().join("test.csv"), "review\nc\n").unwrap();

        let splits = load_dataset_splits(dir.path(), None).unwrap();
        assert_eq!(splits.len(), 2);
        assert_eq!(splits["train"].len(), 2);
        assert_eq!(splits["test"].len(), 1);
        assert!(!splits.contains_key("val"));
    }

    #[test]
    fn test_load_dataset_splits_prefers_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("val.json"), r#"[{"review": "json"}]"#).unwrap();
        fs::write(dir.path().join("val.csv"), "review\ncsv\n").unwrap();

        let splits = load_dataset_splits(dir.path(), Some(&["val"][..])).unwrap();
        assert_eq!(text_field(&splits["val"][0], "review"), Some("json"));
    }
}
