use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::parse::{parse_csv, parse_json};
use super::record::TransactionRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    pub fn from_name(name: &str) -> Self {
        let is_json = Path::new(name)
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        if is_json { Self::Json } else { Self::Csv }
    }
}

/// A successfully ingested file: its display name and the records it held.
#[derive(Clone, Debug)]
pub struct LoadedFile {
    pub name: String,
    pub records: Vec<TransactionRecord>,
}

pub fn load_file(path: &Path) -> Result<LoadedFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    load_bytes(&name, &bytes)
}

pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<LoadedFile> {
    let format = SourceFormat::from_name(name);
    let records = match format {
        SourceFormat::Csv => parse_csv(bytes),
        SourceFormat::Json => parse_json(bytes),
    }
    .with_context(|| format!("failed to parse {name} as {format:?}"))?;

    if records.is_empty() {
        return Err(anyhow!("{name} contains no transaction rows"));
    }

    log::info!("loaded {} transaction records from {name}", records.len());
    Ok(LoadedFile {
        name: name.to_owned(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(SourceFormat::from_name("export.json"), SourceFormat::Json);
        assert_eq!(SourceFormat::from_name("EXPORT.JSON"), SourceFormat::Json);
        assert_eq!(SourceFormat::from_name("export.csv"), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_name("export"), SourceFormat::Csv);
    }

    #[test]
    fn empty_file_is_an_ingestion_error() {
        let error = load_bytes("empty.csv", b"Destination,Amount\n").unwrap_err();
        assert!(error.to_string().contains("no transaction rows"));
    }

    #[test]
    fn malformed_json_carries_file_context() {
        let error = load_bytes("broken.json", b"[{").unwrap_err();
        assert!(format!("{error:#}").contains("broken.json"));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(load_file(Path::new("/definitely/not/here.csv")).is_err());
    }

    #[test]
    fn bytes_load_keeps_name() {
        let loaded = load_bytes("drop.csv", b"Destination,Amount\nB,1\n").unwrap();
        assert_eq!(loaded.name, "drop.csv");
        assert_eq!(loaded.records.len(), 1);
    }
}
