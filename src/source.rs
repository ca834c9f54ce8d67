//! Reading pipeline inputs from plain files or zip archives

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| PipelineError::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Pick the first archive entry whose name ends with one of `extensions`.
pub fn extract_entry(archive_bytes: &[u8], extensions: &[&str], path: &Path) -> Result<String> {
    let archive_err = |reason: String| PipelineError::Archive {
        path: path.to_path_buf(),
        reason,
    };

    let mut archive =
        ZipArchive::new(Cursor::new(archive_bytes)).map_err(|e| archive_err(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| archive_err(e.to_string()))?;
        let name = entry.name().to_string();
        if entry.is_dir() || name.starts_with("__MACOSX/") {
            continue;
        }
        let lower = name.to_ascii_lowercase();
        if !extensions.iter().any(|ext| lower.ends_with(ext)) {
            continue;
        }

        debug!("Reading {} from archive {:?}", name, path);
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| archive_err(format!("{}: {}", name, e)))?;
        return Ok(text);
    }

    Err(archive_err(format!(
        "no entry with extension {}",
        extensions.join(" or ")
    )))
}

/// One input file, read once. Parsing and fingerprinting both work from these
/// bytes.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl RawSource {
    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            bytes: read_bytes(path)?,
        })
    }

    /// Contents as text, unpacking the archive first when the path is a `.zip`.
    pub fn text(&self, extensions: &[&str]) -> Result<String> {
        if is_zip(&self.path) {
            return extract_entry(&self.bytes, extensions, &self.path);
        }
        String::from_utf8(self.bytes.clone()).map_err(|e| PipelineError::Archive {
            path: self.path.clone(),
            reason: format!("not valid UTF-8: {}", e),
        })
    }
}

/// Read a source as text, unpacking it first when it is a `.zip`.
pub fn read_text(path: &Path, extensions: &[&str]) -> Result<String> {
    RawSource::read(path)?.text(extensions)
}

/// All four pipeline inputs as captured in one pass
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub orders: RawSource,
    pub districts: RawSource,
    pub city_outline: RawSource,
    pub okruga: RawSource,
}

impl SourceSnapshot {
    pub fn read(config: &PipelineConfig) -> Result<Self> {
        let snapshot = Self {
            orders: RawSource::read(&config.orders_path)?,
            districts: RawSource::read(&config.districts_path)?,
            city_outline: RawSource::read(&config.city_outline_path)?,
            okruga: RawSource::read(&config.okruga_path)?,
        };
        debug!("Read {} source bytes", snapshot.sources().map(|s| s.bytes.len()).sum::<usize>());
        Ok(snapshot)
    }

    /// Sources in a fixed order: orders, districts, city outline, okruga
    pub fn sources(&self) -> impl Iterator<Item = &RawSource> {
        [&self.orders, &self.districts, &self.city_outline, &self.okruga].into_iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    pub(crate) fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_matching_entry() {
        let bytes = zip_with(&[
            ("__MACOSX/orders.csv", "junk"),
            ("readme.txt", "hello"),
            ("orders.CSV", "id\n1\n"),
        ]);
        let text = extract_entry(&bytes, &[".csv"], Path::new("orders.csv.zip")).unwrap();
        assert_eq!(text, "id\n1\n");
    }

    #[test]
    fn test_missing_entry_is_archive_error() {
        let bytes = zip_with(&[("readme.txt", "hello")]);
        let err = extract_entry(&bytes, &[".geojson"], Path::new("d.zip")).unwrap_err();
        assert!(matches!(err, PipelineError::Archive { .. }));
    }

    #[test]
    fn test_read_text_plain_and_zipped() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("orders.csv");
        std::fs::write(&plain, "id\n7\n").unwrap();
        assert_eq!(read_text(&plain, &[".csv"]).unwrap(), "id\n7\n");

        let zipped = dir.path().join("orders.csv.zip");
        std::fs::write(&zipped, zip_with(&[("orders.csv", "id\n8\n")])).unwrap();
        assert_eq!(read_text(&zipped, &[".csv"]).unwrap(), "id\n8\n");

        let missing = dir.path().join("nope.csv");
        assert!(matches!(read_text(&missing, &[".csv"]), Err(PipelineError::Load { .. })));
    }

    #[test]
    fn test_raw_source_keeps_bytes_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, "id\n1\n").unwrap();

        let source = RawSource::read(&path).unwrap();
        std::fs::write(&path, "id\n2\n").unwrap();
        assert_eq!(source.text(&[".csv"]).unwrap(), "id\n1\n");
    }
}
