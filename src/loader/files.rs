use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::{MetagameError, MetagameResult, parse_context, write_context};

/// Output directory for JSON reports
pub struct JsonStore {
    output_dir: PathBuf,
}

impl JsonStore {
    /// Create a new store, creating the directory if needed
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();

        fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

        Ok(Self { output_dir })
    }

    /// Save data as `<key>.json`
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<PathBuf> {
        let file_path = self.build_path(key);
        let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;

        fs::write(&file_path, json).with_context(|| write_context(&file_path))?;

        info!("Saved {}", file_path.display());
        Ok(file_path)
    }

    /// Load `<key>.json` if present
    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        let file_path = self.build_path(key);

        if !file_path.exists() {
            return Ok(None);
        }

        read_json(&file_path).map(Some)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.build_path(key).exists()
    }

    fn build_path(&self, key: &str) -> PathBuf {
        self.output_dir.join(format!("{}.json", key))
    }
}

/// `*.json` files directly inside `dir`, sorted by name
pub fn list_json_files(dir: &Path) -> MetagameResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| MetagameError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_json(path))
        .collect();

    files.sort();
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn read_text(path: &Path) -> MetagameResult<String> {
    fs::read_to_string(path).map_err(|source| MetagameError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = read_text(path)?;
    let data = serde_json::from_str(&json).with_context(|| {
        format!(
            "{} from {:?}. First 200 chars: {}",
            parse_context("JSON"),
            path,
            json.chars().take(200).collect::<String>()
        )
    })?;
    Ok(data)
}
