// src/links.rs
//
// Small persisted key→URL table mapping each plot id to a permalink of the
// driver source that produced it; the typeset paper resolves citation links
// through it. Also home to the generic binary state-file helpers used to
// persist diagnostic series between the data and figure phases.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::current_commit;
use crate::error::Result;

/// Repository the permalinks point into.
pub const PAPER_REPO_URL: &str = "https://github.com/astro-fv/mhd-analysis";

/// Write any serde-serializable value as a compact binary state file.
pub fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    bincode::serialize_into(BufWriter::new(file), value)?;
    Ok(())
}

/// Read a value previously written with `save_bin`.
pub fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LinkTable {
    entries: BTreeMap<String, String>,
}

impl LinkTable {
    pub fn load(path: &Path) -> Result<Self> {
        load_bin(path)
    }

    /// Load the table, or start from an empty one if the file does not
    /// exist yet (the first plot of a fresh checkout creates it).
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(err) => {
                warn!("link table {}: {err}; starting empty", path.display());
                Self::default()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or overwrite one entry. Safe without locking: each key
    /// belongs to exactly one driver and drivers run serially.
    pub fn set(&mut self, key: impl Into<String>, url: impl Into<String>) {
        self.entries.insert(key.into(), url.into());
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_bin(path, self)
    }
}

/// Permalink to a source file at the current revision. Falls back to the
/// default branch when not running inside a git checkout.
pub fn permalink(source_path: &str) -> String {
    let rev = current_commit().unwrap_or_else(|| {
        warn!("no git commit available, linking '{source_path}' at main");
        "main".to_string()
    });
    format!("{PAPER_REPO_URL}/blob/{rev}/{source_path}")
}

/// Record that `key`'s figure was (re)generated by `source_path`: load the
/// table, overwrite the one entry, write the whole table back.
pub fn update_plot_entry(table_path: &Path, key: &str, source_path: &str) -> Result<()> {
    let mut table = LinkTable::load_or_default(table_path);
    table.set(key, permalink(source_path));
    table.save(table_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_the_stored_url() {
        let mut table = LinkTable::default();
        table.set("a", "u1");
        assert_eq!(table.get("a"), Some("u1"));
    }

    #[test]
    fn missing_key_is_none_not_a_panic() {
        let table = LinkTable::default();
        assert_eq!(table.get("missing_key"), None);
    }

    #[test]
    fn overwriting_a_key_keeps_the_latest_url() {
        let mut table = LinkTable::default();
        table.set("otv", "u1");
        table.set("otv", "u2");
        assert_eq!(table.get("otv"), Some("u2"));
    }

    #[test]
    fn table_survives_a_save_load_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("links.bin");

        let mut table = LinkTable::default();
        table.set("afl", "https://example.org/afl");
        table.save(&path).expect("save");

        let back = LinkTable::load(&path).expect("load");
        assert_eq!(back.get("afl"), Some("https://example.org/afl"));
    }

    #[test]
    fn permalink_points_into_the_paper_repo() {
        let url = permalink("src/bin/blast_wave.rs");
        assert!(url.starts_with(PAPER_REPO_URL));
        assert!(url.ends_with("src/bin/blast_wave.rs"));
    }
}
