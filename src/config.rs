use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of the configuration record the indexer leaves next to its outputs.
pub const CONFIG_FILE: &str = "config.json";

/// What the searcher needs to know about the last indexer run: where the
/// corpus lives and where the index files were written. The searcher takes
/// dictionary and postings paths on its own command line; the corpus
/// directory and the norms file come from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub dir_doc: PathBuf,
    pub dict_path: PathBuf,
    pub postings_path: PathBuf,
    pub lengths_path: PathBuf,
}

impl SearchConfig {
    pub fn save(&self, work_dir: &Path) -> Result<(), Error> {
        let path = work_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, json)?;
        Ok(())
    }

    pub fn load(work_dir: &Path) -> Result<Self, Error> {
        let path = work_dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).map_err(|e| Error::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&json).map_err(|e| Error::Config {
            path,
            message: e.to_string(),
        })
    }
}
