//! Mount configuration.
//!
//! Mount configurations are JSON objects like:
//! ```json
//! {"prefix": "assets", "type": "http", "url": "https://cdn.example.com/assets/"}
//! {"prefix": "assets", "type": "http", "url": "https://cdn.example.com/", "timeout_secs": 10}
//! {"prefix": "scratch", "type": "memory"}
//! {"prefix": "etc", "type": "memory", "files": {"config.prc": "load-display gl"}}
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use remotefs_core::Error;

use crate::kind::MountKind;
use crate::table::MountTable;

/// Configuration for a single mount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MountConfig {
    /// Read-only tree beneath an HTTP(S) URL
    Http {
        url: String,
        /// Per-request timeout; the transport default applies when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_agent: Option<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
    },
    /// In-memory tree, seeded with text files keyed by path
    Memory {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        files: BTreeMap<String, String>,
    },
}

/// A mount configuration and where to put it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MountEntry {
    pub prefix: String,
    #[serde(flatten)]
    pub config: MountConfig,
}

/// A whole mount table, in mount order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MountTableConfig {
    #[serde(default)]
    pub mounts: Vec<MountEntry>,
}

impl MountTableConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Config {
            message: format!("mount table: {}", e),
        })
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config {
            message: format!("mount table: {}", e),
        })
    }

    /// Construct every mount and register it in a new table.
    ///
    /// Fails on the first entry that cannot be built; nothing is mounted in
    /// that case.
    pub fn build(&self) -> Result<MountTable, Error> {
        let table = MountTable::new();
        for entry in &self.mounts {
            let mount = MountKind::from_config(&entry.config)?;
            table.mount(&entry.prefix, mount)?;
        }
        Ok(table)
    }
}
