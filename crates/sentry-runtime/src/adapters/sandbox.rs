//! Local sandbox backed by a JSON file.
//!
//! Holds the rule lists, durable tables and both IP set scopes that the
//! in-memory adapters serve during one invocation. A missing file starts
//! empty. Saving writes a sibling temp file and renames it over the target.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use ns_01_blocklist_rotation::{
    BlockRecord, BlocklistScope, InMemoryIpSet, InMemoryRuleList, InMemoryStateStore,
    IpSetSnapshot, RuleListSnapshot,
};

/// Sandbox persistence errors.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Filesystem failure.
    #[error("Sandbox I/O on {path:?}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// File content is not a sandbox document.
    #[error("Sandbox format in {path:?}: {source}")]
    Format {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxState {
    /// Subnet associations and rule entries.
    #[serde(default)]
    pub network: RuleListSnapshot,
    /// Durable tables by name.
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<BlockRecord>>,
    /// Edge IP sets by id.
    #[serde(default)]
    pub edge_ip_sets: IpSetSnapshot,
    /// Regional IP sets by id.
    #[serde(default)]
    pub regional_ip_sets: IpSetSnapshot,
}

/// Live sandbox: in-memory backends plus the file they came from.
pub struct Sandbox {
    path: PathBuf,
    table: String,
    other_tables: BTreeMap<String, Vec<BlockRecord>>,
    /// Rule-list backend.
    pub rules: Arc<InMemoryRuleList>,
    /// Durable table `table`.
    pub store: Arc<InMemoryStateStore>,
    /// Edge IP set backend.
    pub edge: Arc<InMemoryIpSet>,
    /// Regional IP set backend.
    pub regional: Arc<InMemoryIpSet>,
}

impl Sandbox {
    /// Build backends from a document, serving durable table `table`.
    pub fn from_state(path: impl Into<PathBuf>, table: &str, state: SandboxState) -> Self {
        let SandboxState {
            network,
            mut tables,
            edge_ip_sets,
            regional_ip_sets,
        } = state;
        let records = tables.remove(table).unwrap_or_default();

        Self {
            path: path.into(),
            table: table.to_string(),
            other_tables: tables,
            rules: Arc::new(InMemoryRuleList::from_snapshot(network)),
            store: Arc::new(InMemoryStateStore::with_records(records)),
            edge: Arc::new(InMemoryIpSet::from_snapshot(BlocklistScope::Edge, edge_ip_sets)),
            regional: Arc::new(InMemoryIpSet::from_snapshot(
                BlocklistScope::Regional,
                regional_ip_sets,
            )),
        }
    }

    /// Load `path`; a missing file yields an empty sandbox.
    pub fn load(path: impl AsRef<Path>, table: &str) -> Result<Self, SandboxError> {
        let path = path.as_ref();
        let state = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| SandboxError::Format {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = ?path, "Sandbox file not found, starting empty");
                SandboxState::default()
            }
            Err(source) => {
                return Err(SandboxError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        debug!(path = ?path, table, "Sandbox loaded");
        Ok(Self::from_state(path, table, state))
    }

    /// Current document.
    pub fn state(&self) -> SandboxState {
        let mut tables = self.other_tables.clone();
        tables.insert(self.table.clone(), self.store.all_records());
        SandboxState {
            network: self.rules.snapshot(),
            tables,
            edge_ip_sets: self.edge.snapshot(),
            regional_ip_sets: self.regional.snapshot(),
        }
    }

    /// Write the current document back to the file.
    pub fn save(&self) -> Result<(), SandboxError> {
        let body = serde_json::to_string_pretty(&self.state()).map_err(|source| {
            SandboxError::Format {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body).map_err(|source| SandboxError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| SandboxError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = ?self.path, "Sandbox saved");
        Ok(())
    }

    /// File backing this sandbox.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
