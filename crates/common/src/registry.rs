//! Worker registry and round-robin cursor
//!
//! The registry is an insertion-ordered list of [`WorkerRecord`]s plus the
//! dispatch cursor. A node owns exactly one registry, held by a dedicated
//! task; handlers reach it through a cloneable [`RegistryHandle`], so every
//! `register` and `next_target` call is serialized by the owner.

use crate::error::{HiveError, Result};
use crate::metrics::METRICS;
use hive_proto::RegisterRequest;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 256;

/// A worker known to a command node. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: String,
    pub url: String,
}

impl WorkerRecord {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

impl From<RegisterRequest> for WorkerRecord {
    fn from(req: RegisterRequest) -> Self {
        Self {
            id: req.id,
            url: req.url,
        }
    }
}

impl From<WorkerRecord> for RegisterRequest {
    fn from(record: WorkerRecord) -> Self {
        Self {
            id: record.id,
            url: record.url,
        }
    }
}

/// Outcome of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new record was appended
    Added,

    /// The id was already known; nothing changed
    Duplicate,
}

/// Ordered worker set with its dispatch cursor
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<WorkerRecord>,
    cursor: u64,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated from a seed, duplicates dropped
    pub fn with_seed(seed: impl IntoIterator<Item = WorkerRecord>) -> Self {
        let mut registry = Self::new();
        for record in seed {
            registry.register(record);
        }
        registry
    }

    /// Append a record unless its id is already present
    pub fn register(&mut self, record: WorkerRecord) -> Registration {
        if self.records.iter().any(|r| r.id == record.id) {
            return Registration::Duplicate;
        }
        self.records.push(record);
        Registration::Added
    }

    /// Select `records[cursor % len]` and advance the cursor.
    ///
    /// Returns `None` without touching the cursor when the registry is empty.
    pub fn next_target(&mut self) -> Option<WorkerRecord> {
        if self.records.is_empty() {
            return None;
        }
        let index = (self.cursor % self.records.len() as u64) as usize;
        self.cursor = self.cursor.wrapping_add(1);
        Some(self.records[index].clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current cursor value
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn records(&self) -> &[WorkerRecord] {
        &self.records
    }
}

enum Command {
    Register {
        record: WorkerRecord,
        reply: oneshot::Sender<Registration>,
    },
    NextTarget {
        reply: oneshot::Sender<Option<WorkerRecord>>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<WorkerRecord>>,
    },
}

/// Cloneable access to a registry owned by its own task
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<Command>,
}

impl RegistryHandle {
    /// Spawn the owner task for `registry` and return a handle to it.
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn(registry: Registry) -> Self {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run_registry(registry, receiver));
        Self { sender }
    }

    /// Register a worker
    pub async fn register(&self, record: WorkerRecord) -> Result<Registration> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Register { record, reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    /// Next round-robin target, `None` when no worker is registered
    pub async fn next_target(&self) -> Result<Option<WorkerRecord>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::NextTarget { reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    /// Copy of the current records in insertion order
    pub async fn snapshot(&self) -> Result<Vec<WorkerRecord>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.sender.send(command).await.map_err(|_| stopped())
    }
}

fn stopped() -> HiveError {
    HiveError::internal("registry task stopped")
}

async fn run_registry(mut registry: Registry, mut receiver: mpsc::Receiver<Command>) {
    METRICS.registry_ops.registered_workers.set(registry.len() as i64);

    while let Some(command) = receiver.recv().await {
        match command {
            Command::Register { record, reply } => {
                let outcome = registry.register(record);
                match outcome {
                    Registration::Added => {
                        METRICS.registry_ops.registrations_total.inc();
                        METRICS.registry_ops.registered_workers.set(registry.len() as i64);
                    }
                    Registration::Duplicate => {
                        METRICS.registry_ops.duplicate_registrations_total.inc();
                    }
                }
                let _ = reply.send(outcome);
            }
            Command::NextTarget { reply } => {
                let _ = reply.send(registry.next_target());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(registry.records().to_vec());
            }
        }
    }

    debug!("Registry task exiting");
}

/// Load the registry seed file, creating it as an empty list when absent.
///
/// The seed is read once at startup and never rewritten afterwards.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<Vec<WorkerRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::write(path, "[]")?;
        info!("Created empty registry seed at {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let records: Vec<WorkerRecord> = serde_json::from_str(&content)?;
    info!("Loaded {} seed worker(s) from {}", records.len(), path.display());
    Ok(records)
}
