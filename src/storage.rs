use crate::config::atomic_rename;
use crate::model::SimulationState;
use anyhow::{Context, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const SAVE_KEY: &str = "bloop_save";

/// Opaque snapshot store. A snapshot that cannot be read is the same as no snapshot.
pub trait Persistence {
    fn load(&self) -> Option<SimulationState>;
    fn save(&mut self, state: &SimulationState) -> Result<()>;
}

fn decode(raw: &str) -> Option<SimulationState> {
    match serde_json::from_str::<SimulationState>(raw) {
        Ok(st) => Some(st.normalized()),
        Err(e) => {
            warn!(error = %e, "discarding unreadable save");
            None
        }
    }
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{SAVE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Option<SimulationState> {
        match read_if_present(&self.path) {
            Ok(raw) => decode(&raw?),
            Err(e) => {
                // the first save will replace whatever is there
                warn!(path = %self.path.display(), error = %e, "save exists but cannot be read");
                None
            }
        }
    }

    fn save(&mut self, state: &SimulationState) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(state)?;
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        atomic_rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// `Ok(None)` only when there is no file yet.
fn read_if_present(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Keeps the serialized blob in memory, the same bytes a file store would write.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blob: Option<String>,
    saves: usize,
}

impl MemoryStore {
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            saves: 0,
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Option<SimulationState> {
        decode(self.blob.as_deref()?)
    }

    fn save(&mut self, state: &SimulationState) -> Result<()> {
        self.blob = Some(serde_json::to_string(state)?);
        self.saves += 1;
        Ok(())
    }
}
