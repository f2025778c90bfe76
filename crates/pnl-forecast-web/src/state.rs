use std::path::{Path, PathBuf};
use std::sync::Arc;

use pnl_forecast::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    store_path: Arc<PathBuf>,
}

impl AppState {
    pub fn open(store_path: PathBuf) -> anyhow::Result<Self> {
        let store = MemoryStore::open(&store_path)?;
        Ok(AppState {
            store: Arc::new(store),
            store_path: Arc::new(store_path),
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Write the current tables back to the data file.
    pub fn persist(&self) -> anyhow::Result<()> {
        self.store.save(&self.store_path)
    }
}
