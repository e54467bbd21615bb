use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use calpick_core::catalog::CatalogSnapshot;
use calpick_core::config::CalpickConfig;
use calpick_core::selection::SelectionState;
use calpick_core::store::{FileSelectionStore, SelectionStore, SessionKey, WriteDebouncer};

/// One user's selection for one calendar, plus the catalog it refers to.
pub struct Session {
    pub config: CalpickConfig,
    pub catalog: CatalogSnapshot,
    pub key: SessionKey,
    pub state: SelectionState,
    store: FileSelectionStore,
    debouncer: WriteDebouncer,
}

impl Session {
    pub fn open(
        config: CalpickConfig,
        catalog_path: &Path,
        calendar: Option<String>,
        user: Option<String>,
    ) -> Result<Self> {
        let catalog = CatalogSnapshot::load(catalog_path).with_context(|| {
            format!(
                "Could not load catalog '{}'.\n\
                 Pass a snapshot exported by the feed importer with --catalog <path>",
                catalog_path.display()
            )
        })?;

        let calendar_id = calendar.unwrap_or_else(|| calendar_id_from_path(catalog_path));
        let user_id = user.unwrap_or_else(|| config.default_user.clone());
        let key = SessionKey::new(&calendar_id, &user_id);

        let store = FileSelectionStore::new(config.data_path());
        let state = store.load(&key)?.unwrap_or_default();
        let debouncer = WriteDebouncer::new(config.selection_debounce());

        Ok(Session {
            config,
            catalog,
            key,
            state,
            store,
            debouncer,
        })
    }

    /// Apply a mutation and schedule a write if it changed anything.
    ///
    /// The write happens here once the debounce window has passed, otherwise
    /// on [`Session::close`].
    pub fn mutate(&mut self, f: impl FnOnce(&mut SelectionState)) -> Result<()> {
        let before = self.state.version();
        f(&mut self.state);
        if self.state.version() == before {
            return Ok(());
        }

        let now = Instant::now();
        self.debouncer.mark_changed(now);
        self.debouncer
            .flush_if_due(now, &self.store, &self.key, &self.state)
            .context("Could not save selection")?;
        Ok(())
    }

    /// Flush pending changes. A CLI run ends here, so the window is not awaited.
    pub fn close(mut self) -> Result<()> {
        self.debouncer
            .flush(&self.store, &self.key, &self.state)
            .context("Could not save selection")?;
        Ok(())
    }
}

fn calendar_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "calendar".to_string())
}
