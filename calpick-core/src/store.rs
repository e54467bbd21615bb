//! Persistence of selection state per (calendar, user) session.
//!
//! The store is handed the session identity explicitly; nothing here reads
//! a process-wide "current user".

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::error::{CalPickError, CalPickResult};
use crate::selection::SelectionState;

/// Identifies whose selection, for which calendar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub calendar_id: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(calendar_id: &str, user_id: &str) -> Self {
        SessionKey {
            calendar_id: calendar_id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

/// Durable storage for selection state.
pub trait SelectionStore {
    /// `Ok(None)` when nothing has been stored for this session yet.
    fn load(&self, key: &SessionKey) -> CalPickResult<Option<SelectionState>>;

    fn save(&self, key: &SessionKey, state: &SelectionState) -> CalPickResult<()>;
}

/// Stores each session as `<root>/<calendar>/<user>.json`.
pub struct FileSelectionStore {
    root: PathBuf,
}

impl FileSelectionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSelectionStore { root: root.into() }
    }

    /// Path components are slugified so ids cannot escape the store root.
    pub fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.root
            .join(path_component(&key.calendar_id, "calendar"))
            .join(format!("{}.json", path_component(&key.user_id, "user")))
    }
}

fn path_component(id: &str, fallback: &str) -> String {
    let slug = slug::slugify(id);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

impl SelectionStore for FileSelectionStore {
    fn load(&self, key: &SessionKey) -> CalPickResult<Option<SelectionState>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let state: SelectionState = serde_json::from_str(&content).map_err(|e| {
            CalPickError::Store(format!("Could not parse {}: {e}", path.display()))
        })?;

        log::info!(
            "event=selection_load module=store status=ok calendar={} types={} groups={}",
            key.calendar_id,
            state.explicit_types().len(),
            state.subscribed_groups().len()
        );

        Ok(Some(state))
    }

    fn save(&self, key: &SessionKey, state: &SelectionState) -> CalPickResult<()> {
        let path = self.path_for(key);
        let dir = path
            .parent()
            .ok_or_else(|| CalPickError::Store(format!("Invalid store path {}", path.display())))?;
        std::fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(state)?;

        // Temp file + rename: readers never observe a partial write
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &path)?;

        log::info!(
            "event=selection_save module=store status=ok calendar={} version={}",
            key.calendar_id,
            state.version()
        );

        Ok(())
    }
}

/// Pull-based write coalescing.
///
/// Records when the selection last changed; the owner asks [`Self::is_due`]
/// whenever convenient and flushes once the window has passed quietly.
/// No timers or threads are involved.
#[derive(Debug, Clone)]
pub struct WriteDebouncer {
    window: Duration,
    pending_since: Option<Instant>,
}

impl WriteDebouncer {
    pub fn new(window: Duration) -> Self {
        WriteDebouncer {
            window,
            pending_since: None,
        }
    }

    /// Note a change at `at`; restarts the quiet window.
    pub fn mark_changed(&mut self, at: Instant) {
        self.pending_since = Some(at);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.pending_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.window)
    }

    /// Save through `store` if a write is due; returns whether it wrote.
    pub fn flush_if_due(
        &mut self,
        now: Instant,
        store: &dyn SelectionStore,
        key: &SessionKey,
        state: &SelectionState,
    ) -> CalPickResult<bool> {
        if !self.is_due(now) {
            return Ok(false);
        }
        self.flush(store, key, state)?;
        Ok(true)
    }

    /// Save immediately if anything is pending, regardless of the window.
    pub fn flush(
        &mut self,
        store: &dyn SelectionStore,
        key: &SessionKey,
        state: &SelectionState,
    ) -> CalPickResult<()> {
        if self.pending_since.is_none() {
            return Ok(());
        }
        store.save(key, state)?;
        self.pending_since = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingStore {
        saves: RefCell<Vec<SelectionState>>,
    }

    impl SelectionStore for RecordingStore {
        fn load(&self, _key: &SessionKey) -> CalPickResult<Option<SelectionState>> {
            Ok(self.saves.borrow().last().cloned())
        }

        fn save(&self, _key: &SessionKey, state: &SelectionState) -> CalPickResult<()> {
            self.saves.borrow_mut().push(state.clone());
            Ok(())
        }
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(dir.path());
        let key = SessionKey::new("work", "alice");

        assert!(store.load(&key).unwrap().is_none());

        let state = SelectionState::from_parts(["Standup"], ["team"]);
        store.save(&key, &state).unwrap();

        assert_eq!(store.load(&key).unwrap(), Some(state));
        assert!(!store.path_for(&key).with_extension("json.tmp").exists());
    }

    #[test]
    fn sessions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(dir.path());

        let alice = SessionKey::new("work", "alice");
        let bob = SessionKey::new("work", "bob");
        let other_calendar = SessionKey::new("home", "alice");

        store
            .save(&alice, &SelectionState::from_parts(["Standup"], Vec::<String>::new()))
            .unwrap();

        assert!(store.load(&bob).unwrap().is_none());
        assert!(store.load(&other_calendar).unwrap().is_none());
    }

    #[test]
    fn hostile_ids_stay_inside_root() {
        let store = FileSelectionStore::new("/data");
        let path = store.path_for(&SessionKey::new("../../etc", "/passwd"));
        assert!(path.starts_with("/data"));
        assert_eq!(path, PathBuf::from("/data/etc/passwd.json"));

        let empty = store.path_for(&SessionKey::new("", "!!"));
        assert_eq!(empty, PathBuf::from("/data/calendar/user.json"));
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(dir.path());
        let key = SessionKey::new("work", "alice");
        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(store.load(&key), Err(CalPickError::Store(_))));
    }

    #[test]
    fn debouncer_waits_for_quiet_window() {
        let store = RecordingStore::default();
        let key = SessionKey::new("work", "alice");
        let state = SelectionState::from_parts(["Standup"], Vec::<String>::new());
        let mut debouncer = WriteDebouncer::new(Duration::from_millis(500));
        let t0 = Instant::now();

        assert!(!debouncer.flush_if_due(t0, &store, &key, &state).unwrap());

        debouncer.mark_changed(t0);
        debouncer.mark_changed(t0 + Duration::from_millis(300));
        let early = t0 + Duration::from_millis(600);
        assert!(!debouncer.flush_if_due(early, &store, &key, &state).unwrap());

        let late = t0 + Duration::from_millis(800);
        assert!(debouncer.flush_if_due(late, &store, &key, &state).unwrap());
        assert!(!debouncer.is_due(late + Duration::from_secs(10)));
        assert_eq!(store.saves.borrow().len(), 1);
    }

    #[test]
    fn explicit_flush_ignores_window() {
        let store = RecordingStore::default();
        let key = SessionKey::new("work", "alice");
        let state = SelectionState::new();
        let mut debouncer = WriteDebouncer::new(Duration::from_secs(60));

        debouncer.flush(&store, &key, &state).unwrap();
        assert!(store.saves.borrow().is_empty());

        debouncer.mark_changed(Instant::now());
        debouncer.flush(&store, &key, &state).unwrap();
        assert_eq!(store.saves.borrow().len(), 1);
    }
}
