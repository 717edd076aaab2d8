use tokio::sync::{mpsc, oneshot};

use crate::database::{KeyValueStore, StoreError, StoreResult};
use crate::models::{PersistEvent, TaskList};

/// Storage key holding the JSON-encoded task list.
pub const TASKS_KEY: &str = "taskItems";

/// Returns `list` with `text` appended. Absent or empty text leaves it unchanged.
pub fn append(list: &[String], text: Option<&str>) -> TaskList {
    let mut next = list.to_vec();
    if let Some(text) = text.filter(|text| !text.is_empty()) {
        next.push(text.to_string());
    }
    next
}

/// Returns `list` without the element at `index`; later elements shift left.
pub fn remove_at(list: &[String], index: usize) -> StoreResult<TaskList> {
    if index >= list.len() {
        return Err(StoreError::IndexOutOfRange {
            index,
            len: list.len(),
        });
    }
    let mut next = list.to_vec();
    next.remove(index);
    Ok(next)
}

pub struct TaskStore {
    backend: Box<dyn KeyValueStore>,
}

impl TaskStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        TaskStore {
            backend: Box::new(backend),
        }
    }

    pub fn try_load(&self) -> StoreResult<TaskList> {
        match self.backend.get(TASKS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(TaskList::new()),
        }
    }

    /// Reads the stored list. Unreadable or corrupt data is logged and yields
    /// an empty list.
    pub fn load(&self) -> TaskList {
        match self.try_load() {
            Ok(list) => {
                log::info!("event=tasks_load status=ok count={}", list.len());
                list
            }
            Err(err) => {
                log::error!("event=tasks_load status=error error={err}");
                TaskList::new()
            }
        }
    }

    pub fn save(&mut self, list: &[String]) -> StoreResult<()> {
        let encoded = serde_json::to_string(list).map_err(StoreError::Encode)?;
        self.backend.set(TASKS_KEY, &encoded)
    }

    pub fn clear(&mut self) -> StoreResult<bool> {
        self.backend.remove(TASKS_KEY)
    }
}

enum WriteCommand {
    Write(TaskList),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget writer. Owns the store on a background task and applies
/// writes strictly in submission order.
pub struct Persister {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl Persister {
    /// Spawns the writer on the current tokio runtime. Outcomes of each write
    /// arrive on the returned receiver.
    pub fn spawn(store: TaskStore) -> (Self, mpsc::UnboundedReceiver<PersistEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, rx, event_tx));
        (Persister { tx }, event_rx)
    }

    pub fn submit(&self, list: TaskList) {
        if self.tx.send(WriteCommand::Write(list)).is_err() {
            log::error!("event=tasks_save status=error error=writer_stopped");
        }
    }

    /// Resolves once every write submitted before this call has been applied.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

async fn run_writer(
    mut store: TaskStore,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
    events: mpsc::UnboundedSender<PersistEvent>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Write(list) => {
                let event = match store.save(&list) {
                    Ok(()) => {
                        log::debug!("event=tasks_save status=ok count={}", list.len());
                        PersistEvent::Saved { len: list.len() }
                    }
                    Err(err) => {
                        log::error!("event=tasks_save status=error error={err}");
                        PersistEvent::Failed {
                            message: err.to_string(),
                        }
                    }
                };
                let _ = events.send(event);
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    log::debug!("event=writer_stop status=ok");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, SqliteStore};
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> TaskList {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_store_loads_empty_list() {
        let store = TaskStore::new(MemoryStore::new());
        assert!(store.load().is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn append_keeps_insertion_order() {
        let list = append(&[], Some("a"));
        let list = append(&list, Some("b"));
        let list = append(&list, Some("c"));
        assert_eq!(list, strings(&["a", "b", "c"]));
    }

    #[test]
    fn append_allows_duplicates() {
        let list = append(&strings(&["a"]), Some("a"));
        assert_eq!(list, strings(&["a", "a"]));
    }

    #[test]
    fn append_ignores_empty_and_absent_text() {
        let list = strings(&["a"]);
        assert_eq!(append(&list, Some("")), list);
        assert_eq!(append(&list, None), list);
    }

    #[test]
    fn remove_at_shifts_later_elements() {
        let list = strings(&["a", "b", "c"]);
        assert_eq!(remove_at(&list, 1).unwrap(), strings(&["a", "c"]));
        assert_eq!(remove_at(&strings(&["only"]), 0).unwrap(), TaskList::new());
    }

    #[test]
    fn remove_at_rejects_out_of_range() {
        let list = strings(&["a", "b"]);
        let err = remove_at(&list, 2).unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfRange { index: 2, len: 2 }));
        assert!(remove_at(&[], 0).is_err());
    }

    #[test]
    fn save_writes_json_array_under_fixed_key() {
        let backend = MemoryStore::new();
        let mut store = TaskStore::new(backend.clone());
        store.save(&strings(&["a", "b"])).unwrap();
        assert_eq!(
            backend.get(TASKS_KEY).unwrap().as_deref(),
            Some(r#"["a","b"]"#)
        );
    }

    #[test]
    fn corrupt_value_loads_as_empty() {
        let mut backend = MemoryStore::new();
        backend.set(TASKS_KEY, "{not json").unwrap();
        let store = TaskStore::new(backend);
        assert!(matches!(store.try_load(), Err(StoreError::Decode(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn clear_removes_stored_list() {
        let mut store = TaskStore::new(MemoryStore::new());
        store.save(&strings(&["a"])).unwrap();
        assert!(store.clear().unwrap());
        assert!(store.load().is_empty());
    }

    #[test]
    fn list_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.db");
        {
            let mut store = TaskStore::new(SqliteStore::open(&path).unwrap());
            let list = append(&store.load(), Some("x"));
            store.save(&list).unwrap();
        }
        let store = TaskStore::new(SqliteStore::open(&path).unwrap());
        assert_eq!(store.load(), strings(&["x"]));
    }

    #[tokio::test]
    async fn rapid_writes_settle_on_final_list() {
        let backend = MemoryStore::new();
        let (persister, mut events) = Persister::spawn(TaskStore::new(backend.clone()));

        let list = append(&[], Some("x"));
        persister.submit(list.clone());
        let list = append(&list, Some("y"));
        persister.submit(list.clone());
        persister.flush().await;

        let reloaded = TaskStore::new(backend).load();
        assert_eq!(reloaded, strings(&["x", "y"]));
        assert_eq!(events.recv().await, Some(PersistEvent::Saved { len: 1 }));
        assert_eq!(events.recv().await, Some(PersistEvent::Saved { len: 2 }));
    }

    #[tokio::test]
    async fn failed_write_is_reported_on_side_channel() {
        let backend = MemoryStore::new();
        backend.fail_writes(true);
        let (persister, mut events) = Persister::spawn(TaskStore::new(backend.clone()));

        let list = append(&[], Some("x"));
        persister.submit(list.clone());
        persister.flush().await;

        assert!(matches!(
            events.recv().await,
            Some(PersistEvent::Failed { .. })
        ));
        assert_eq!(list, strings(&["x"]));
        assert!(TaskStore::new(backend).load().is_empty());
    }
}
