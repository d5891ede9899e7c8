use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::Record;

/// Ordered in-memory collection shared by the REST and MCP routers.
///
/// Every operation takes the lock for its whole duration, so mutations
/// never interleave even on a multi-threaded runtime.
pub struct RecordStore<R> {
    records: RwLock<Vec<R>>,
}

impl<R: Record> RecordStore<R> {
    pub fn new(seed: Vec<R>) -> Self {
        RecordStore {
            records: RwLock::new(seed),
        }
    }

    /// All records in insertion order.
    pub async fn list(&self) -> Vec<R> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Result<R, StoreError> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| not_found::<R>(id))
    }

    /// Assign the next id and insert at the end.
    ///
    /// The id is `count + 1`, bumped past any id already taken.
    pub async fn append(&self, mut record: R) -> R {
        let mut records = self.records.write().await;
        let mut next = records.len() + 1;
        while records.iter().any(|r| r.id() == next.to_string()) {
            next += 1;
        }
        record.set_id(next.to_string());
        records.push(record.clone());
        tracing::debug!(collection = R::COLLECTION, id = %record.id(), "record appended");
        record
    }

    /// Apply `patch` to the record with `id` and return the result.
    pub async fn update<F>(&self, id: &str, patch: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut R),
    {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| not_found::<R>(id))?;
        patch(record);
        Ok(record.clone())
    }
}

fn not_found<R: Record>(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: R::KIND,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;
    use crate::record::today;
    use crate::task::{StatusPatch, Task};
    use serde_json::json;

    fn note(title: &str) -> Note {
        Note::from_input(&json!({ "title": title }), today()).unwrap()
    }

    #[tokio::test]
    async fn test_append_assigns_count_plus_one() {
        let store = RecordStore::new(Note::seed(today()));
        let created = store.append(note("X")).await;
        assert_eq!(created.id, "4");
        assert_eq!(store.len().await, 4);
        assert_eq!(store.list().await.last().unwrap().title, "X");
    }

    #[tokio::test]
    async fn test_append_skips_taken_ids() {
        let mut seeded = note("seeded");
        seeded.id = "2".into();
        let store = RecordStore::new(vec![seeded]);
        let created = store.append(note("next")).await;
        assert_eq!(created.id, "3");
    }

    #[tokio::test]
    async fn test_get_and_not_found() {
        let store = RecordStore::new(Note::seed(today()));
        assert_eq!(store.get("2").await.unwrap().id, "2");
        let err = store.get("9").await.unwrap_err();
        assert_eq!(err.to_string(), "note 9 not found");
    }

    #[tokio::test]
    async fn test_update_mutates_in_place() {
        let store = RecordStore::new(Task::seed(today()));
        let patch = StatusPatch { completed: true };
        let updated = store.update("1", |t| patch.apply(t)).await.unwrap();
        assert!(updated.completed);
        assert!(store.get("1").await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_update_unknown_id_leaves_store_untouched() {
        let store = RecordStore::new(Task::seed(today()));
        let before = store.list().await;
        let err = store
            .update("9", |t| StatusPatch { completed: true }.apply(t))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "task", .. }));
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store: RecordStore<Task> = RecordStore::new(Vec::new());
        assert!(store.is_empty().await);
        assert_eq!(store.append(Task::seed(today()).remove(0)).await.id, "1");
    }
}
