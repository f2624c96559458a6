use std::collections::HashMap;
use std::sync::RwLock;

use boxer_core::{BoxId, Entity};
use boxer_receiving::BoxRecord;

use super::r#trait::{RecordSink, SinkError};

#[derive(Debug, Default)]
struct Inner {
    boxes: Vec<BoxRecord>,
    by_id: HashMap<BoxId, usize>,
}

/// In-memory box store keyed by box identifier.
///
/// Intended for the daemon's default wiring and for tests. Not optimized for
/// performance.
#[derive(Debug, Default)]
pub struct InMemoryBoxStore {
    inner: RwLock<Inner>,
}

impl InMemoryBoxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &BoxId) -> Option<BoxRecord> {
        let inner = self.inner.read().ok()?;
        inner.by_id.get(id).map(|&idx| inner.boxes[idx].clone())
    }

    /// All accepted boxes, in the order they were submitted.
    pub fn list(&self) -> Vec<BoxRecord> {
        self.inner
            .read()
            .map(|inner| inner.boxes.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.boxes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl RecordSink for InMemoryBoxStore {
    async fn submit(&self, record: BoxRecord) -> Result<(), SinkError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| SinkError::Unavailable("lock poisoned".to_string()))?;

        let id = Entity::id(&record).clone();
        if inner.by_id.contains_key(&id) {
            return Err(SinkError::Duplicate(id.into_inner()));
        }

        let idx = inner.boxes.len();
        inner.boxes.push(record);
        inner.by_id.insert(id, idx);
        Ok(())
    }
}
