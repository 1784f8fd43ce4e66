//! In-memory store used by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::{
    api::{ApiError, Operation, ResourceStore},
    models::Resource,
};

pub(crate) struct FakeStore<R: Resource> {
    records: Mutex<Vec<R>>,
    failure: Mutex<Option<(u16, Option<String>)>>,
    writes: AtomicUsize,
}

impl<R: Resource> FakeStore<R> {
    pub(crate) fn new(records: Vec<R>) -> Self {
        Self {
            records: Mutex::new(records),
            failure: Mutex::new(None),
            writes: AtomicUsize::new(0),
        }
    }

    /// Make the next call answer with `status` and an optional `message` body.
    pub(crate) fn fail_next(&self, status: u16, message: Option<&str>) {
        *self.failure.lock() = Some((status, message.map(str::to_string)));
    }

    /// Create, update and delete calls received so far.
    pub(crate) fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn take_failure(&self, operation: Operation) -> Result<(), ApiError> {
        match self.failure.lock().take() {
            Some((status, message)) => {
                let body = match message {
                    Some(message) => json!({ "message": message }).to_string(),
                    None => String::new(),
                };
                Err(ApiError::from_status(
                    status,
                    body.as_bytes(),
                    &operation.fallback(R::KIND),
                ))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for FakeStore<R> {
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        self.take_failure(Operation::Load)?;
        Ok(self.records.lock().clone())
    }

    async fn get(&self, key: &R::Key) -> Option<R> {
        self.take_failure(Operation::Fetch).ok()?;
        self.records
            .lock()
            .iter()
            .find(|record| &record.key() == key)
            .cloned()
    }

    async fn create(&self, record: &R) -> Result<R, ApiError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.take_failure(Operation::Create)?;
        self.records.lock().push(record.clone());
        Ok(record.clone())
    }

    async fn update(&self, key: &R::Key, record: &R) -> Result<R, ApiError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.take_failure(Operation::Update)?;
        let mut records = self.records.lock();
        match records.iter_mut().find(|existing| &existing.key() == key) {
            Some(existing) => {
                *existing = record.clone();
                Ok(record.clone())
            }
            None => Err(ApiError::from_status(
                404,
                b"",
                &Operation::Update.fallback(R::KIND),
            )),
        }
    }

    async fn delete(&self, key: &R::Key) -> Result<(), ApiError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.take_failure(Operation::Delete)?;
        self.records.lock().retain(|record| &record.key() != key);
        Ok(())
    }
}
