//! REST access to the racing-event API.

mod client;
mod error;

use async_trait::async_trait;

use crate::models::Resource;

pub use client::{decode_collection, ApiClient};
pub use error::{ApiError, Operation, MALFORMED_PAYLOAD_MESSAGE};

/// CRUD operations over one resource collection.
///
/// [`ApiClient`] implements this for every record type; tests substitute an
/// in-memory store.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// Fetch the whole collection in server order.
    async fn list(&self) -> Result<Vec<R>, ApiError>;

    /// Fetch one record; any failure is reported as `None`.
    async fn get(&self, key: &R::Key) -> Option<R>;

    /// Create a record and return the server's copy.
    async fn create(&self, record: &R) -> Result<R, ApiError>;

    /// Replace the record stored under `key` and return the server's copy.
    async fn update(&self, key: &R::Key, record: &R) -> Result<R, ApiError>;

    /// Delete the record stored under `key`.
    async fn delete(&self, key: &R::Key) -> Result<(), ApiError>;
}
