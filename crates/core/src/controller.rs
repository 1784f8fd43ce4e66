//! Generic list-resource controller.
//!
//! One [`ListController`] owns a single collection's view state: load phase,
//! search, pagination, the in-flight mutation and the transient notification.
//! Network work is split into `begin_*` / `finish_*` pairs so a frontend can
//! run requests on spawned tasks; the async helpers drive a [`ResourceStore`]
//! end to end.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{ApiError, ResourceStore},
    config::AppConfig,
    models::Resource,
    validate::ValidationError,
};

const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Where the initial fetch stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Fetch in flight.
    Loading,
    /// Collection available.
    Ready,
    /// Fetch failed; only an explicit reload leaves this state.
    Failed,
}

/// The single mutation a controller may have in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity<K> {
    /// Nothing pending.
    Idle,
    /// Create request in flight.
    Creating,
    /// Update request for this key in flight.
    Editing(K),
    /// Delete request for this key in flight.
    Deleting(K),
}

/// Colour of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

/// A transient message that expires on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Text to show.
    pub message: String,
    /// Success or error.
    pub kind: NotificationKind,
    expires_at: Instant,
}

impl Notification {
    /// Whether the notification should still be shown at `now`.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Why a controller action did not complete.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Another mutation is still in flight.
    #[error("another request is still in progress")]
    Busy,
    /// The collection is not in the `Ready` phase.
    #[error("the list is not loaded")]
    NotReady,
    /// Local validation failed; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// View state and mutation flow for one resource collection.
#[derive(Debug)]
pub struct ListController<R: Resource> {
    items: Vec<R>,
    phase: LoadPhase,
    activity: Activity<R::Key>,
    error: Option<String>,
    search: String,
    page: usize,
    page_size: usize,
    reset_page_on_search: bool,
    notification: Option<Notification>,
    notification_ttl: Duration,
}

impl<R: Resource> Default for ListController<R> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl<R: Resource> ListController<R> {
    /// Create a controller in the `Loading` phase.
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            phase: LoadPhase::Loading,
            activity: Activity::Idle,
            error: None,
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
            reset_page_on_search: false,
            notification: None,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
        }
    }

    /// Create a controller using the configured page size and timings.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.page_size)
            .with_notification_ttl(config.notification_ttl())
            .with_reset_page_on_search(config.reset_page_on_search)
    }

    /// Override how long notifications live.
    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }

    /// Choose whether search edits jump back to page 1.
    pub fn with_reset_page_on_search(mut self, reset: bool) -> Self {
        self.reset_page_on_search = reset;
        self
    }

    /// Whole collection in server order.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Current load phase.
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// In-flight mutation.
    pub fn activity(&self) -> &Activity<R::Key> {
        &self.activity
    }

    /// Most recent error message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clear the error message.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Current search text.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Current page, 1-based.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether a delete for `key` is in flight.
    pub fn is_busy(&self, key: &R::Key) -> bool {
        matches!(&self.activity, Activity::Deleting(pending) if pending == key)
    }

    /// Whether no mutation is in flight.
    pub fn is_idle(&self) -> bool {
        matches!(self.activity, Activity::Idle)
    }

    // ---- load -------------------------------------------------------------

    /// Enter `Loading`, dropping any previous error.
    pub fn begin_load(&mut self) {
        self.phase = LoadPhase::Loading;
        self.activity = Activity::Idle;
        self.error = None;
    }

    /// Apply the outcome of a collection fetch.
    pub fn finish_load(&mut self, result: Result<Vec<R>, ApiError>) -> Result<(), ActionError> {
        match result {
            Ok(items) => {
                info!(resource = R::KIND.path(), count = items.len(), "collection loaded");
                self.items = items;
                self.phase = LoadPhase::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(resource = R::KIND.path(), "load failed: {err}");
                self.items.clear();
                self.phase = LoadPhase::Failed;
                self.error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Fetch the collection through `store`.
    pub async fn load<S>(&mut self, store: &S) -> Result<(), ActionError>
    where
        S: ResourceStore<R> + ?Sized,
    {
        self.begin_load();
        let result = store.list().await;
        self.finish_load(result)
    }

    // ---- filter & paginate -----------------------------------------------

    /// Replace the search text.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.after_search_change();
    }

    /// Append one character to the search text.
    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.after_search_change();
    }

    /// Remove the last character of the search text.
    pub fn pop_search_char(&mut self) {
        if self.search.pop().is_some() {
            self.after_search_change();
        }
    }

    fn after_search_change(&mut self) {
        if self.reset_page_on_search {
            self.page = 1;
        }
    }

    /// Records matching the search, in collection order.
    pub fn filtered(&self) -> Vec<&R> {
        self.items
            .iter()
            .filter(|record| record.matches(&self.search))
            .collect()
    }

    /// Number of pages for the filtered records.
    pub fn page_count(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /// Records on the current page. Empty when the page lies past the end.
    pub fn page_items(&self) -> Vec<&R> {
        let start = (self.page - 1).saturating_mul(self.page_size);
        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    /// Jump to `page`, clamped to the available range.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count().max(1));
    }

    /// Advance one page; returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        let before = self.page;
        self.set_page(self.page + 1);
        self.page != before
    }

    /// Go back one page; returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        let before = self.page;
        self.set_page(self.page.saturating_sub(1));
        self.page != before
    }

    // ---- create -----------------------------------------------------------

    /// Validate `draft` and mark a create as in flight.
    pub fn begin_create(&mut self, draft: &R) -> Result<(), ActionError> {
        self.ensure_can_mutate()?;
        self.check(draft)?;
        self.error = None;
        self.activity = Activity::Creating;
        Ok(())
    }

    /// Apply the outcome of a create request.
    pub fn finish_create(&mut self, result: Result<R, ApiError>) -> Result<(), ActionError> {
        self.activity = Activity::Idle;
        match result {
            Ok(created) => {
                let key = created.key();
                match self.position(&key) {
                    Some(index) => self.items[index] = created,
                    None => self.items.push(created),
                }
                self.notify_success(format!("Created {} {key}", R::KIND.singular()));
                Ok(())
            }
            Err(err) => Err(self.record_failure(err)),
        }
    }

    /// Validate and create `draft` through `store`.
    pub async fn create<S>(&mut self, store: &S, draft: &R) -> Result<(), ActionError>
    where
        S: ResourceStore<R> + ?Sized,
    {
        self.begin_create(draft)?;
        let result = store.create(draft).await;
        self.finish_create(result)
    }

    // ---- update -----------------------------------------------------------

    /// Validate `draft` as the new state of `key` and mark an update in flight.
    pub fn begin_update(&mut self, key: &R::Key, draft: &R) -> Result<(), ActionError> {
        self.ensure_can_mutate()?;
        if &draft.key() != key {
            let err = ValidationError::new("key", "Key fields cannot be changed");
            self.error = Some(err.to_string());
            return Err(err.into());
        }
        self.check(draft)?;
        self.error = None;
        self.activity = Activity::Editing(key.clone());
        Ok(())
    }

    /// Apply the outcome of an update for `key`.
    pub fn finish_update(
        &mut self,
        key: &R::Key,
        result: Result<R, ApiError>,
    ) -> Result<(), ActionError> {
        self.activity = Activity::Idle;
        match result {
            Ok(updated) => {
                match self.position(key) {
                    Some(index) => self.items[index] = updated,
                    None => warn!(resource = R::KIND.path(), %key, "updated record not in list"),
                }
                self.notify_success(format!("Updated {} {key}", R::KIND.singular()));
                Ok(())
            }
            Err(err) => Err(self.record_failure(err)),
        }
    }

    /// Validate and update the record stored under `key`.
    pub async fn update<S>(&mut self, store: &S, key: &R::Key, draft: &R) -> Result<(), ActionError>
    where
        S: ResourceStore<R> + ?Sized,
    {
        self.begin_update(key, draft)?;
        let result = store.update(key, draft).await;
        self.finish_update(key, result)
    }

    // ---- delete -----------------------------------------------------------

    /// Mark `key` as being deleted. Refused while any mutation is pending.
    pub fn begin_delete(&mut self, key: &R::Key) -> Result<(), ActionError> {
        self.ensure_can_mutate()?;
        self.error = None;
        self.activity = Activity::Deleting(key.clone());
        Ok(())
    }

    /// Apply the outcome of a delete for `key`; always clears the busy marker.
    pub fn finish_delete(
        &mut self,
        key: &R::Key,
        result: Result<(), ApiError>,
    ) -> Result<(), ActionError> {
        self.activity = Activity::Idle;
        match result {
            Ok(()) => {
                self.items.retain(|record| &record.key() != key);
                self.notify_success(format!("Deleted {} {key}", R::KIND.singular()));
                Ok(())
            }
            Err(err) => Err(self.record_failure(err)),
        }
    }

    /// Delete the record stored under `key`.
    pub async fn delete<S>(&mut self, store: &S, key: &R::Key) -> Result<(), ActionError>
    where
        S: ResourceStore<R> + ?Sized,
    {
        self.begin_delete(key)?;
        let result = store.delete(key).await;
        self.finish_delete(key, result)
    }

    // ---- inspect ----------------------------------------------------------

    /// Apply a by-key lookup: refresh the row, or report that nothing exists.
    pub fn finish_inspect(&mut self, key: &R::Key, found: Option<R>) -> Option<&R> {
        let Some(record) = found else {
            self.notify(
                format!("No {} found for {key}", R::KIND.singular()),
                NotificationKind::Error,
            );
            return None;
        };

        let index = match self.position(key) {
            Some(index) => {
                self.items[index] = record;
                index
            }
            None => {
                self.items.push(record);
                self.items.len() - 1
            }
        };
        self.notify_success(format!("Refreshed {} {key}", R::KIND.singular()));
        self.items.get(index)
    }

    // ---- notifications ----------------------------------------------------

    /// Current notification, if any.
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Show `message` for the configured lifetime.
    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.notification = Some(Notification {
            message: message.into(),
            kind,
            expires_at: Instant::now() + self.notification_ttl,
        });
    }

    /// Drop the notification once it has expired at `now`; returns whether it did.
    pub fn expire_notification(&mut self, now: Instant) -> bool {
        match &self.notification {
            Some(notification) if !notification.is_live(now) => {
                self.notification = None;
                true
            }
            _ => false,
        }
    }

    /// Dismiss the notification immediately.
    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    fn notify_success(&mut self, message: String) {
        info!(resource = R::KIND.path(), "{message}");
        self.notify(message, NotificationKind::Success);
    }

    // ---- helpers ----------------------------------------------------------

    fn ensure_can_mutate(&self) -> Result<(), ActionError> {
        if self.phase != LoadPhase::Ready {
            return Err(ActionError::NotReady);
        }
        if !self.is_idle() {
            return Err(ActionError::Busy);
        }
        Ok(())
    }

    fn check(&mut self, draft: &R) -> Result<(), ValidationError> {
        draft.validate().map_err(|err| {
            self.error = Some(err.to_string());
            err
        })
    }

    fn position(&self, key: &R::Key) -> Option<usize> {
        self.items.iter().position(|record| &record.key() == key)
    }

    fn record_failure(&mut self, err: ApiError) -> ActionError {
        warn!(resource = R::KIND.path(), "request failed: {err}");
        let message = err.to_string();
        self.error = Some(message.clone());
        self.notify(message, NotificationKind::Error);
        err.into()
    }
}
