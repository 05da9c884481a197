//! Owned announcement store with a durable mirror.
//!
//! # Responsibility
//! - Load the announcement list from storage once at open time.
//! - Apply `add` / `delete_at` / `update_at` in memory, notify, then rewrite
//!   the full mirror.
//!
//! # Invariants
//! - `announcements[0]` is the most recently added record.
//! - Out-of-range indices fail with `IndexOutOfBounds` and change nothing.
//! - Subscribers observe every in-memory mutation, including ones whose
//!   mirror write later failed.

use crate::model::announcement::{
    Announcement, AnnouncementDraft, AnnouncementId, AnnouncementValidationError,
};
use crate::model::clock::{Clock, IdGenerator, SystemClock};
use crate::storage::{DurableStorage, StorageError, ANNOUNCEMENTS_KEY};
use crate::store::codec::{decode_announcements_lenient, encode_announcements};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// In-memory change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added {
        index: usize,
        announcement: Announcement,
    },
    Deleted {
        index: usize,
        announcement: Announcement,
    },
    Updated {
        index: usize,
        previous: Announcement,
        announcement: Announcement,
    },
}

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

/// Why the stored list could not be used at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptState {
    /// The storage backend failed to return the value.
    Unreadable(String),
    /// The value is not a valid announcement array.
    Unparseable(String),
    /// Some records failed validation and were left out of the list.
    InvalidRecords(Vec<String>),
}

impl Display for CorruptState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable(detail) => write!(f, "stored announcements unreadable: {detail}"),
            Self::Unparseable(detail) => write!(f, "stored announcements unparseable: {detail}"),
            Self::InvalidRecords(skipped) => write!(
                f,
                "{} stored announcement(s) skipped: {}",
                skipped.len(),
                skipped.join("; ")
            ),
        }
    }
}

/// Announcement store errors.
#[derive(Debug)]
pub enum StoreError {
    IndexOutOfBounds { index: usize, len: usize },
    Validation(AnnouncementValidationError),
    /// The mirror write failed; the in-memory mutation was kept.
    PersistenceFailed(StorageError),
    Encode(serde_json::Error),
    CorruptState(CorruptState),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "announcement index {index} out of bounds (len {len})")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::PersistenceFailed(err) => write!(f, "persisting announcements failed: {err}"),
            Self::Encode(err) => write!(f, "encoding announcements failed: {err}"),
            Self::CorruptState(state) => write!(f, "{state}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::PersistenceFailed(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::IndexOutOfBounds { .. } | Self::CorruptState(_) => None,
        }
    }
}

impl From<AnnouncementValidationError> for StoreError {
    fn from(value: AnnouncementValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Explicitly owned announcement state.
pub struct AnnouncementStore<S: DurableStorage, C: Clock = SystemClock> {
    storage: S,
    ids: IdGenerator<C>,
    announcements: Vec<Announcement>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    dirty: bool,
    startup_issue: Option<CorruptState>,
}

impl<S: DurableStorage> AnnouncementStore<S> {
    /// Opens the store on the wall clock. See `open_with_clock`.
    pub fn open(storage: S) -> Self {
        Self::open_with_clock(storage, SystemClock)
    }
}

impl<S: DurableStorage, C: Clock> AnnouncementStore<S, C> {
    /// Loads the mirror, defaulting to an empty list when it is missing or
    /// unusable, and skipping individual records that fail validation.
    ///
    /// Either condition is reported through `startup_issue()`. The stored
    /// value is left as is until the next successful write replaces it.
    pub fn open_with_clock(storage: S, clock: C) -> Self {
        let (announcements, startup_issue) = match load_announcements(&storage) {
            Ok((list, None)) => (list, None),
            Ok((list, Some(state))) => {
                warn!(
                    "event=store_open module=store status=recovered fallback=partial kept={} reason={}",
                    list.len(),
                    state
                );
                (list, Some(state))
            }
            Err(state) => {
                warn!(
                    "event=store_open module=store status=recovered fallback=empty reason={}",
                    state
                );
                (Vec::new(), Some(state))
            }
        };
        Self::from_parts(storage, clock, announcements, startup_issue)
    }

    /// Loads the mirror and fails instead of falling back or skipping records.
    pub fn open_strict_with_clock(storage: S, clock: C) -> StoreResult<Self> {
        match load_announcements(&storage).map_err(StoreError::CorruptState)? {
            (announcements, None) => Ok(Self::from_parts(storage, clock, announcements, None)),
            (_, Some(state)) => Err(StoreError::CorruptState(state)),
        }
    }

    fn from_parts(
        storage: S,
        clock: C,
        announcements: Vec<Announcement>,
        startup_issue: Option<CorruptState>,
    ) -> Self {
        let mut ids = IdGenerator::new(clock);
        if let Some(max) = announcements.iter().filter_map(|a| a.id.as_millis()).max() {
            ids.observe(max);
        }
        info!(
            "event=store_open module=store status=ok count={}",
            announcements.len()
        );
        Self {
            storage,
            ids,
            announcements,
            subscribers: Vec::new(),
            next_subscription: 0,
            dirty: false,
            startup_issue,
        }
    }

    /// Condition found while loading, if the store started empty because of it.
    pub fn startup_issue(&self) -> Option<&CorruptState> {
        self.startup_issue.as_ref()
    }

    /// Current list, newest first.
    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    pub fn get(&self, index: usize) -> Option<&Announcement> {
        self.announcements.get(index)
    }

    /// Returns `(index, record)` for the given id.
    pub fn find(&self, id: &AnnouncementId) -> Option<(usize, &Announcement)> {
        self.announcements
            .iter()
            .enumerate()
            .find(|(_, announcement)| &announcement.id == id)
    }

    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    /// True when memory holds mutations the mirror has not accepted yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Adds a new announcement at the front of the list.
    ///
    /// On `PersistenceFailed` the record stays in memory.
    pub fn add(&mut self, draft: AnnouncementDraft) -> StoreResult<Announcement> {
        let (id, issued_at) = self.ids.next_id();
        let created_at = i64::try_from(issued_at).unwrap_or(i64::MAX);
        let announcement = Announcement::from_draft(id, created_at, draft)?;

        self.announcements.insert(0, announcement.clone());
        debug!(
            "event=announcement_add module=store status=applied id={} count={}",
            announcement.id,
            self.announcements.len()
        );
        self.notify(&StoreEvent::Added {
            index: 0,
            announcement: announcement.clone(),
        });
        self.persist("add")?;
        Ok(announcement)
    }

    /// Removes the announcement at `index`.
    pub fn delete_at(&mut self, index: usize) -> StoreResult<Announcement> {
        self.check_index(index)?;

        let removed = self.announcements.remove(index);
        debug!(
            "event=announcement_delete module=store status=applied index={} id={} count={}",
            index,
            removed.id,
            self.announcements.len()
        );
        self.notify(&StoreEvent::Deleted {
            index,
            announcement: removed.clone(),
        });
        self.persist("delete")?;
        Ok(removed)
    }

    /// Replaces the content at `index` wholesale, keeping id and creation time.
    pub fn update_at(
        &mut self,
        index: usize,
        draft: AnnouncementDraft,
    ) -> StoreResult<Announcement> {
        self.check_index(index)?;

        let replacement = self.announcements[index].replaced_with(draft)?;
        let previous = std::mem::replace(&mut self.announcements[index], replacement.clone());
        debug!(
            "event=announcement_update module=store status=applied index={} id={}",
            index, replacement.id
        );
        self.notify(&StoreEvent::Updated {
            index,
            previous,
            announcement: replacement.clone(),
        });
        self.persist("update")?;
        Ok(replacement)
    }

    /// Rewrites the mirror from memory, e.g. after a `PersistenceFailed`.
    pub fn flush(&mut self) -> StoreResult<()> {
        self.persist("flush")
    }

    /// Registers a change callback. Callbacks run in registration order.
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a callback. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    fn check_index(&self, index: usize) -> StoreResult<()> {
        let len = self.announcements.len();
        if index >= len {
            warn!(
                "event=announcement_index module=store status=rejected index={} len={}",
                index, len
            );
            return Err(StoreError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    fn notify(&mut self, event: &StoreEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    fn persist(&mut self, operation: &'static str) -> StoreResult<()> {
        self.dirty = true;
        let payload = encode_announcements(&self.announcements)?;
        match self.storage.set_item(ANNOUNCEMENTS_KEY, &payload) {
            Ok(()) => {
                self.dirty = false;
                info!(
                    "event=store_persist module=store status=ok op={} count={} bytes={}",
                    operation,
                    self.announcements.len(),
                    payload.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_persist module=store status=error op={} count={} error={}",
                    operation,
                    self.announcements.len(),
                    err
                );
                Err(StoreError::PersistenceFailed(err))
            }
        }
    }
}

type Loaded = (Vec<Announcement>, Option<CorruptState>);

fn load_announcements<S: DurableStorage>(storage: &S) -> Result<Loaded, CorruptState> {
    let raw = storage
        .get_item(ANNOUNCEMENTS_KEY)
        .map_err(|err| CorruptState::Unreadable(err.to_string()))?;
    let Some(raw) = raw else {
        return Ok((Vec::new(), None));
    };
    let (kept, skipped) = decode_announcements_lenient(&raw)
        .map_err(|err| CorruptState::Unparseable(err.to_string()))?;
    let issue = (!skipped.is_empty()).then_some(CorruptState::InvalidRecords(skipped));
    Ok((kept, issue))
}
