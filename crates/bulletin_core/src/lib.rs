//! Core logic for the community bulletin site front-end.
//! Owns the announcement store, its durable mirror, and the route tables.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod routing;
pub mod storage;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::announcement::{
    Announcement, AnnouncementDraft, AnnouncementId, AnnouncementValidationError,
};
pub use model::clock::{Clock, IdGenerator, ManualClock, SystemClock};
pub use routing::guard::{
    AuthContext, GuardDecision, NavigationGuard, NavigationOutcome, NavigationPipeline,
    RequireAuthGuard, RoleGuard, SessionUser,
};
pub use routing::path::{PathPattern, RouteParams};
pub use routing::revisions::RouteRevision;
pub use routing::route::{Role, RouteDef, RouteMeta, ViewId};
pub use routing::table::{ResolvedRoute, RouteBuildError, RouteRecord, RouteTable};
pub use storage::{DurableStorage, MemoryStorage, SqliteStorage, StorageError, ANNOUNCEMENTS_KEY};
pub use store::announcement_store::{
    AnnouncementStore, CorruptState, StoreError, StoreEvent, StoreResult, SubscriptionId,
};
pub use store::codec::{decode_announcements, decode_announcements_lenient, encode_announcements};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
