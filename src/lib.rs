//! Client for the Korfinder tutor/student matching service.
//!
//! - `api`: REST client, wire model and the service traits used for injection.
//! - `feed`: the swipe deck and its reconciliation against fresh feeds.
//! - `session`, `matches`, `chat`: the stores around it.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod feed;
pub mod matches;
pub mod session;
pub mod validate;

pub use api::model::{Listing, ListingId, UserId, UserRole};
pub use api::{ApiClient, AuthService, FeedService, MatchService};
pub use error::{ApiError, FriendlyError};
pub use feed::{FeedReconciler, LoadOutcome};
