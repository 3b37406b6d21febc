//! Swipe deck state: the fetched candidate list, the ids consumed locally, and
//! reconciliation of the two whenever the feed is reloaded.
//!
//! A [`FeedReconciler`] is the single writer of its state. Every mutation goes
//! through one `parking_lot::Mutex` that is never held across an `.await`, so
//! `consume` calls made while a load is suspended are ordered before the
//! load's reconciliation step and survive it.
use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, error, info, instrument, warn};

use crate::api::model::{Listing, ListingId, UserId};
use crate::api::FeedService;
use crate::error::{ApiError, FriendlyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

/// What a call to [`FeedReconciler::load`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The listing collection was replaced with `count` fresh listings.
    Loaded { count: usize },
    /// Another load was already in flight; nothing happened.
    Skipped,
    /// The request was cancelled; state is as it was before the call.
    Cancelled,
}

#[derive(Debug, Default)]
struct FeedState {
    listings: Vec<Listing>,
    consumed: HashSet<ListingId>,
    loading: bool,
    last_error: Option<FriendlyError>,
}

impl FeedState {
    fn reconcile(&mut self, fresh: Vec<Listing>, force_reset: bool) {
        if force_reset {
            self.consumed.clear();
        } else {
            let ids: HashSet<ListingId> = fresh.iter().map(|l| l.id).collect();
            self.consumed.retain(|id| ids.contains(id));
        }
        self.listings = fresh;
    }
}

/// Releases the loading flag however `load` exits, including when its future
/// is dropped mid-flight.
struct LoadGuard<'a> {
    state: &'a Mutex<FeedState>,
    previous_error: Option<FriendlyError>,
    settled: bool,
}

impl LoadGuard<'_> {
    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let mut st = self.state.lock();
        st.loading = false;
        if !self.settled {
            st.last_error = self.previous_error.take();
        }
    }
}

pub struct FeedReconciler<S> {
    service: S,
    state: Mutex<FeedState>,
}

impl<S: FeedService> FeedReconciler<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: Mutex::new(FeedState::default()),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Fetch the feed and reconcile the consumed set against it.
    ///
    /// At most one load runs at a time: a call made while another is in
    /// flight returns [`LoadOutcome::Skipped`] without touching the network.
    /// With `force_reset` the server is asked to start over and the consumed
    /// set is emptied; otherwise consumed ids missing from the fresh listing
    /// set are pruned. A failure keeps the previous listings and records the
    /// classified error, which is also returned.
    #[instrument(skip(self))]
    pub async fn load(&self, force_reset: bool) -> Result<LoadOutcome, FriendlyError> {
        let previous_error = {
            let mut st = self.state.lock();
            if st.loading {
                debug!("feed load already in flight; skipping");
                return Ok(LoadOutcome::Skipped);
            }
            st.loading = true;
            st.last_error.take()
        };
        let mut guard = LoadGuard {
            state: &self.state,
            previous_error,
            settled: false,
        };

        let result = self.service.fetch_candidates(force_reset).await;

        let mut st = self.state.lock();
        let outcome = match result {
            Ok(fresh) => {
                let count = fresh.len();
                st.reconcile(fresh, force_reset);
                info!(count, consumed = st.consumed.len(), "feed loaded");
                guard.settle();
                Ok(LoadOutcome::Loaded { count })
            }
            Err(ApiError::Cancelled) => {
                info!("feed load cancelled");
                Ok(LoadOutcome::Cancelled)
            }
            Err(err) => {
                if matches!(err, ApiError::Decode(_)) {
                    error!(?err, "feed response could not be decoded");
                } else {
                    warn!(?err, "feed load failed");
                }
                let friendly = FriendlyError::from_api(&err)
                    .unwrap_or_else(|| FriendlyError::Unknown(err.to_string()));
                st.last_error = Some(friendly.clone());
                guard.settle();
                Err(friendly)
            }
        };
        // Release the state before `guard` locks it again.
        drop(st);
        outcome
    }

    /// Like [`load`](Self::load), but abandons the request as soon as
    /// `cancel` completes.
    pub async fn load_or_cancel<F>(
        &self,
        force_reset: bool,
        cancel: F,
    ) -> Result<LoadOutcome, FriendlyError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            outcome = self.load(force_reset) => outcome,
            _ = cancel => {
                info!("feed load cancelled by caller");
                Ok(LoadOutcome::Cancelled)
            }
        }
    }

    /// Explicit reload: restart the feed server-side and show everything again.
    pub async fn reload(&self) -> Result<LoadOutcome, FriendlyError> {
        let outcome = self.load(true).await;
        self.clear_consumed();
        outcome
    }

    /// Mark a listing as shown. Idempotent, local only.
    pub fn consume(&self, id: ListingId) {
        self.state.lock().consumed.insert(id);
    }

    pub fn clear_consumed(&self) {
        self.state.lock().consumed.clear();
    }

    /// Listings not yet consumed, in server order.
    pub fn deck(&self) -> Vec<Listing> {
        let st = self.state.lock();
        st.listings
            .iter()
            .filter(|l| !st.consumed.contains(&l.id))
            .cloned()
            .collect()
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.state.lock().listings.clone()
    }

    pub fn consumed(&self) -> HashSet<ListingId> {
        self.state.lock().consumed.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading() {
            Phase::Loading
        } else {
            Phase::Idle
        }
    }

    pub fn last_error(&self) -> Option<FriendlyError> {
        self.state.lock().last_error.clone()
    }

    /// Submit a swipe. Returns true only for a like that produced a match.
    ///
    /// Failures are logged and read as "no match"; the consumed set is never
    /// touched here.
    pub async fn submit_swipe(&self, target_user_id: UserId, like: bool) -> bool {
        match self.service.submit_swipe(target_user_id, like).await {
            Ok(matched) => matched && like,
            Err(err) => {
                warn!(?err, target_user_id, like, "swipe submission failed; treating as no match");
                false
            }
        }
    }

    /// Consume `listing` and then submit the swipe on its owner.
    pub async fn swipe(&self, listing: &Listing, like: bool) -> bool {
        self.consume(listing.id);
        self.submit_swipe(listing.swipe_target(), like).await
    }
}
