use tracing::warn;

use crate::api::model::Match;
use crate::api::MatchService;
use crate::error::FriendlyError;

/// The signed-in user's matches, newest first as the server orders them.
pub struct MatchesStore<S> {
    service: S,
    matches: Vec<Match>,
    loading: bool,
    error: Option<FriendlyError>,
}

impl<S: MatchService> MatchesStore<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            matches: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FriendlyError> {
        self.error.as_ref()
    }

    pub async fn reload(&mut self) {
        self.loading = true;
        self.error = None;
        match self.service.matches().await {
            Ok(matches) => self.matches = matches,
            Err(err) => {
                warn!(?err, "failed to load matches");
                self.error = FriendlyError::from_api(&err);
            }
        }
        self.loading = false;
    }
}
