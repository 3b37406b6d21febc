use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use korfinder_client::api::model::{Match, Message};
use korfinder_client::chat::ChatStore;
use korfinder_client::matches::MatchesStore;
use korfinder_client::{ApiError, FriendlyError, MatchService};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct RecordingMatches {
    match_responses: Arc<Mutex<VecDeque<Result<Vec<Match>, ApiError>>>>,
    message_responses: Arc<Mutex<VecDeque<Result<Vec<Message>, ApiError>>>>,
    send_responses: Arc<Mutex<VecDeque<Result<Message, ApiError>>>>,
    message_calls: Arc<Mutex<Vec<i64>>>,
    sent: Arc<Mutex<Vec<(i64, String)>>>,
}

#[async_trait::async_trait]
impl MatchService for RecordingMatches {
    async fn matches(&self) -> Result<Vec<Match>, ApiError> {
        let mut guard = self.match_responses.lock().await;
        guard.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn messages(&self, match_id: i64) -> Result<Vec<Message>, ApiError> {
        self.message_calls.lock().await.push(match_id);
        let mut guard = self.message_responses.lock().await;
        guard.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_message(&self, match_id: i64, body: &str) -> Result<Message, ApiError> {
        self.sent.lock().await.push((match_id, body.to_string()));
        let mut guard = self.send_responses.lock().await;
        guard
            .pop_front()
            .unwrap_or_else(|| Ok(message(99, match_id, body)))
    }
}

fn a_match(id: i64) -> Match {
    Match {
        id,
        user_id: 1,
        target_user_id: 2,
        created_at: Utc.with_ymd_and_hms(2025, 11, 17, 14, 0, 0).unwrap(),
    }
}

fn message(id: i64, match_id: i64, body: &str) -> Message {
    Message {
        id,
        match_id,
        sender_id: 1,
        body: body.to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 11, 17, 15, 0, 0).unwrap(),
    }
}

fn queue<T>(items: Vec<T>) -> Arc<Mutex<VecDeque<T>>> {
    Arc::new(Mutex::new(VecDeque::from(items)))
}

#[tokio::test]
async fn matches_reload_replaces_list() {
    let service = RecordingMatches {
        match_responses: queue(vec![Ok(vec![a_match(1), a_match(2)])]),
        ..Default::default()
    };
    let mut store = MatchesStore::new(service);

    store.reload().await;

    assert_eq!(store.matches().len(), 2);
    assert!(store.error().is_none());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn matches_failure_keeps_previous_list() {
    let service = RecordingMatches {
        match_responses: queue(vec![Ok(vec![a_match(1)]), Err(ApiError::http(502, ""))]),
        ..Default::default()
    };
    let mut store = MatchesStore::new(service);

    store.reload().await;
    store.reload().await;

    assert_eq!(store.matches(), &[a_match(1)]);
    assert_eq!(store.error(), Some(&FriendlyError::Server));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn chat_reload_reads_messages_of_its_match() {
    let service = RecordingMatches {
        message_responses: queue(vec![Ok(vec![message(1, 7, "hej"), message(2, 7, "cześć")])]),
        ..Default::default()
    };
    let mut store = ChatStore::new(service.clone(), a_match(7));

    store.reload().await;

    assert_eq!(store.messages().len(), 2);
    assert_eq!(*service.message_calls.lock().await, vec![7]);
}

#[tokio::test]
async fn chat_send_trims_and_appends() {
    let service = RecordingMatches::default();
    let mut store = ChatStore::new(service.clone(), a_match(3));
    store.draft = "  see you at 5  ".into();

    store.send().await;

    assert!(store.draft.is_empty());
    assert_eq!(store.messages().len(), 1);
    assert_eq!(store.messages()[0].body, "see you at 5");
    assert_eq!(*service.sent.lock().await, vec![(3, "see you at 5".to_string())]);
}

#[tokio::test]
async fn chat_blank_draft_is_not_sent() {
    let service = RecordingMatches::default();
    let mut store = ChatStore::new(service.clone(), a_match(3));
    store.draft = " \n\t ".into();

    store.send().await;

    assert!(service.sent.lock().await.is_empty());
    assert!(store.messages().is_empty());
}

#[tokio::test]
async fn chat_send_failure_records_error_and_drops_draft() {
    let service = RecordingMatches {
        send_responses: queue(vec![Err(ApiError::http(403, "Not your match"))]),
        ..Default::default()
    };
    let mut store = ChatStore::new(service, a_match(3));
    store.draft = "hello".into();

    store.send().await;

    assert!(store.draft.is_empty());
    assert!(store.messages().is_empty());
    assert_eq!(store.error(), Some(&FriendlyError::Forbidden));
}

#[tokio::test]
async fn chat_cancelled_reload_shows_no_error() {
    let service = RecordingMatches {
        message_responses: queue(vec![Err(ApiError::Cancelled)]),
        ..Default::default()
    };
    let mut store = ChatStore::new(service, a_match(3));

    store.reload().await;

    assert!(store.error().is_none());
}
