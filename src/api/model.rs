//! Wire model for the Korfinder REST API.
//!
//! Defaulting rules are applied here, once, at deserialization time so the
//! rest of the crate works with canonical values.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type ListingId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Tutor,
    /// Any role string this client does not know about.
    #[serde(other)]
    Other,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Tutor => "tutor",
            UserRole::Other => "other",
        }
    }

    /// Label shown on a card, if the role has one.
    pub fn display(&self) -> Option<&'static str> {
        match self {
            UserRole::Student => Some("Student"),
            UserRole::Tutor => Some("Tutor"),
            UserRole::Other => None,
        }
    }
}

/// A candidate shown in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// User who published the listing; the server sends it as `tutor_id`.
    #[serde(default, alias = "tutor_id")]
    pub owner_id: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "non_negative_price")]
    pub price_per_hour: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "published_default", deserialize_with = "published_or_default")]
    pub is_published: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl Listing {
    /// User a swipe on this listing is addressed to. Falls back to the
    /// listing id when the server did not send an owner.
    pub fn swipe_target(&self) -> UserId {
        self.owner_id.unwrap_or(self.id)
    }
}

fn published_default() -> bool {
    true
}

fn published_or_default<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(de)?.unwrap_or(true))
}

fn non_negative_price<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(de)?.filter(|p| p.is_finite() && *p >= 0.0))
}

fn non_empty_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.filter(|s| !s.trim().is_empty()))
}

/// Timestamps as produced by the backend: RFC 3339 with or without
/// fractional seconds, or a naive `YYYY-MM-DDTHH:MM:SS.ffffff` taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(de: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(de)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date format: {raw}")))
    }

    pub fn deserialize_opt<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(de)? {
            None => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date format: {raw}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwipeRequest {
    pub target_user_id: UserId,
    pub like: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwipeResponse {
    #[serde(rename = "match")]
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub new_user: Option<bool>,
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Me {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub onboarding_done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingRequest {
    pub online: bool,
    pub offline: bool,
    pub group_classes: bool,
    pub city: Option<String>,
    pub hourly_rate: Option<f64>,
    /// Free-form goals such as "matura" or "exam".
    pub types: Option<Vec<String>>,
    /// Subject ids.
    pub subjects: Option<Vec<i64>>,
}

impl Default for OnboardingRequest {
    fn default() -> Self {
        Self {
            online: true,
            offline: false,
            group_classes: false,
            city: None,
            hourly_rate: None,
            types: None,
            subjects: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingCreate {
    pub subject_id: i64,
    pub title: String,
    pub description: String,
    pub city: Option<String>,
    pub is_online: bool,
    pub is_offline: bool,
    pub hourly_rate: Option<f64>,
    pub level: Option<String>,
    pub is_published: bool,
    pub photo_url: Option<String>,
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_offline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// A mutual like, seen from the signed-in user's side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Match {
    pub id: i64,
    pub user_id: UserId,
    pub target_user_id: UserId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub match_id: i64,
    pub sender_id: UserId,
    pub body: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageCreate {
    pub match_id: i64,
    pub body: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Health {
    pub ok: bool,
}
