use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user, as persisted. The password hash never leaves the
/// server; API responses use [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub course: String,
    pub college: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub course: String,
    pub college: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            course: self.course.clone(),
            college: self.college.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// A dated reminder owned by a single user. `date` is a plain `YYYY-MM-DD`
/// calendar-day string and is only ever compared lexically. `notified_days`
/// records the days the sweep has already accounted for, each at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notified_days: Vec<String>,
}

impl Reminder {
    /// Ordering key: `date + (time or "")`, so reminders without a time sort
    /// before timed ones on the same date.
    pub fn sort_key(&self) -> String {
        format!("{}{}", self.date, self.time.as_deref().unwrap_or(""))
    }
}

// Request bodies. Fields default to empty so an absent field and an empty
// one both fail validation with 400 rather than a deserialization rejection.

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub college: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReminder {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
}

// Response bodies.

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderCreated {
    pub message: String,
    pub reminder: Reminder,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderList {
    pub reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NudgeResponse {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
