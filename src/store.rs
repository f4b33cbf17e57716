use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::err::Error;
use crate::models::{Reminder, User};

const USERS_FILE: &str = "users.json";
const REMINDERS_FILE: &str = "reminders.json";

/// Flat-file repository for users and reminders. Each collection is one JSON
/// list rewritten whole on every mutation.
///
/// Consistency contract: every mutation takes the state lock for the full
/// read-modify-write-persist cycle, so concurrent calls cannot lose updates
/// within one process. Crash durability of a write in flight is out of scope.
pub struct Store {
    dir: PathBuf,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    reminders: Vec<Reminder>,
}

impl Store {
    /// Opens the store at `dir`, creating it if needed and loading any
    /// existing collections.
    pub async fn open<P: Into<PathBuf>>(dir: P) -> anyhow::Result<Store> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        let state = State {
            users: load_list(&dir.join(USERS_FILE)).await?,
            reminders: load_list(&dir.join(REMINDERS_FILE)).await?,
        };
        Ok(Store {
            dir,
            state: Mutex::new(state),
        })
    }

    /// Stores a new user. The email must not collide with an existing one,
    /// compared case-insensitively. `password_hash` is assumed already
    /// encoded; the store never sees a plaintext credential.
    pub async fn register_user(
        &self,
        name: String,
        course: String,
        college: String,
        email: String,
        password_hash: String,
    ) -> Result<User, Error> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&email))
        {
            return Err(Error::DuplicateEmail {
                message: "An account with this email already exists".to_string(),
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            name,
            course,
            college,
            email,
            password_hash,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        persist(&self.dir.join(USERS_FILE), &state.users).await?;
        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub async fn user_by_id(&self, id: Uuid) -> Option<User> {
        let state = self.state.lock().await;
        state.users.iter().find(|u| u.id == id).cloned()
    }

    /// Stores a new reminder owned by `user_id` with an empty notified-day
    /// set.
    pub async fn create_reminder(
        &self,
        user_id: Uuid,
        title: String,
        date: String,
        time: Option<String>,
    ) -> Result<Reminder, Error> {
        let mut state = self.state.lock().await;
        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id,
            title,
            date,
            time,
            created_at: Utc::now(),
            notified_days: Vec::new(),
        };
        state.reminders.push(reminder.clone());
        persist(&self.dir.join(REMINDERS_FILE), &state.reminders).await?;
        Ok(reminder)
    }

    /// Returns `user_id`'s reminders, stably sorted ascending by
    /// `date + (time or "")`.
    pub async fn reminders_for(&self, user_id: Uuid) -> Vec<Reminder> {
        let state = self.state.lock().await;
        let mut reminders: Vec<Reminder> = state
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by_key(Reminder::sort_key);
        reminders
    }

    /// Daily nudge sweep: stamps `today` onto every reminder whose deadline
    /// has not passed (`today <= date`) and which has not been stamped for
    /// `today` yet. Idempotent within a calendar day. Returns the number of
    /// reminders stamped; nothing is persisted when that is zero.
    pub async fn mark_notified(&self, today: &str) -> Result<usize, Error> {
        let mut state = self.state.lock().await;
        let mut stamped = 0;
        for reminder in state.reminders.iter_mut() {
            if today <= reminder.date.as_str()
                && !reminder.notified_days.iter().any(|d| d == today)
            {
                reminder.notified_days.push(today.to_string());
                stamped += 1;
            }
        }
        if stamped > 0 {
            persist(&self.dir.join(REMINDERS_FILE), &state.reminders).await?;
        }
        Ok(stamped)
    }
}

async fn load_list<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn persist<T: Serialize>(path: &Path, items: &[T]) -> Result<(), Error> {
    let bytes = serde_json::to_vec_pretty(items)?;
    fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).await.unwrap();
        (dir, store)
    }

    async fn register(store: &Store, email: &str) -> User {
        store
            .register_user(
                "Ada".to_string(),
                "CS".to_string(),
                "Somerville".to_string(),
                email.to_string(),
                "hash".to_string(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let (_dir, store) = temp_store().await;
        register(&store, "a@x.com").await;

        let dup = store
            .register_user(
                "Eve".to_string(),
                "CS".to_string(),
                "Somerville".to_string(),
                "A@X.COM".to_string(),
                "hash".to_string(),
            )
            .await;
        assert!(matches!(dup, Err(Error::DuplicateEmail { .. })));
    }

    #[tokio::test]
    async fn lookup_by_email_ignores_case() {
        let (_dir, store) = temp_store().await;
        let user = register(&store, "a@x.com").await;

        let found = store.user_by_email("A@x.Com").await.unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.user_by_email("b@x.com").await.is_none());
    }

    #[tokio::test]
    async fn reminders_are_scoped_to_their_owner() {
        let (_dir, store) = temp_store().await;
        let a = register(&store, "a@x.com").await;
        let b = register(&store, "b@x.com").await;

        store
            .create_reminder(a.id, "Essay".to_string(), "2025-06-01".to_string(), None)
            .await
            .unwrap();
        store
            .create_reminder(b.id, "Lab".to_string(), "2025-06-02".to_string(), None)
            .await
            .unwrap();

        let for_a = store.reminders_for(a.id).await;
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].title, "Essay");
        assert!(for_a.iter().all(|r| r.user_id == a.id));
    }

    #[tokio::test]
    async fn reminders_sort_by_date_then_time_with_untimed_first() {
        let (_dir, store) = temp_store().await;
        let user = register(&store, "a@x.com").await;

        store
            .create_reminder(
                user.id,
                "Late".to_string(),
                "2025-06-02".to_string(),
                Some("09:00".to_string()),
            )
            .await
            .unwrap();
        store
            .create_reminder(
                user.id,
                "Timed".to_string(),
                "2025-06-01".to_string(),
                Some("14:00".to_string()),
            )
            .await
            .unwrap();
        store
            .create_reminder(user.id, "Untimed".to_string(), "2025-06-01".to_string(), None)
            .await
            .unwrap();

        let titles: Vec<String> = store
            .reminders_for(user.id)
            .await
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Untimed", "Timed", "Late"]);
    }

    #[tokio::test]
    async fn sweep_is_idempotent_and_stops_after_the_deadline() {
        let (_dir, store) = temp_store().await;
        let user = register(&store, "a@x.com").await;
        let reminder = store
            .create_reminder(user.id, "Essay".to_string(), "2025-06-01".to_string(), None)
            .await
            .unwrap();
        assert!(reminder.notified_days.is_empty());

        // On the deadline day the sweep stamps exactly once.
        assert_eq!(store.mark_notified("2025-06-01").await.unwrap(), 1);
        assert_eq!(store.mark_notified("2025-06-01").await.unwrap(), 0);
        let days = store.reminders_for(user.id).await[0].notified_days.clone();
        assert_eq!(days, vec!["2025-06-01"]);

        // The day after the deadline, today <= date no longer holds.
        assert_eq!(store.mark_notified("2025-06-02").await.unwrap(), 0);
        let days = store.reminders_for(user.id).await[0].notified_days.clone();
        assert_eq!(days, vec!["2025-06-01"]);
    }

    #[tokio::test]
    async fn sweep_stamps_each_day_before_the_deadline() {
        let (_dir, store) = temp_store().await;
        let user = register(&store, "a@x.com").await;
        store
            .create_reminder(user.id, "Essay".to_string(), "2025-06-03".to_string(), None)
            .await
            .unwrap();

        assert_eq!(store.mark_notified("2025-06-01").await.unwrap(), 1);
        assert_eq!(store.mark_notified("2025-06-02").await.unwrap(), 1);
        let days = store.reminders_for(user.id).await[0].notified_days.clone();
        assert_eq!(days, vec!["2025-06-01", "2025-06-02"]);
    }

    #[tokio::test]
    async fn state_survives_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let user = {
            let store = Store::open(dir.path()).await.unwrap();
            let user = store
                .register_user(
                    "Ada".to_string(),
                    "CS".to_string(),
                    "Somerville".to_string(),
                    "a@x.com".to_string(),
                    "hash".to_string(),
                )
                .await
                .unwrap();
            store
                .create_reminder(user.id, "Essay".to_string(), "2025-06-01".to_string(), None)
                .await
                .unwrap();
            user
        };

        let reopened = Store::open(dir.path()).await.unwrap();
        assert!(reopened.user_by_id(user.id).await.is_some());
        let reminders = reopened.reminders_for(user.id).await;
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].title, "Essay");
    }

    #[tokio::test]
    async fn concurrent_creations_do_not_lose_updates() {
        let (_dir, store) = temp_store().await;
        let user = register(&store, "a@x.com").await;

        let (first, second) = tokio::join!(
            store.create_reminder(user.id, "One".to_string(), "2025-06-01".to_string(), None),
            store.create_reminder(user.id, "Two".to_string(), "2025-06-02".to_string(), None),
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(store.reminders_for(user.id).await.len(), 2);
    }
}
