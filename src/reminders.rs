use std::sync::Arc;

use axum::headers::authorization::Bearer;
use axum::headers::Authorization;
use axum::{Extension, Json, TypedHeader};

use crate::err::Error;
use crate::models::{CreateReminder, NudgeResponse, ReminderCreated, ReminderList};
use crate::store::Store;
use crate::{auth, notify, nudge, proceeds, Payload};

pub async fn create(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Extension(store): Extension<Arc<Store>>,
    Json(body): Json<CreateReminder>,
) -> Payload<ReminderCreated> {
    let claims = auth::authorize(bearer)?;
    if body.title.is_empty() || body.date.is_empty() {
        return Err(Error::validation("title and date are required"));
    }

    // Normalize an empty time field away so it does not perturb sorting.
    let time = body.time.filter(|t| !t.is_empty());
    let reminder = store
        .create_reminder(claims.sub, body.title, body.date, time)
        .await?;

    log::info!(
        "Reminder {} created for user {} on {}",
        reminder.id,
        claims.sub,
        reminder.date
    );
    proceeds(ReminderCreated {
        message: "Reminder set".to_string(),
        reminder,
    })
}

pub async fn list(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Extension(store): Extension<Arc<Store>>,
) -> Payload<ReminderList> {
    let claims = auth::authorize(bearer)?;
    let reminders = store.reminders_for(claims.sub).await;
    proceeds(ReminderList { reminders })
}

/// The authoritative "what should the user be told today" answer, so clients
/// stay pure renderers: a count of upcoming deadlines (today inclusive) and
/// a ready-made summary line when there is one.
pub async fn nudge(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Extension(store): Extension<Arc<Store>>,
) -> Payload<NudgeResponse> {
    let claims = auth::authorize(bearer)?;
    let reminders = store.reminders_for(claims.sub).await;
    let today = nudge::today_string();
    let count = notify::upcoming(&reminders, &today).len();
    proceeds(NudgeResponse {
        count,
        message: notify::nudge_message(count),
    })
}
