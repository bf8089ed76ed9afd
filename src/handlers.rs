use crate::actions;
use crate::dashboard::{DashboardView, LoadStatus};
use crate::errors::AppError;
use crate::form::RecordEntryForm;
use crate::models::{GroupKey, SessionResponse};
use crate::state::AppState;
use crate::ui::{render_dashboard, render_login};
use axum::{
    Form, Json,
    extract::State,
    response::{Html, Redirect},
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub chapter: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupForm {
    pub name: String,
    pub chapter: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub name: String,
    pub chapter: String,
    pub record_id: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardSnapshot {
    pub dashboard: DashboardView,
    pub form: RecordEntryForm,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let Some(session) = state.session.lock().await.current().cloned() else {
        let panel = state.login.lock().await.clone();
        return Html(render_login(&panel));
    };

    // a restored session has not fetched anything yet
    if state.dashboard.lock().await.status == LoadStatus::Idle {
        if let Err(err) = actions::load(&state).await {
            debug!("initial load did not complete: {err}");
        }
        if state.session.lock().await.current().is_none() {
            let panel = state.login.lock().await.clone();
            return Html(render_login(&panel));
        }
    }

    let view = state.dashboard.lock().await.clone();
    let form = state.form.lock().await.clone();
    Html(render_dashboard(&session, &view, &form))
}

pub async fn login(State(state): State<AppState>, Form(payload): Form<LoginForm>) -> Redirect {
    if let Err(err) = actions::login(&state, &payload.chapter, &payload.password).await {
        debug!("login did not complete: {err}");
    }
    Redirect::to("/")
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    actions::logout(&state).await;
    Redirect::to("/")
}

pub async fn refresh(State(state): State<AppState>) -> Redirect {
    if let Err(err) = actions::load(&state).await {
        debug!("refresh did not complete: {err}");
    }
    Redirect::to("/")
}

pub async fn toggle_group(State(state): State<AppState>, Form(payload): Form<GroupForm>) -> Redirect {
    if logged_in(&state).await {
        let key = GroupKey::new(payload.name, payload.chapter);
        state.dashboard.lock().await.toggle_expand(&key);
    }
    Redirect::to("/")
}

pub async fn request_delete(
    State(state): State<AppState>,
    Form(payload): Form<DeleteForm>,
) -> Redirect {
    if logged_in(&state).await {
        let key = GroupKey::new(payload.name, payload.chapter);
        if !actions::request_delete(&state, &key, &payload.record_id).await {
            debug!(record = %payload.record_id, "delete request ignored");
        }
    }
    Redirect::to("/")
}

pub async fn confirm_delete(State(state): State<AppState>) -> Redirect {
    if let Err(err) = actions::confirm_delete(&state).await {
        debug!("delete did not complete: {err}");
    }
    Redirect::to("/")
}

pub async fn cancel_delete(State(state): State<AppState>) -> Redirect {
    state.dashboard.lock().await.cancel_delete();
    Redirect::to("/")
}

pub async fn open_form(State(state): State<AppState>) -> Redirect {
    if logged_in(&state).await {
        state.form.lock().await.open();
    }
    Redirect::to("/")
}

pub async fn close_form(State(state): State<AppState>) -> Redirect {
    state.form.lock().await.close();
    Redirect::to("/")
}

/// One endpoint for every button of the entry form, so typed values are
/// kept whichever button was pressed.
pub async fn form_action(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    if !logged_in(&state).await {
        return Redirect::to("/");
    }

    let action = fields
        .iter()
        .find(|(name, _)| name == "action")
        .map(|(_, value)| value.clone())
        .unwrap_or_default();

    {
        let mut form = state.form.lock().await;
        if !form.open || form.submitting {
            return Redirect::to("/");
        }
        form.apply_fields(fields.iter().map(|(name, value)| (name.as_str(), value.as_str())));

        if action == "add_row" {
            form.add_row();
            return Redirect::to("/");
        }
        if let Some(index) = action.strip_prefix("remove_row_") {
            if let Ok(index) = index.parse::<usize>() {
                form.remove_row(index);
            }
            return Redirect::to("/");
        }
    }

    if action == "submit" {
        if let Err(err) = actions::submit_records(&state, Local::now().year()).await {
            debug!("submit did not complete: {err}");
        }
    }
    Redirect::to("/")
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    Json(SessionResponse {
        logged_in: session.current().is_some(),
        chapter_id: session.current().map(|session| session.chapter_id.clone()),
    })
}

pub async fn get_groups(State(state): State<AppState>) -> Result<Json<DashboardSnapshot>, AppError> {
    if !logged_in(&state).await {
        return Err(AppError::unauthorized("not logged in"));
    }
    let dashboard = state.dashboard.lock().await.clone();
    let form = state.form.lock().await.clone();
    Ok(Json(DashboardSnapshot { dashboard, form }))
}

async fn logged_in(state: &AppState) -> bool {
    state.session.lock().await.current().is_some()
}
