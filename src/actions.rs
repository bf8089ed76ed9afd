//! Operator actions. Each one takes the relevant view locks briefly, makes a
//! single call to the hours API and folds the outcome back into view state.
//! Errors are recorded where the page shows them before being returned.

use crate::aggregate::aggregate;
use crate::errors::{ActionError, ApiError};
use crate::form::RecordEntryForm;
use crate::login::LoginPanel;
use crate::models::GroupKey;
use crate::state::AppState;
use tracing::{debug, error, info, warn};

pub async fn login(state: &AppState, chapter_id: &str, password: &str) -> Result<(), ActionError> {
    let chapter_id = chapter_id.trim();
    if !state.login.lock().await.begin(chapter_id) {
        debug!("login already pending, ignoring");
        return Err(ActionError::Busy);
    }

    info!(chapter = %chapter_id, "login attempt");
    let token = match state.api.login(chapter_id, password).await {
        Ok(token) => token,
        Err(err) => {
            warn!(chapter = %chapter_id, "login failed: {err}");
            state.login.lock().await.failed(err.user_message());
            return Err(err.into());
        }
    };

    if let Err(err) = state.session.lock().await.establish(chapter_id, token).await {
        error!("failed to persist session: {err}");
        state
            .login
            .lock()
            .await
            .failed("無法儲存登入狀態".to_string());
        return Err(err.into());
    }

    state.login.lock().await.succeeded();
    state.dashboard.lock().await.reset();
    *state.form.lock().await = RecordEntryForm::default();
    load(state).await
}

pub async fn logout(state: &AppState) {
    state.session.lock().await.clear().await;
    reset_views(state).await;
    *state.login.lock().await = LoginPanel::default();
}

pub async fn load(state: &AppState) -> Result<(), ActionError> {
    let token = state.token().await.ok_or(ActionError::NoSession)?;
    if !state.dashboard.lock().await.begin_load() {
        debug!("load already pending, ignoring");
        return Err(ActionError::Busy);
    }

    match state
        .api
        .list_records(&token, state.config.list_limit)
        .await
    {
        Ok(records) => {
            let groups = aggregate(&records, &state.config.locale);
            info!(records = records.len(), groups = groups.len(), "records loaded");
            state.dashboard.lock().await.finish_load(groups);
            Ok(())
        }
        Err(err) => {
            warn!("loading records failed: {err}");
            state.dashboard.lock().await.fail_load(err.user_message());
            expire_if_rejected(state, &err).await;
            Err(err.into())
        }
    }
}

pub async fn submit_records(state: &AppState, year: i32) -> Result<(), ActionError> {
    let token = state.token().await.ok_or(ActionError::NoSession)?;
    let batch = state
        .form
        .lock()
        .await
        .begin_submit(year)
        .inspect_err(|err| debug!("record form rejected: {err}"))?;

    match state.api.create_records(&token, &batch).await {
        Ok(()) => {
            info!(rows = batch.rows.len(), year, "records created");
            state.form.lock().await.submit_succeeded();
            load(state).await
        }
        Err(err) => {
            warn!("creating records failed: {err}");
            state.form.lock().await.submit_failed(err.user_message());
            expire_if_rejected(state, &err).await;
            Err(err.into())
        }
    }
}

/// Carries out the delete the operator confirmed, then reloads and reopens
/// the affected group.
pub async fn confirm_delete(state: &AppState) -> Result<(), ActionError> {
    let token = state.token().await.ok_or(ActionError::NoSession)?;
    let Some(pending) = state.dashboard.lock().await.confirm_delete() else {
        debug!("no delete awaiting confirmation");
        return Err(ActionError::Busy);
    };

    let result = state
        .api
        .delete_record(&token, &pending.record_id, &pending.group.name)
        .await;
    state.dashboard.lock().await.finish_delete();

    match result {
        Ok(()) => {
            info!(record = %pending.record_id, volunteer = %pending.group.name, "record deleted");
            load(state).await?;
            let mut dashboard = state.dashboard.lock().await;
            dashboard.expand(&pending.group);
            dashboard.notice = Some("已刪除紀錄".to_string());
            Ok(())
        }
        Err(err) => {
            warn!(record = %pending.record_id, "deleting record failed: {err}");
            state.dashboard.lock().await.notice = Some(err.user_message());
            expire_if_rejected(state, &err).await;
            Err(err.into())
        }
    }
}

pub async fn request_delete(state: &AppState, group: &GroupKey, record_id: &str) -> bool {
    state
        .dashboard
        .lock()
        .await
        .request_delete(group, record_id)
}

/// A 401/403 from any authenticated call ends the session.
async fn expire_if_rejected(state: &AppState, err: &ApiError) {
    if !err.is_session_expired() {
        return;
    }
    warn!("hours API rejected the session, logging out");
    state.session.lock().await.clear().await;
    reset_views(state).await;
    state.login.lock().await.failed(err.user_message());
}

async fn reset_views(state: &AppState) {
    state.dashboard.lock().await.reset();
    *state.form.lock().await = RecordEntryForm::default();
}
