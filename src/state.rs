use crate::api::HoursApi;
use crate::config::Config;
use crate::dashboard::DashboardView;
use crate::form::RecordEntryForm;
use crate::login::LoginPanel;
use crate::session::SessionStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Each piece of view state has its own lock; actions never hold two at once
/// and never hold one across a network call.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<dyn HoursApi>,
    pub session: Arc<Mutex<SessionStore>>,
    pub dashboard: Arc<Mutex<DashboardView>>,
    pub form: Arc<Mutex<RecordEntryForm>>,
    pub login: Arc<Mutex<LoginPanel>>,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn HoursApi>, session: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            api,
            session: Arc::new(Mutex::new(session)),
            dashboard: Arc::new(Mutex::new(DashboardView::default())),
            form: Arc::new(Mutex::new(RecordEntryForm::default())),
            login: Arc::new(Mutex::new(LoginPanel::default())),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.session.lock().await.token()
    }
}
