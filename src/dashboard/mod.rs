pub mod state;
pub mod view;

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::WebAppBackend;
use crate::errors::ApiError;
use crate::models::{WebAppDetail, WebAppListItem};
use crate::poller::DetailSink;
use crate::refresher;

pub use state::{DashboardState, ViewToggles};
pub use view::DashboardView;

pub const NO_DEPLOYMENT_RECORD: &str = "No deployment record available.";

/// Shared dashboard: backend-derived data plus the view state the user acts on.
///
/// State is never locked across an await; every action reads or writes it in
/// short synchronous sections around backend calls.
pub struct Dashboard<B> {
    backend: Arc<B>,
    state: RwLock<DashboardState>,
    refresh_interval: Duration,
    refresher: Mutex<Option<RefresherSlot>>,
}

struct RefresherSlot {
    web_app_id: String,
    cancel: CancellationToken,
}

impl<B: WebAppBackend> Dashboard<B> {
    pub fn new(backend: Arc<B>, refresh_interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            backend,
            state: RwLock::new(DashboardState::default()),
            refresh_interval,
            refresher: Mutex::new(None),
        })
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn read(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn refresher_slot(&self) -> MutexGuard<'_, Option<RefresherSlot>> {
        self.refresher.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> DashboardState {
        self.read().clone()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView::from_state(&self.read())
    }

    /// Load the web app list; a failure is kept as the list error.
    pub async fn load_list(&self) {
        {
            let mut state = self.write();
            state.list_loading = true;
            state.list_error = None;
        }

        let result = self.backend.list_webapps().await;
        self.apply_list(result);
    }

    /// Store a list fetched elsewhere, e.g. after an auto-deploy finished.
    pub fn apply_list(&self, result: Result<Vec<WebAppListItem>, ApiError>) {
        let mut state = self.write();
        match result {
            Ok(webapps) => {
                state.webapps = webapps;
                state.list_error = None;
            }
            Err(e) => {
                warn!(error = %e, "failed to load webapps");
                state.list_error = Some(e.message());
            }
        }
        state.list_loading = false;
    }

    /// Select a row and load its detail.
    pub async fn select(self: &Arc<Self>, web_app_id: &str) {
        self.write().select(web_app_id);
        self.sync_refresher();
        self.fetch_detail(web_app_id).await;
    }

    pub fn close_detail(self: &Arc<Self>) {
        self.write().close_detail();
        self.sync_refresher();
    }

    /// Re-fetch the selected detail; no-op without a selection.
    pub async fn retry_detail(&self) {
        let selected = self.read().selected_webapp_id.clone();
        if let Some(id) = selected {
            self.fetch_detail(&id).await;
        }
    }

    pub async fn fetch_detail(&self, web_app_id: &str) {
        let ticket = self.write().begin_detail_fetch();
        let result = self.backend.get_webapp(web_app_id).await;

        let mut state = self.write();
        let applied = match result {
            Ok(detail) => state.apply_detail(ticket, detail),
            Err(e) => {
                warn!(web_app_id, error = %e, "failed to load webapp detail");
                state.apply_detail_error(ticket, web_app_id, e.message())
            }
        };
        if !applied {
            debug!(web_app_id, ticket, "discarded stale detail response");
        }
        state.end_detail_fetch();
    }

    /// Start the current deployment of the selected web app, then reload it.
    pub async fn start_current_deployment(&self) {
        let target = {
            let mut state = self.write();
            let (Some(selected), Some(detail)) = (&state.selected_webapp_id, &state.detail) else {
                return;
            };
            let selected = selected.clone();
            match detail.current_deployment().map(|d| d.id.clone()) {
                Some(deployment_id) => {
                    state.start_deployment_loading = true;
                    state.start_deployment_error = None;
                    Some((selected, deployment_id))
                }
                None => {
                    state.start_deployment_error = Some(NO_DEPLOYMENT_RECORD.to_string());
                    None
                }
            }
        };
        let Some((web_app_id, deployment_id)) = target else {
            return;
        };

        match self.backend.start_deployment(&deployment_id).await {
            Ok(resp) => {
                debug!(%web_app_id, %deployment_id, status = %resp.status, "deployment started");
                self.fetch_detail(&web_app_id).await;
            }
            Err(e) => {
                warn!(%web_app_id, %deployment_id, error = %e, "failed to start deployment");
                self.write().start_deployment_error = Some(e.message());
            }
        }
        self.write().start_deployment_loading = false;
    }

    pub fn toggle_env_vars(&self, environment_id: &str) {
        self.write().toggles.toggle_env_vars(environment_id);
    }

    pub fn toggle_public_ip(&self, environment_id: &str) {
        self.write().toggles.toggle_public_ip(environment_id);
    }

    pub fn toggle_deployments(&self) {
        self.write().toggles.toggle_deployments();
    }

    pub(crate) fn begin_auto_deploy(self: &Arc<Self>, web_app_id: &str) {
        {
            let mut state = self.write();
            state.auto_deploy_error = None;
            state.auto_deploying_webapp_id = Some(web_app_id.to_string());
        }
        self.sync_refresher();
    }

    pub(crate) fn finish_auto_deploy(self: &Arc<Self>, error: Option<String>) {
        {
            let mut state = self.write();
            state.auto_deploying_webapp_id = None;
            if error.is_some() {
                state.auto_deploy_error = error;
            }
        }
        self.sync_refresher();
    }

    /// Drop the auto-deploying indicator without recording an outcome.
    pub(crate) fn abandon_auto_deploy(self: &Arc<Self>) {
        self.write().auto_deploying_webapp_id = None;
        self.sync_refresher();
    }

    /// Whether the detail refresher for `web_app_id` should keep running.
    pub fn should_refresh(&self, web_app_id: &str) -> bool {
        self.read().auto_deploying_selection() == Some(web_app_id)
    }

    /// Start or stop the detail refresher so that it runs exactly while the
    /// selected web app is being auto-deployed.
    fn sync_refresher(self: &Arc<Self>) {
        let target = self.read().auto_deploying_selection().map(str::to_string);
        let mut slot = self.refresher_slot();

        if let Some(current) = slot.as_ref() {
            if target.as_deref() == Some(current.web_app_id.as_str()) {
                return;
            }
            current.cancel.cancel();
            *slot = None;
        }

        if let Some(web_app_id) = target {
            let cancel = CancellationToken::new();
            refresher::spawn_detail_refresher(
                self.clone(),
                web_app_id.clone(),
                self.refresh_interval,
                cancel.clone(),
            );
            *slot = Some(RefresherSlot { web_app_id, cancel });
        }
    }

    /// Stop background refreshing; used when the dashboard is torn down.
    pub fn shutdown(&self) {
        if let Some(current) = self.refresher_slot().take() {
            current.cancel.cancel();
        }
    }
}

impl<B: WebAppBackend> DetailSink for Dashboard<B> {
    fn dispatch(&self, _web_app_id: &str) -> u64 {
        self.write().issue_ticket()
    }

    /// Poller results only reach the view while their web app is selected.
    fn publish(&self, ticket: u64, detail: &WebAppDetail) {
        if !self.write().apply_detail(ticket, detail.clone()) {
            debug!(web_app_id = detail.id(), ticket, "poller detail not applied");
        }
    }
}
