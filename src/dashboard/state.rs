use std::collections::HashSet;

use crate::models::{WebAppDetail, WebAppListItem};

/// Everything the dashboard shows. Persistent data is a read-mostly cache of
/// the backend; the rest is ephemeral view state.
#[derive(Debug, Default, Clone)]
pub struct DashboardState {
    pub webapps: Vec<WebAppListItem>,
    pub list_loading: bool,
    pub list_error: Option<String>,

    pub selected_webapp_id: Option<String>,
    pub detail: Option<WebAppDetail>,
    pub detail_error: Option<String>,
    detail_fetches_in_flight: u32,

    pub start_deployment_loading: bool,
    pub start_deployment_error: Option<String>,

    pub auto_deploying_webapp_id: Option<String>,
    pub auto_deploy_error: Option<String>,

    pub toggles: ViewToggles,

    // request-order guard for detail writes
    last_ticket: u64,
    applied_ticket: u64,
}

/// Expansion and masking flags of the detail panel, reset on every selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewToggles {
    pub env_vars_expanded: HashSet<String>,
    pub public_ip_revealed: HashSet<String>,
    pub deployments_expanded: bool,
}

impl ViewToggles {
    pub fn toggle_env_vars(&mut self, environment_id: &str) {
        toggle(&mut self.env_vars_expanded, environment_id);
    }

    pub fn toggle_public_ip(&mut self, environment_id: &str) {
        toggle(&mut self.public_ip_revealed, environment_id);
    }

    pub fn toggle_deployments(&mut self) {
        self.deployments_expanded = !self.deployments_expanded;
    }
}

fn toggle(set: &mut HashSet<String>, id: &str) {
    if !set.remove(id) {
        set.insert(id.to_string());
    }
}

impl DashboardState {
    pub fn detail_loading(&self) -> bool {
        self.detail_fetches_in_flight > 0
    }

    pub fn is_selected(&self, web_app_id: &str) -> bool {
        self.selected_webapp_id.as_deref() == Some(web_app_id)
    }

    /// Selected web app while it is also the one being auto-deployed.
    pub fn auto_deploying_selection(&self) -> Option<&str> {
        match (&self.selected_webapp_id, &self.auto_deploying_webapp_id) {
            (Some(selected), Some(deploying)) if selected == deploying => Some(selected),
            _ => None,
        }
    }

    /// Hand out the next fetch ticket. Tickets follow dispatch order.
    pub fn issue_ticket(&mut self) -> u64 {
        self.last_ticket += 1;
        self.last_ticket
    }

    pub(crate) fn begin_detail_fetch(&mut self) -> u64 {
        self.detail = None;
        self.detail_error = None;
        self.detail_fetches_in_flight += 1;
        self.issue_ticket()
    }

    pub(crate) fn end_detail_fetch(&mut self) {
        self.detail_fetches_in_flight = self.detail_fetches_in_flight.saturating_sub(1);
    }

    /// Apply a resolved detail unless a younger request was already applied
    /// or the web app is no longer selected. Returns whether it was applied.
    pub fn apply_detail(&mut self, ticket: u64, detail: WebAppDetail) -> bool {
        if !self.accepts(ticket, detail.id()) {
            return false;
        }
        self.applied_ticket = ticket;
        self.detail = Some(detail);
        self.detail_error = None;
        true
    }

    pub fn apply_detail_error(&mut self, ticket: u64, web_app_id: &str, message: String) -> bool {
        if !self.accepts(ticket, web_app_id) {
            return false;
        }
        self.applied_ticket = ticket;
        self.detail_error = Some(message);
        true
    }

    fn accepts(&self, ticket: u64, web_app_id: &str) -> bool {
        self.is_selected(web_app_id) && ticket >= self.applied_ticket
    }

    pub(crate) fn select(&mut self, web_app_id: &str) {
        self.start_deployment_error = None;
        self.selected_webapp_id = Some(web_app_id.to_string());
        self.toggles = ViewToggles::default();
    }

    pub(crate) fn close_detail(&mut self) {
        self.selected_webapp_id = None;
        self.detail = None;
        self.detail_error = None;
        self.detail_fetches_in_flight = 0;
        self.start_deployment_loading = false;
        self.start_deployment_error = None;
        self.toggles = ViewToggles::default();
    }
}
