use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::DashboardState;
use crate::models::{DeploymentSummary, EnvironmentSummary, InstanceSummary, WebAppDetail, WebAppListItem};

/// Deployments shown before the list is expanded.
pub const DEPLOYMENT_PREVIEW_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Success,
    Destructive,
    Secondary,
    Outline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: String,
    pub variant: BadgeVariant,
}

impl StatusBadge {
    pub fn new(status: Option<&str>) -> Self {
        Self {
            label: status_label(status),
            variant: status.map(status_variant).unwrap_or(BadgeVariant::Outline),
        }
    }
}

pub fn status_variant(status: &str) -> BadgeVariant {
    match status.to_lowercase().as_str() {
        "active" | "success" => BadgeVariant::Success,
        "failed" | "error" => BadgeVariant::Destructive,
        "pending" => BadgeVariant::Secondary,
        _ => BadgeVariant::Outline,
    }
}

/// `"aCTIVE"` -> `"Active"`, missing -> `"Unknown"`.
pub fn status_label(status: Option<&str>) -> String {
    let Some(status) = status.filter(|s| !s.is_empty()) else {
        return "Unknown".to_string();
    };
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => "Unknown".to_string(),
    }
}

/// Hide every digit and dot of an address.
pub fn mask_public_ip(ip: &str) -> String {
    ip.chars()
        .map(|c| if c.is_ascii_digit() || c == '.' { '*' } else { c })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub webapps: Vec<WebAppListItem>,
    pub list_loading: bool,
    pub list_error: Option<String>,
    pub selected_webapp_id: Option<String>,
    pub detail: Option<DetailView>,
    pub detail_loading: bool,
    pub detail_error: Option<String>,
    pub start_deployment_loading: bool,
    pub start_deployment_error: Option<String>,
    pub auto_deploying_webapp_id: Option<String>,
    pub auto_deploy_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    #[serde(flatten)]
    pub webapp: WebAppListItem,
    /// Badge of the current deployment, `pending` when there is none.
    pub status: StatusBadge,
    pub can_start_deployment: bool,
    pub is_deploying: bool,
    pub is_auto_deploying: bool,
    pub environment_count: usize,
    pub deployment_count: usize,
    pub environments: Vec<EnvironmentView>,
    pub deployments: Vec<DeploymentView>,
    pub deployments_expanded: bool,
    pub has_more_deployments: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentView {
    pub id: String,
    pub name: String,
    pub branch: String,
    pub port: u16,
    pub status: StatusBadge,
    pub instance: Option<InstanceView>,
    pub env_vars_expanded: bool,
    /// Only present while expanded.
    pub env_vars: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    pub instance_type: String,
    pub cpu: u32,
    pub ram: u32,
    pub storage: u32,
    pub status: StatusBadge,
    pub public_ip: String,
    pub public_ip_revealed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentView {
    pub id: String,
    pub status: StatusBadge,
    pub created_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl DashboardView {
    pub fn from_state(state: &DashboardState) -> Self {
        Self {
            webapps: state.webapps.clone(),
            list_loading: state.list_loading,
            list_error: state.list_error.clone(),
            selected_webapp_id: state.selected_webapp_id.clone(),
            detail: state
                .detail
                .as_ref()
                .map(|detail| DetailView::build(detail, state)),
            detail_loading: state.detail_loading(),
            detail_error: state.detail_error.clone(),
            start_deployment_loading: state.start_deployment_loading,
            start_deployment_error: state.start_deployment_error.clone(),
            auto_deploying_webapp_id: state.auto_deploying_webapp_id.clone(),
            auto_deploy_error: state.auto_deploy_error.clone(),
        }
    }
}

impl DetailView {
    fn build(detail: &WebAppDetail, state: &DashboardState) -> Self {
        let toggles = &state.toggles;
        let is_auto_deploying = state.auto_deploying_selection() == Some(detail.id());
        let status = detail
            .current_deployment()
            .map(|d| d.status.as_str())
            .unwrap_or("pending");

        let deployments: Vec<DeploymentView> = detail
            .deployments
            .iter()
            .take(if toggles.deployments_expanded {
                usize::MAX
            } else {
                DEPLOYMENT_PREVIEW_COUNT
            })
            .map(DeploymentView::from)
            .collect();

        Self {
            webapp: detail.webapp.clone(),
            status: StatusBadge::new(Some(status)),
            can_start_deployment: detail.can_start_deployment(),
            is_deploying: state.start_deployment_loading || is_auto_deploying,
            is_auto_deploying,
            environment_count: detail.environments.len(),
            deployment_count: detail.deployments.len(),
            environments: detail
                .environments
                .iter()
                .map(|env| {
                    EnvironmentView::build(
                        env,
                        toggles.env_vars_expanded.contains(&env.id),
                        toggles.public_ip_revealed.contains(&env.id),
                    )
                })
                .collect(),
            deployments,
            deployments_expanded: toggles.deployments_expanded,
            has_more_deployments: detail.deployments.len() > DEPLOYMENT_PREVIEW_COUNT,
        }
    }
}

impl EnvironmentView {
    fn build(env: &EnvironmentSummary, env_vars_expanded: bool, public_ip_revealed: bool) -> Self {
        Self {
            id: env.id.clone(),
            name: env.name.clone(),
            branch: env.branch.clone(),
            port: env.port,
            status: StatusBadge::new(Some(env.status.as_str())),
            instance: env
                .instance
                .as_ref()
                .map(|i| InstanceView::build(i, public_ip_revealed)),
            env_vars_expanded,
            env_vars: env_vars_expanded.then(|| env.env_vars.clone()),
        }
    }
}

impl InstanceView {
    fn build(instance: &InstanceSummary, revealed: bool) -> Self {
        let public_ip = match (&instance.public_ip, revealed) {
            (Some(ip), true) => ip.clone(),
            (Some(ip), false) => mask_public_ip(ip),
            (None, _) => "-".to_string(),
        };
        Self {
            instance_type: instance.instance_type.clone(),
            cpu: instance.cpu,
            ram: instance.ram,
            storage: instance.storage,
            status: StatusBadge::new(Some(instance.status.as_str())),
            public_ip,
            public_ip_revealed: revealed,
        }
    }
}

impl From<&DeploymentSummary> for DeploymentView {
    fn from(d: &DeploymentSummary) -> Self {
        Self {
            id: d.id.clone(),
            status: StatusBadge::new(Some(d.status.as_str())),
            created_at: d.created_at,
            error_message: d.error_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::detail;
    use crate::models::InstanceSummary;

    #[test]
    fn status_variants() {
        assert_eq!(status_variant("Active"), BadgeVariant::Success);
        assert_eq!(status_variant("success"), BadgeVariant::Success);
        assert_eq!(status_variant("FAILED"), BadgeVariant::Destructive);
        assert_eq!(status_variant("error"), BadgeVariant::Destructive);
        assert_eq!(status_variant("pending"), BadgeVariant::Secondary);
        assert_eq!(status_variant("provisioning"), BadgeVariant::Outline);
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label(Some("aCTIVE")), "Active");
        assert_eq!(status_label(Some("pending")), "Pending");
        assert_eq!(status_label(Some("")), "Unknown");
        assert_eq!(status_label(None), "Unknown");
    }

    #[test]
    fn masks_digits_and_dots() {
        assert_eq!(mask_public_ip("10.0.12.7"), "*********");
        assert_eq!(mask_public_ip("fe80::1"), "fe**::*");
    }

    fn state_with(detail: WebAppDetail) -> DashboardState {
        let mut state = DashboardState::default();
        state.select(detail.id());
        let ticket = state.issue_ticket();
        assert!(state.apply_detail(ticket, detail));
        state
    }

    #[test]
    fn deployments_truncate_until_expanded() {
        let mut d = detail("w1", "failed");
        let template = d.deployments[0].clone();
        for i in 2..=5 {
            let mut dep = template.clone();
            dep.id = format!("d{}", i);
            d.deployments.push(dep);
        }

        let mut state = state_with(d);
        let view = DashboardView::from_state(&state);
        let detail = view.detail.unwrap();
        assert_eq!(detail.deployments.len(), DEPLOYMENT_PREVIEW_COUNT);
        assert_eq!(detail.deployment_count, 5);
        assert!(detail.has_more_deployments);
        assert!(detail.can_start_deployment);

        state.toggles.toggle_deployments();
        let view = DashboardView::from_state(&state);
        assert_eq!(view.detail.unwrap().deployments.len(), 5);
    }

    #[test]
    fn public_ip_masked_unless_revealed() {
        let mut d = detail("w1", "active");
        let ts = d.webapp.created_at;
        d.environments[0].instance = Some(InstanceSummary {
            id: "i1".into(),
            cpu: 2,
            ram: 2048,
            storage: 40,
            instance_type: "t3.small".into(),
            public_ip: Some("10.0.0.7".into()),
            status: "active".into(),
            created_at: ts,
            updated_at: ts,
        });

        let mut state = state_with(d);
        let view = DashboardView::from_state(&state);
        let env = &view.detail.as_ref().unwrap().environments[0];
        assert_eq!(env.instance.as_ref().unwrap().public_ip, "********");
        assert!(env.env_vars.is_none());

        state.toggles.toggle_public_ip("e1");
        state.toggles.toggle_env_vars("e1");
        let view = DashboardView::from_state(&state);
        let env = &view.detail.as_ref().unwrap().environments[0];
        assert_eq!(env.instance.as_ref().unwrap().public_ip, "10.0.0.7");
        assert_eq!(env.env_vars.as_ref().unwrap()["NODE_ENV"], "production");
    }

    #[test]
    fn detail_without_deployments_shows_pending() {
        let mut d = detail("w1", "active");
        d.deployments.clear();
        let view = DashboardView::from_state(&state_with(d));
        let detail = view.detail.unwrap();
        assert_eq!(detail.status.label, "Pending");
        assert!(!detail.can_start_deployment);
    }

    #[test]
    fn auto_deploying_selection_marks_deploying() {
        let mut state = state_with(detail("w1", "pending"));
        state.auto_deploying_webapp_id = Some("w1".into());
        let detail = DashboardView::from_state(&state).detail.unwrap();
        assert!(detail.is_auto_deploying);
        assert!(detail.is_deploying);
    }
}
