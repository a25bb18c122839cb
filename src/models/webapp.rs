use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of `GET /api/webapps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppListItem {
    pub id: String,
    pub name: String,
    pub region: String,
    pub plan: String,
    pub framework: String,
    pub repo_provider: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `GET /api/webapps/{id}`.
///
/// `deployments` is ordered newest first; index 0 is the current deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppDetail {
    #[serde(flatten)]
    pub webapp: WebAppListItem,
    #[serde(default)]
    pub environments: Vec<EnvironmentSummary>,
    #[serde(default)]
    pub deployments: Vec<DeploymentSummary>,
}

impl WebAppDetail {
    pub fn id(&self) -> &str {
        &self.webapp.id
    }

    pub fn current_deployment(&self) -> Option<&DeploymentSummary> {
        self.deployments.first()
    }

    pub fn find_deployment(&self, deployment_id: &str) -> Option<&DeploymentSummary> {
        self.deployments.iter().find(|d| d.id == deployment_id)
    }

    /// Only a `pending` or `failed` current deployment may be (re)started.
    pub fn can_start_deployment(&self) -> bool {
        self.current_deployment()
            .map(|d| d.status().is_startable())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSummary {
    pub id: String,
    pub web_app_id: String,
    pub name: String,
    pub branch: String,
    pub port: u16,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub instance: Option<InstanceSummary>,
    #[serde(default)]
    pub deployments: Vec<DeploymentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    pub id: String,
    pub cpu: u32,
    pub ram: u32,
    pub storage: u32,
    pub instance_type: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub id: String,
    pub web_app_id: String,
    pub environment_id: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DeploymentSummary {
    pub fn status(&self) -> DeploymentStatus {
        DeploymentStatus::parse(&self.status)
    }
}

/// Deployment status as reported by the backend. The set is open; anything
/// unrecognised is kept verbatim (lower-cased) in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    Pending,
    Active,
    Failed,
    Other(String),
}

impl DeploymentStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.to_lowercase();
        match normalized.as_str() {
            "pending" => Self::Pending,
            "active" => Self::Active,
            "failed" => Self::Failed,
            _ => Self::Other(normalized),
        }
    }

    /// `active` and `failed` end polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Active | Self::Failed)
    }

    pub fn is_startable(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Failed => write!(f, "failed"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentLogEntry {
    pub id: String,
    pub deployment_id: String,
    pub level: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDeploymentResponse {
    pub status: String,
    #[serde(default)]
    pub public_ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebAppRequest {
    pub name: String,
    pub region: String,
    pub plan: String,
    pub framework: String,
    pub repository: RepositoryRef,
    pub port: u16,
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub provider: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebAppResponse {
    pub web_app_id: String,
    pub deployment_id: String,
    pub status: String,
}
