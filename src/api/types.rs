use serde::{Deserialize, Serialize};

use crate::models::{Metadata, Plan};

/// Query parameters for repository listing
#[derive(Debug, Deserialize)]
pub struct RepositoryParams {
    pub org: Option<String>,
}

/// Query parameters for branch listing
#[derive(Debug, Deserialize)]
pub struct BranchParams {
    pub owner: String,
    pub repo: String,
}

/// Everything the create form offers to choose from
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    #[serde(flatten)]
    pub metadata: Metadata,
    pub plans: Vec<Plan>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebAppResult {
    pub web_app_id: String,
    pub deployment_id: String,
    pub status: String,
    /// Whether the new deployment was handed to the auto-deploy reconciler
    pub auto_deploy: bool,
}
