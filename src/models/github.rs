use serde::{Deserialize, Serialize};

/// Raw `/git/github/orgs` row.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubOrgRaw {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Raw `/git/github/repos` row.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepoRaw {
    pub name: String,
    pub full_name: String,
}

/// Raw `/git/github/branches` row.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubBranchRaw {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<GithubOrgRaw> for Organization {
    fn from(raw: GithubOrgRaw) -> Self {
        Self {
            id: raw.login.clone(),
            name: raw.login,
            avatar: raw.avatar_url,
        }
    }
}

/// Organization id used for repositories listed without an org filter.
pub const PERSONAL_ORGANIZATION: &str = "__personal__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// `owner/repo`
    pub id: String,
    pub name: String,
    pub organization_id: String,
    pub owner: Option<String>,
    pub repo_name: Option<String>,
}

impl Repository {
    pub fn from_raw(raw: GithubRepoRaw, org: Option<&str>) -> Self {
        let (owner, repo_name) = match raw.full_name.split_once('/') {
            Some((owner, repo)) => (Some(owner.to_string()), Some(repo.to_string())),
            None => (None, None),
        };
        Self {
            id: raw.full_name,
            name: raw.name,
            organization_id: org.unwrap_or(PERSONAL_ORGANIZATION).to_string(),
            owner,
            repo_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub repository_id: String,
}

impl Branch {
    pub fn from_raw(raw: GithubBranchRaw, owner: &str, repo: &str) -> Self {
        Self {
            id: raw.name.clone(),
            name: raw.name,
            repository_id: format!("{}/{}", owner, repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_splits_full_name() {
        let repo = Repository::from_raw(
            GithubRepoRaw {
                name: "demo".into(),
                full_name: "acme/demo".into(),
            },
            None,
        );
        assert_eq!(repo.id, "acme/demo");
        assert_eq!(repo.owner.as_deref(), Some("acme"));
        assert_eq!(repo.repo_name.as_deref(), Some("demo"));
        assert_eq!(repo.organization_id, PERSONAL_ORGANIZATION);
    }

    #[test]
    fn repository_keeps_org_filter() {
        let repo = Repository::from_raw(
            GithubRepoRaw {
                name: "api".into(),
                full_name: "acme/api".into(),
            },
            Some("acme"),
        );
        assert_eq!(repo.organization_id, "acme");
    }

    #[test]
    fn branch_carries_repository_id() {
        let branch = Branch::from_raw(GithubBranchRaw { name: "main".into() }, "acme", "demo");
        assert_eq!(branch.id, "main");
        assert_eq!(branch.repository_id, "acme/demo");
    }
}
