use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub frameworks: Vec<Framework>,
    #[serde(default)]
    pub database_types: Vec<DatabaseType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framework {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseType {
    pub id: String,
    pub name: String,
}

/// Compute plan. Prices and sizes are display strings as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub storage: String,
    pub bandwidth: String,
    pub memory: String,
    pub cpu: String,
    pub monthly_cost: String,
    pub price_per_hour: String,
    pub description: String,
}
