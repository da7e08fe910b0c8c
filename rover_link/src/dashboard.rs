use serde::Deserialize;

use crate::errors::LinkError;
use crate::session::SessionConfig;

/// Read model served by the controller: past commands and the saved demo
/// catalog. Consumed read-only; the store behind it is the controller's.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Dashboard {
    #[serde(rename = "historial", default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub demos: Vec<DemoEntry>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "comando")]
    pub command: String,
    #[serde(rename = "origen")]
    pub source: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DemoEntry {
    #[serde(rename = "nombre_demo")]
    pub name: String,
}

pub async fn fetch_dashboard(config: &SessionConfig) -> Result<Dashboard, LinkError> {
    let response = reqwest::get(config.dashboard_url())
        .await
        .map_err(|e| LinkError::DashboardFetch(e.to_string()))?;
    response
        .json::<Dashboard>()
        .await
        .map_err(|e| LinkError::DashboardFetch(e.to_string()))
}
