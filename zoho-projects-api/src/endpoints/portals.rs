use super::PortalId;
use crate::Endpoint;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub id: PortalId,
    pub name: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub gmt_time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalsResponse {
    pub portals: Vec<Portal>,
}

/// `GET /portals/` — every portal the authenticated user belongs to.
#[derive(Debug, Clone, Default)]
pub struct ListPortals;

impl ListPortals {
    pub fn new() -> Self {
        Self
    }
}

impl Endpoint for ListPortals {
    type Response = PortalsResponse;

    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "portals/".to_string()
    }
}
