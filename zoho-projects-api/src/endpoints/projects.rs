use super::{PortalId, ProjectId};
use crate::macros::setter;
use crate::Endpoint;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

/// `GET /portal/{portal}/projects/`.
#[derive(Debug, Clone)]
pub struct ListProjects {
    portal_id: PortalId,
    status: Option<String>,
}

impl ListProjects {
    pub fn new(portal_id: PortalId) -> Self {
        Self {
            portal_id,
            status: None,
        }
    }

    setter!(opt status: String);
}

impl Endpoint for ListProjects {
    type Response = ProjectsResponse;

    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        format!("portal/{}/projects/", self.portal_id)
    }

    fn query(&self) -> Vec<(String, String)> {
        match &self.status {
            Some(status) => vec![("status".to_string(), status.clone())],
            None => Vec::new(),
        }
    }
}
