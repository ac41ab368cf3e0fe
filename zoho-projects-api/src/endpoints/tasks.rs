use super::{PortalId, ProjectId, TaskId};
use crate::macros::setter;
use crate::Endpoint;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub percent_complete: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

/// `GET /portal/{portal}/tasks/` — tasks assigned to the authenticated
/// user across the portal.
#[derive(Debug, Clone)]
pub struct ListAssignedTasks {
    portal_id: PortalId,
}

impl ListAssignedTasks {
    pub fn new(portal_id: PortalId) -> Self {
        Self { portal_id }
    }
}

impl Endpoint for ListAssignedTasks {
    type Response = TasksResponse;

    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        format!("portal/{}/tasks/", self.portal_id)
    }
}

/// `GET /portal/{portal}/projects/{project}/tasks/`.
#[derive(Debug, Clone)]
pub struct ListProjectTasks {
    portal_id: PortalId,
    project_id: ProjectId,
    owner: Option<String>,
}

impl ListProjectTasks {
    pub fn new(portal_id: PortalId, project_id: ProjectId) -> Self {
        Self {
            portal_id,
            project_id,
            owner: None,
        }
    }

    setter!(opt owner: String);
}

impl Endpoint for ListProjectTasks {
    type Response = TasksResponse;

    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        format!(
            "portal/{}/projects/{}/tasks/",
            self.portal_id, self.project_id
        )
    }

    fn query(&self) -> Vec<(String, String)> {
        match &self.owner {
            Some(owner) => vec![("owner".to_string(), owner.clone())],
            None => Vec::new(),
        }
    }
}
