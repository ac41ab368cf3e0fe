//! Task timer operations.
//!
//! Zoho models the per-task timer as a sub-resource:
//! POST starts it, PUT pauses it, DELETE stops it. All three answer with
//! an empty body.

use super::{PortalId, ProjectId, TaskId};
use crate::{EmptyResponse, Endpoint};
use reqwest::Method;

macro_rules! timer_endpoint {
    ($(#[$doc:meta])* $name:ident, $method:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            portal_id: PortalId,
            project_id: ProjectId,
            task_id: TaskId,
        }

        impl $name {
            pub fn new(portal_id: PortalId, project_id: ProjectId, task_id: TaskId) -> Self {
                Self {
                    portal_id,
                    project_id,
                    task_id,
                }
            }
        }

        impl Endpoint for $name {
            type Response = EmptyResponse;

            fn method(&self) -> Method {
                $method
            }

            fn path(&self) -> String {
                format!(
                    "portal/{}/projects/{}/tasks/{}/timer",
                    self.portal_id, self.project_id, self.task_id
                )
            }
        }
    };
}

timer_endpoint!(
    /// `POST .../tasks/{task}/timer` — start (or resume) the task timer.
    StartTimer,
    Method::POST
);
timer_endpoint!(
    /// `PUT .../tasks/{task}/timer` — pause the running task timer.
    PauseTimer,
    Method::PUT
);
timer_endpoint!(
    /// `DELETE .../tasks/{task}/timer` — stop and discard the task timer.
    StopTimer,
    Method::DELETE
);
