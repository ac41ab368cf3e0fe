use super::{BillStatus, PortalId, ProjectId, TaskId};
use crate::macros::setter;
use crate::{EmptyResponse, Endpoint};
use chrono::NaiveDate;
use reqwest::Method;

/// `POST /portal/{portal}/projects/{project}/tasks/{task}/logs` — record
/// a time log against a task. Zoho takes the payload as query
/// parameters; hours are sent in `H:MM` form and the date as
/// `MM-DD-YYYY`.
#[derive(Debug, Clone)]
pub struct AddTimeLog {
    portal_id: PortalId,
    project_id: ProjectId,
    task_id: TaskId,
    work_date: NaiveDate,
    bill_status: BillStatus,
    hours: u32,
    minutes: u32,
    notes: Option<String>,
}

impl AddTimeLog {
    pub fn new(
        portal_id: PortalId,
        project_id: ProjectId,
        task_id: TaskId,
        work_date: NaiveDate,
        hours: u32,
        minutes: u32,
    ) -> Self {
        Self {
            portal_id,
            project_id,
            task_id,
            work_date,
            bill_status: BillStatus::default(),
            hours,
            minutes,
            notes: None,
        }
    }

    setter!(bill_status: BillStatus);
    setter!(opt notes: String);
}

impl Endpoint for AddTimeLog {
    type Response = EmptyResponse;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        format!(
            "portal/{}/projects/{}/tasks/{}/logs",
            self.portal_id, self.project_id, self.task_id
        )
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            (
                "date".to_string(),
                self.work_date.format("%m-%d-%Y").to_string(),
            ),
            ("bill_status".to_string(), self.bill_status.to_string()),
            (
                "hours".to_string(),
                format!("{}:{:02}", self.hours, self.minutes),
            ),
        ];
        if let Some(notes) = &self.notes {
            query.push(("notes".to_string(), notes.clone()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_encodes_date_hours_and_bill_status() {
        let log = AddTimeLog::new(
            PortalId::from(1),
            ProjectId::from(2),
            TaskId::from(3),
            NaiveDate::from_ymd_opt(2026, 8, 23).unwrap(),
            1,
            5,
        )
        .notes("standup prep");

        let query = log.query();
        assert!(query.contains(&("date".to_string(), "08-23-2026".to_string())));
        assert!(query.contains(&("bill_status".to_string(), "Billable".to_string())));
        assert!(query.contains(&("hours".to_string(), "1:05".to_string())));
        assert!(query.contains(&("notes".to_string(), "standup prep".to_string())));
    }

    #[test]
    fn sub_minute_logs_encode_as_zero_zero() {
        let log = AddTimeLog::new(
            PortalId::from(1),
            ProjectId::from(2),
            TaskId::from(3),
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            0,
            0,
        );
        assert!(log.query().contains(&("hours".to_string(), "0:00".to_string())));
    }
}
