//! Application facade: wires authentication, the API client, and the
//! task timer together behind the operations the CLI exposes.
//!
//! The timer survives across invocations by persisting its snapshot to
//! a state file in the user cache directory after every transition.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use zoho_projects_api::endpoints::logs::AddTimeLog;
use zoho_projects_api::endpoints::portals::{ListPortals, Portal};
use zoho_projects_api::endpoints::projects::{ListProjects, Project};
use zoho_projects_api::endpoints::tasks::{ListAssignedTasks, ListProjectTasks, Task};
use zoho_projects_api::endpoints::timers::{PauseTimer, StartTimer, StopTimer};
use zoho_projects_api::endpoints::{PortalId, ProjectId, TaskId};
use zoho_projects_api::Client;
use zpt_auth::redirect::{LoopbackListener, ManualListener};
use zpt_auth::{
    AuthCoordinator, AuthSession, FileSecretStore, RedirectVariant, Settings, TokenStore,
};

use crate::timer::{
    SystemClock, TaskRef, TaskTimer, TimeLogEntry, TimerRemote, TimerSnapshot, TimerStatus,
};

/// [`TimerRemote`] over the Zoho Projects timer and log endpoints.
/// Zoho's POST both starts and resumes the task timer.
struct ApiRemote {
    client: Client,
}

#[async_trait]
impl TimerRemote for ApiRemote {
    async fn start_timer(&self, task: &TaskRef) -> Result<()> {
        self.client
            .send(StartTimer::new(task.portal_id, task.project_id, task.task_id))
            .await?;
        Ok(())
    }

    async fn pause_timer(&self, task: &TaskRef) -> Result<()> {
        self.client
            .send(PauseTimer::new(task.portal_id, task.project_id, task.task_id))
            .await?;
        Ok(())
    }

    async fn resume_timer(&self, task: &TaskRef) -> Result<()> {
        self.client
            .send(StartTimer::new(task.portal_id, task.project_id, task.task_id))
            .await?;
        Ok(())
    }

    async fn stop_timer(&self, task: &TaskRef) -> Result<()> {
        self.client
            .send(StopTimer::new(task.portal_id, task.project_id, task.task_id))
            .await?;
        Ok(())
    }

    async fn submit_log(&self, task: &TaskRef, entry: &TimeLogEntry) -> Result<()> {
        let mut log = AddTimeLog::new(
            task.portal_id,
            task.project_id,
            task.task_id,
            entry.work_date,
            entry.hours,
            entry.minutes,
        )
        .bill_status(entry.bill_status);
        if let Some(notes) = &entry.notes {
            log = log.notes(notes.clone());
        }
        self.client.send(log).await?;
        Ok(())
    }
}

pub struct App {
    auth: AuthCoordinator,
    timer_state_path: PathBuf,
}

impl App {
    pub fn new() -> Result<Self> {
        let settings = Settings::new()?;
        let secrets = FileSecretStore::new()?;
        let auth = AuthCoordinator::new(settings, TokenStore::new(Box::new(secrets)))?;
        let timer_state_path = dirs::cache_dir()
            .ok_or_else(|| anyhow!("could not determine cache directory"))?
            .join("zpt")
            .join("timer.json");
        Ok(Self {
            auth,
            timer_state_path,
        })
    }

    /// Run the browser login over the configured redirect transport.
    pub async fn login(&self) -> Result<AuthSession> {
        let redirect = self.auth.settings().redirect.clone();
        let session = match redirect.variant {
            RedirectVariant::Loopback => {
                let mut listener = LoopbackListener::new(redirect.port);
                self.auth.login(&mut listener).await?
            }
            // Without a host process to deliver scheme activations, the
            // scheme variant degrades to pasting the redirect URL; the
            // extraction chain accepts custom-scheme URIs either way.
            RedirectVariant::Scheme | RedirectVariant::Manual => {
                let uri = format!("{}://auth/callback", redirect.scheme);
                let mut listener = ManualListener::new(&uri);
                let input = listener.input();
                let prompt = tokio::spawn(async move {
                    eprintln!("Paste the redirect URL here and press Enter:");
                    let mut line = String::new();
                    let mut reader = BufReader::new(tokio::io::stdin());
                    if reader.read_line(&mut line).await.is_ok() {
                        input.submit(line.trim().to_string());
                    }
                });
                let result = self.auth.login(&mut listener).await;
                prompt.abort();
                result?
            }
        };
        Ok(session)
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.auth.is_authenticated().await?)
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.auth.session().await
    }

    pub async fn portals(&self) -> Result<Vec<Portal>> {
        let response = self.api().await?.send(ListPortals::new()).await?;
        Ok(response.portals)
    }

    pub async fn projects(&self, portal: PortalId) -> Result<Vec<Project>> {
        let response = self.api().await?.send(ListProjects::new(portal)).await?;
        Ok(response.projects)
    }

    /// Tasks assigned to the user across the portal, or every task in
    /// one project when `project` is given.
    pub async fn tasks(&self, portal: PortalId, project: Option<ProjectId>) -> Result<Vec<Task>> {
        let client = self.api().await?;
        let tasks = match project {
            Some(project) => client.send(ListProjectTasks::new(portal, project)).await?,
            None => client.send(ListAssignedTasks::new(portal)).await?,
        };
        Ok(tasks.tasks)
    }

    pub async fn start_timer(
        &self,
        portal: PortalId,
        project: ProjectId,
        task: TaskId,
    ) -> Result<TaskRef> {
        let timer = self.timer().await?;
        let task_name = self
            .resolve_task_name(portal, project, task)
            .await
            .unwrap_or_else(|| task.to_string());
        let task_ref = TaskRef {
            portal_id: portal,
            project_id: project,
            task_id: task,
            task_name,
        };
        timer.start(task_ref.clone()).await?;
        self.save_snapshot(&timer.snapshot())?;
        Ok(task_ref)
    }

    pub async fn pause_timer(&self) -> Result<TimerStatus> {
        let timer = self.timer().await?;
        timer.pause().await?;
        self.save_snapshot(&timer.snapshot())?;
        Ok(timer.status())
    }

    pub async fn resume_timer(&self) -> Result<TimerStatus> {
        let timer = self.timer().await?;
        timer.resume().await?;
        self.save_snapshot(&timer.snapshot())?;
        Ok(timer.status())
    }

    pub async fn stop_timer(&self, notes: Option<String>) -> Result<TimeLogEntry> {
        let timer = self.timer().await?;
        let entry = timer.stop(notes).await?;
        self.save_snapshot(&timer.snapshot())?;
        Ok(entry)
    }

    /// Timer status from the persisted snapshot; never talks to the API.
    pub fn timer_status(&self) -> Result<TimerStatus> {
        Ok(self.load_snapshot()?.status(Utc::now()))
    }

    /// Elapsed time of the current session as `HH:MM:SS`.
    pub fn elapsed(&self) -> Result<String> {
        Ok(crate::timer::format_elapsed(self.timer_status()?.elapsed))
    }

    async fn api(&self) -> Result<Client> {
        let token = self
            .auth
            .access_token()
            .await?
            .ok_or_else(|| anyhow!("not signed in; run `zpt login` first"))?;
        Ok(Client::with_base_url(
            &token,
            &self.auth.settings().api_domain,
        ))
    }

    async fn timer(&self) -> Result<TaskTimer<ApiRemote>> {
        let client = self.api().await?;
        let snapshot = self.load_snapshot()?;
        Ok(TaskTimer::restore(
            ApiRemote { client },
            SystemClock,
            snapshot,
        ))
    }

    async fn resolve_task_name(
        &self,
        portal: PortalId,
        project: ProjectId,
        task: TaskId,
    ) -> Option<String> {
        let client = self.api().await.ok()?;
        let tasks = client
            .send(ListProjectTasks::new(portal, project))
            .await
            .ok()?;
        tasks.tasks.into_iter().find(|t| t.id == task).map(|t| t.name)
    }

    fn load_snapshot(&self) -> Result<TimerSnapshot> {
        if !self.timer_state_path.exists() {
            return Ok(TimerSnapshot::default());
        }
        let json = fs::read_to_string(&self.timer_state_path)
            .context("could not read the timer state file")?;
        Ok(serde_json::from_str(&json).context("timer state file is corrupt")?)
    }

    fn save_snapshot(&self, snapshot: &TimerSnapshot) -> Result<()> {
        if let Some(parent) = self.timer_state_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.timer_state_path, serde_json::to_string_pretty(snapshot)?)
            .context("could not write the timer state file")?;
        Ok(())
    }
}
