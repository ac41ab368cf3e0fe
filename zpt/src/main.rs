use anyhow::Result;
use zoho_projects_api::endpoints::{PortalId, ProjectId, TaskId};
use zpt::cli::{Cli, Command};
use zpt::timer::format_elapsed;
use zpt::{logging, App};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init_logging(cli.debug)?;

    let app = App::new()?;
    match cli.command {
        Command::Login => {
            let session = app.login().await?;
            println!(
                "Signed in as {} ({})",
                session.account_label, session.account_id
            );
        }
        Command::Logout => {
            app.logout().await?;
            println!("Signed out.");
        }
        Command::Status => {
            let signed_in = app.is_authenticated().await?;
            println!("Signed in: {}", if signed_in { "yes" } else { "no" });

            let status = app.timer_status()?;
            match status.task {
                Some(task) => println!(
                    "Timer: {} on \"{}\" ({})",
                    status.phase,
                    task.task_name,
                    format_elapsed(status.elapsed)
                ),
                None => println!("Timer: stopped"),
            }
        }
        Command::Portals => {
            for portal in app.portals().await? {
                let marker = if portal.default { " (default)" } else { "" };
                println!("{}  {}{}", portal.id, portal.name, marker);
            }
        }
        Command::Projects { portal } => {
            for project in app.projects(PortalId::from(portal)).await? {
                println!("{}  {}", project.id, project.name);
            }
        }
        Command::Tasks { portal, project } => {
            let tasks = app
                .tasks(PortalId::from(portal), project.map(ProjectId::from))
                .await?;
            for task in tasks {
                let status = task
                    .status
                    .map(|s| format!("  [{}]", s.name))
                    .unwrap_or_default();
                println!("{}  {}{}", task.id, task.name, status);
            }
        }
        Command::Start {
            portal,
            project,
            task,
        } => {
            let task_ref = app
                .start_timer(
                    PortalId::from(portal),
                    ProjectId::from(project),
                    TaskId::from(task),
                )
                .await?;
            println!("Timer started for \"{}\"", task_ref.task_name);
        }
        Command::Pause => {
            let status = app.pause_timer().await?;
            println!("Timer paused at {}", format_elapsed(status.elapsed));
        }
        Command::Resume => {
            let status = app.resume_timer().await?;
            println!("Timer resumed at {}", format_elapsed(status.elapsed));
        }
        Command::Stop { notes } => {
            let entry = app.stop_timer(notes).await?;
            println!(
                "Logged {}:{:02} against \"{}\"",
                entry.hours, entry.minutes, entry.task.task_name
            );
        }
    }

    Ok(())
}
