//! Command-line argument definitions using clap derive.

use clap::{Parser, Subcommand};

/// Track time against Zoho Projects tasks from the terminal.
#[derive(Parser, Debug)]
#[command(name = "zpt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in to Zoho Projects through the browser
    Login,

    /// Sign out and remove stored tokens
    Logout,

    /// Show sign-in state and the current timer
    Status,

    /// List the portals you belong to
    Portals,

    /// List projects in a portal
    Projects {
        /// Portal id
        portal: u64,
    },

    /// List tasks assigned to you, or all tasks in one project
    Tasks {
        /// Portal id
        portal: u64,

        /// Restrict to a single project
        #[arg(long)]
        project: Option<u64>,
    },

    /// Start the timer on a task
    Start {
        /// Portal id
        portal: u64,

        /// Project id
        project: u64,

        /// Task id
        task: u64,
    },

    /// Pause the running timer
    Pause,

    /// Resume the paused timer
    Resume,

    /// Stop the timer and log the elapsed time
    Stop {
        /// Notes to attach to the time log
        #[arg(long)]
        notes: Option<String>,
    },
}
