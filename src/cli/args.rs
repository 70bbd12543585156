use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gitintel")]
#[command(
    about = "Link GitHub repositories to projects and turn meeting recordings into issues",
    long_about = None
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the API server (default)
    Serve,
    /// Print version information
    Version,
    /// Create and list projects
    Project(ProjectCliArgs),
    /// Inspect meetings and their issues
    Meeting(MeetingCliArgs),
    /// Issue or revoke API session tokens
    Session(SessionCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ProjectCliArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Link a GitHub repository to a new project
    Create {
        /// Project name (at least 3 characters)
        #[arg(long)]
        name: String,
        /// Repository URL, e.g. https://github.com/owner/repo
        #[arg(long)]
        github_url: String,
        /// Access token for private repositories
        #[arg(long)]
        github_token: Option<String>,
        /// Login of the owning user (created if missing)
        #[arg(long)]
        owner: String,
    },
    /// List projects, newest first
    List {
        /// Only show projects owned by this login
        #[arg(long)]
        owner: Option<String>,
        /// Maximum number of results to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[derive(ClapArgs, Debug)]
pub struct MeetingCliArgs {
    #[command(subcommand)]
    pub command: MeetingCommand,
}

#[derive(Subcommand, Debug)]
pub enum MeetingCommand {
    /// List a project's meetings
    List {
        /// Project id
        #[arg(long)]
        project: String,
        /// Maximum number of results to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show a meeting and its issues
    Show {
        /// Meeting id
        id: String,
    },
}

#[derive(ClapArgs, Debug)]
pub struct SessionCliArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Create a session token for a user (created if missing)
    Create {
        #[arg(long)]
        login: String,
    },
    /// Delete every session of a user
    Revoke {
        #[arg(long)]
        login: String,
    },
}
