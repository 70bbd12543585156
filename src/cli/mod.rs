pub mod args;
pub mod meetings;
pub mod projects;
pub mod session;

pub use args::{Cli, CliCommand};
pub use meetings::handle_meeting_command;
pub use projects::handle_project_command;
pub use session::handle_session_command;
