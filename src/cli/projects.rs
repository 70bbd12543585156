use anyhow::{anyhow, Result};

use super::args::{ProjectCliArgs, ProjectCommand};
use crate::api::validation::{validate_github_url, validate_project_name};
use crate::db::{Database, NewProject, ProjectRepository, UserRepository};

pub fn handle_project_command(db: &Database, args: ProjectCliArgs) -> Result<()> {
    match args.command {
        ProjectCommand::Create {
            name,
            github_url,
            github_token,
            owner,
        } => {
            let name = validate_project_name(&name).map_err(|e| anyhow!("Invalid name: {}", e))?;
            let github_url = validate_github_url(&github_url)?
                .map_err(|e| anyhow!("Invalid GitHub url: {}", e))?;
            let new_project = NewProject {
                name,
                github_url,
                github_token: github_token.filter(|token| !token.trim().is_empty()),
            };

            let project = db.blocking(|conn| {
                let owner = UserRepository::upsert_by_login(conn, &owner)?;
                ProjectRepository::insert(conn, &owner.id, &new_project)
            })?;

            println!("Created project {} ({})", project.id, project.name);
            println!("Repository: {}", project.github_url);
            Ok(())
        }
        ProjectCommand::List { owner, limit } => {
            let projects = db.blocking(|conn| match owner.as_deref() {
                Some(login) => match UserRepository::get_by_login(conn, login)? {
                    Some(user) => ProjectRepository::list_for_owner(conn, &user.id, limit),
                    None => Err(anyhow!("No user with login '{}'", login)),
                },
                None => ProjectRepository::list(conn, limit),
            })?;

            if projects.is_empty() {
                println!("No projects found.");
                return Ok(());
            }

            println!("Found {} project(s):\n", projects.len());
            for project in projects {
                println!("ID: {}", project.id);
                println!("Name: {}", project.name);
                println!("Repository: {}", project.github_url);
                println!("Token: {}", if project.github_token.is_some() { "set" } else { "none" });
                println!("Created: {}", project.created_at);
                println!("---");
            }
            Ok(())
        }
    }
}
