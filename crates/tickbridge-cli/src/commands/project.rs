//! Project inspection commands built on a one-shot snapshot fetch.

use chrono::Utc;
use clap::Subcommand;
use tickbridge_core::BridgeConfig;

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List projects with task counts
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a project's tasks
    Show {
        /// Project ID
        id: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ProjectAction) -> super::CliResult {
    let config = BridgeConfig::load()?;
    let rt = super::runtime()?;
    let client = super::authenticated_client(&rt)?;

    match action {
        ProjectAction::List { json } => {
            let snapshot = rt.block_on(client.fetch_snapshot())?;
            let summaries = snapshot.summaries(Utc::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for s in &summaries {
                    println!(
                        "{}  {}  open: {}  overdue: {}  due today: {}",
                        s.project_id, s.name, s.task_count, s.overdue_count, s.due_today_count
                    );
                }
            }
        }
        ProjectAction::Show { id, json } => {
            let project = rt.block_on(client.project_data(&id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                println!("{} ({})", project.name, project.id);
                for task in project
                    .tasks
                    .iter()
                    .filter(|t| config.include_completed || !t.completed)
                {
                    let due = task
                        .due_date
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_else(|| "-".into());
                    let mark = if task.completed { "x" } else { " " };
                    println!(
                        "[{}] {}  {}  priority: {}  due: {}",
                        mark,
                        task.id,
                        task.title,
                        task.priority.as_str(),
                        due
                    );
                }
            }
        }
    }
    Ok(())
}
