//! Task mutation commands.

use clap::Subcommand;
use tickbridge_core::engine::commands::{CreateSubtask, CreateTask, UpdateTask};
use tickbridge_core::{CommandForwarder, RefreshHandle};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Owning project ID
        #[arg(long)]
        project_id: String,
        /// Task description
        #[arg(long)]
        content: Option<String>,
        /// Due date (RFC 3339)
        #[arg(long)]
        due_date: Option<String>,
        /// Priority: none, low, medium, high
        #[arg(long)]
        priority: Option<String>,
        /// Treat the due date as an all-day date
        #[arg(long)]
        all_day: bool,
    },
    /// Update an existing task
    Update {
        /// Task ID
        id: String,
        /// Owning project ID
        #[arg(long)]
        project_id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        content: Option<String>,
        /// New due date (RFC 3339)
        #[arg(long)]
        due_date: Option<String>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
    },
    /// Mark a task complete
    Complete {
        /// Task ID
        id: String,
        #[arg(long)]
        project_id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
        #[arg(long)]
        project_id: String,
    },
    /// Subtask operations
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Create a subtask under a parent task
    Create {
        /// Subtask title
        title: String,
        /// Parent task ID
        #[arg(long)]
        parent_task_id: String,
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        content: Option<String>,
    },
    /// Mark a subtask complete
    Complete {
        /// Subtask ID
        id: String,
        #[arg(long)]
        project_id: String,
    },
}

pub fn run(action: TaskAction) -> super::CliResult {
    let rt = super::runtime()?;
    let client = super::authenticated_client(&rt)?;
    let forwarder = CommandForwarder::new(client, RefreshHandle::new());

    match action {
        TaskAction::Create {
            title,
            project_id,
            content,
            due_date,
            priority,
            all_day,
        } => {
            let task = rt.block_on(forwarder.create_task(CreateTask {
                title,
                project_id,
                content,
                due_date,
                priority,
                all_day,
            }))?;
            println!("Task created: {} ({})", task.title, task.id);
        }
        TaskAction::Update {
            id,
            project_id,
            title,
            content,
            due_date,
            priority,
        } => {
            let task = rt.block_on(forwarder.update_task(UpdateTask {
                task_id: id,
                project_id,
                title,
                content,
                due_date,
                priority,
            }))?;
            println!("Task updated: {} ({})", task.title, task.id);
        }
        TaskAction::Complete { id, project_id } => {
            rt.block_on(forwarder.complete_task(&project_id, &id))?;
            println!("Task completed: {id}");
        }
        TaskAction::Delete { id, project_id } => {
            rt.block_on(forwarder.delete_task(&project_id, &id))?;
            println!("Task deleted: {id}");
        }
        TaskAction::Subtask { action } => match action {
            SubtaskAction::Create {
                title,
                parent_task_id,
                project_id,
                content,
            } => {
                let task = rt.block_on(forwarder.create_subtask(CreateSubtask {
                    parent_task_id,
                    project_id,
                    title,
                    content,
                }))?;
                println!("Subtask created: {} ({})", task.title, task.id);
            }
            SubtaskAction::Complete { id, project_id } => {
                rt.block_on(forwarder.complete_subtask(&project_id, &id))?;
                println!("Subtask completed: {id}");
            }
        },
    }
    Ok(())
}
