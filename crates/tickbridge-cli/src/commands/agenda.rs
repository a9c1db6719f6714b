//! Agenda command: upcoming tasks with due dates, calendar-style.

use chrono::{Duration, Utc};
use clap::Args;
use tickbridge_core::BridgeConfig;

#[derive(Args)]
pub struct AgendaArgs {
    /// How many days ahead to look
    #[arg(long, default_value = "7")]
    pub days: i64,
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: AgendaArgs) -> super::CliResult {
    let config = BridgeConfig::load()?;
    let rt = super::runtime()?;
    let client = super::authenticated_client(&rt)?;

    let snapshot = rt.block_on(client.fetch_snapshot())?;
    let now = Utc::now();
    let end = now + Duration::days(args.days.max(0));
    let agenda = snapshot.agenda(now, end, config.include_completed);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&agenda)?);
        return Ok(());
    }

    if agenda.is_empty() {
        println!("Nothing due in the next {} day(s)", args.days);
        return Ok(());
    }

    for task in &agenda {
        let project = snapshot
            .project(&task.project_id)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        // agenda entries always carry a due date
        let due = task
            .due_date
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();
        println!(
            "{}  {}  [{}]  priority: {}",
            due,
            task.title,
            project,
            task.priority.as_str()
        );
    }

    if let Some(next) = snapshot.next_due(now) {
        println!("\nNext up: {} ({})", next.title, next.id);
    }

    Ok(())
}
