use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tickbridge", version, about = "TickTick bridge CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Run the poll loop, emitting task events as JSON lines
    Watch(commands::watch::WatchArgs),
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Project inspection
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Upcoming tasks with due dates
    Agenda(commands::agenda::AgendaArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Watch(args) => commands::watch::run(args),
        Commands::Task { action } => commands::task::run(action),
        Commands::Project { action } => commands::project::run(action),
        Commands::Agenda(args) => commands::agenda::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
