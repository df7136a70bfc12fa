use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clubpilot::{App, AppConfig};

#[derive(Parser)]
#[command(name = "clubpilot", version, about = "Companion-app automation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session in the browser profile.
    Login,
    /// Solve all open daily tasks, opening earned packs after each.
    RunDailies,
    /// Open every available pack and store the items.
    OpenPacks,
    /// Solve a single named task.
    Solve {
        /// Task name as shown on its tile, e.g. "Daily Bronze Upgrade".
        name: String,
    },
    /// Print the account snapshot as JSON.
    Status,
    /// List tasks with a registered solver.
    ListSolvers,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let app = App::new(AppConfig::load()?);

    match cli.command {
        Command::Login => {
            app.login().await?;
            println!("logged in");
        }
        Command::RunDailies => {
            let solved = app.run_dailies().await?;
            println!("solved {solved} daily task(s)");
        }
        Command::OpenPacks => {
            let opened = app.open_packs().await?;
            println!("opened {opened} pack(s)");
        }
        Command::Solve { name } => {
            app.solve(&name).await?;
            println!("solved \"{name}\"");
        }
        Command::Status => {
            let status = app.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::ListSolvers => {
            for task in app.supported_tasks() {
                println!("{task}");
            }
        }
    }
    Ok(())
}
