use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;

use acsched::commands;
use acsched::config::AppConfig;
use acsched::logging;
use acsched::repl::readline;
use acsched::sink::ShellSink;
use acsched_core::{FileStore, Scheduler, SchedulerError, SystemClock, TimerAction};

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();

    let mut config = AppConfig::load();
    let mut scheduler = start(&config).map_err(|e| e.to_string())?;

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &scheduler, &mut config) {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Clear) => {
                scheduler.cancel_all().map_err(|e| e.to_string())?;
                println!("all timers cleared");
                scheduler = start(&config).map_err(|e| e.to_string())?;
            }
            Ok(Outcome::Quit) => {
                scheduler.stop();
                break;
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

fn start(config: &AppConfig) -> Result<Scheduler, SchedulerError> {
    let store = FileStore::open(config.store_path())?;
    Scheduler::start(
        &config.scheduler,
        store,
        Arc::new(SystemClock),
        ShellSink::from_config(config),
    )
}

#[derive(Parser)]
#[command(version, about = "acsched")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a timer at local HH:MM
    Add {
        #[arg(long)]
        at: String,
        #[arg(long)]
        action: TimerAction,
        #[arg(long)]
        daily: bool,
    },
    Remove {
        #[arg(long)]
        id: u8,
    },
    Enable {
        #[arg(long)]
        id: u8,
    },
    Disable {
        #[arg(long)]
        id: u8,
    },
    /// Run a timer's action now
    Fire {
        #[arg(long)]
        id: u8,
    },
    Show {
        #[arg(long)]
        id: u8,
    },
    List,
    Next,
    Save,
    /// Set the local offset in seconds from GMT
    #[command(allow_negative_numbers = true)]
    Timezone {
        #[arg(long)]
        offset: i32,
        #[arg(long, default_value_t = 0)]
        dst: i32,
    },
    /// Disable and delete every timer
    Clear,
    Exit,
}

enum Outcome {
    Continue,
    Clear,
    Quit,
}

fn respond(line: &str, scheduler: &Scheduler, config: &mut AppConfig) -> Result<Outcome, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "acsched".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Add { at, action, daily }) => commands::add(scheduler, &at, action, daily)?,
        Some(Commands::Remove { id }) => commands::remove(scheduler, id)?,
        Some(Commands::Enable { id }) => commands::set_enabled(scheduler, id, true)?,
        Some(Commands::Disable { id }) => commands::set_enabled(scheduler, id, false)?,
        Some(Commands::Fire { id }) => commands::fire(scheduler, id)?,
        Some(Commands::Show { id }) => commands::show(scheduler, id)?,
        Some(Commands::List) => commands::list(scheduler),
        Some(Commands::Next) => commands::next(scheduler),
        Some(Commands::Save) => commands::save(scheduler)?,
        Some(Commands::Timezone { offset, dst }) => {
            commands::timezone(scheduler, config, offset, dst)?
        }
        Some(Commands::Clear) => return Ok(Outcome::Clear),
        Some(Commands::Exit) => {
            commands::exit()?;
            return Ok(Outcome::Quit);
        }
        None => {}
    }
    Ok(Outcome::Continue)
}
