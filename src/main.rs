mod cli;
mod commands;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, OtpAction, TaskAction};
use commands::CreateArgs;
use toolnest::app::ToolNest;
use toolnest::config::Config;
use tracing_subscriber::EnvFilter;
use ui::{run_tui, Tab};

fn init_logging(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir).context("Failed to create data directory")?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .context("Failed to open log file")?;

    // the fmt subscriber also bridges `log` records
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_logging(&config)?;

    if let Some(Commands::Completions { shell }) = &cli.command {
        use clap_complete::{generate, Shell};
        let shell_enum = match shell.to_lowercase().as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "elvish" => Shell::Elvish,
            "powershell" => Shell::PowerShell,
            other => {
                println!("Unsupported shell: {}", other);
                return Ok(());
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "toolnest", &mut std::io::stdout());
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let app = ToolNest::open(config)?;
    log::info!("Using backend {}", app.config.api_url);

    match cli.command {
        Some(Commands::Signup { email }) => {
            rt.block_on(commands::signup(&app, &email))?;
        }
        Some(Commands::Login { email }) => {
            rt.block_on(commands::login(&app, &email))?;
        }
        Some(Commands::Logout) => {
            commands::logout(&app);
        }
        Some(Commands::Status) => {
            commands::status(&app);
        }
        Some(Commands::Otp { action }) => match action {
            OtpAction::Send => rt.block_on(commands::send_otp(&app))?,
            OtpAction::Verify { code } => rt.block_on(commands::verify_otp(&app, &code))?,
        },
        Some(Commands::Tools) => {
            rt.block_on(commands::list_tools(&app))?;
        }
        Some(Commands::Explore { tool }) => {
            let tool = rt.block_on(commands::explore(&app, &tool))?;
            if tool.base_route.trim_matches('/') == "tasks_manager" {
                run_tui(&app, rt.handle().clone(), Tab::Tasks)?;
            } else {
                println!("Open {}/{}", app.config.api_url, tool.base_route.trim_matches('/'));
            }
        }
        Some(Commands::Tasks { action }) => match action {
            TaskAction::List {
                category,
                page,
                ordering,
            } => rt.block_on(commands::list_tasks(&app, category, page, ordering))?,
            TaskAction::Show { category, id } => rt.block_on(commands::show_task(&app, category, id))?,
            TaskAction::Create {
                category,
                title,
                description,
                priority,
                due_date,
                weekdays,
                daily_task,
                date,
            } => {
                let args = CreateArgs {
                    category,
                    title,
                    description,
                    priority,
                    due_date,
                    weekdays,
                    daily_task,
                    date,
                };
                rt.block_on(commands::create_task(&app, args))?
            }
            TaskAction::Priority { category, id, priority } => {
                rt.block_on(commands::set_priority(&app, category, id, priority))?
            }
            TaskAction::Toggle { category, id } => rt.block_on(commands::toggle_task(&app, category, id))?,
            TaskAction::Delete { category, id } => rt.block_on(commands::delete_task(&app, category, id))?,
        },
        Some(Commands::Tui) => {
            run_tui(&app, rt.handle().clone(), Tab::Dashboard)?;
        }
        Some(Commands::Completions { .. }) => {}
        None => {
            // Default behavior: launch TUI
            run_tui(&app, rt.handle().clone(), Tab::Dashboard)?;
        }
    }

    Ok(())
}
