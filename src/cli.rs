use clap::{Parser, Subcommand};

use toolnest::models::{OrderBy, Priority, TaskCategory};

#[derive(Parser)]
#[command(author, version, about = "ToolNest terminal client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and start a session
    Signup {
        #[arg(short, long, value_name = "EMAIL")]
        email: String,
    },
    /// Log in and start a session
    Login {
        #[arg(short, long, value_name = "EMAIL")]
        email: String,
    },
    /// End the current session
    Logout,
    /// Show whether a session is active
    Status,
    /// One-time password verification
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
    /// List installed tools
    Tools,
    /// Verify with an OTP, then open a tool
    Explore {
        #[arg(value_name = "TOOL")]
        tool: String,
    },
    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Launch TUI interface
    Tui,
    /// Print shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

#[derive(Subcommand)]
pub enum OtpAction {
    /// Ask the backend to email a one-time password
    Send,
    /// Verify a one-time password
    Verify {
        #[arg(value_name = "CODE")]
        code: String,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// List one page of tasks
    List {
        #[arg(short, long, default_value = "single")]
        category: TaskCategory,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Field name, prefix with '-' for descending (e.g. --ordering=-priority)
        #[arg(short, long, allow_hyphen_values = true)]
        ordering: Option<OrderBy>,
    },
    /// Show a single task
    Show {
        #[arg(value_name = "CATEGORY")]
        category: TaskCategory,
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Create a task
    Create {
        #[arg(short, long, default_value = "single")]
        category: TaskCategory,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Due date for single tasks; defaults to now
        #[arg(long)]
        due_date: Option<String>,
        /// Comma separated weekdays for daily tasks (e.g. Mon,Wed,Fri)
        #[arg(long, value_delimiter = ',')]
        weekdays: Vec<String>,
        /// Parent daily task id for task instances
        #[arg(long)]
        daily_task: Option<String>,
        /// Date (YYYY-MM-DD) for task instances
        #[arg(long)]
        date: Option<String>,
    },
    /// Change task priority
    Priority {
        #[arg(value_name = "CATEGORY")]
        category: TaskCategory,
        #[arg(value_name = "ID")]
        id: i64,
        #[arg(value_name = "PRIORITY")]
        priority: Priority,
    },
    /// Toggle task completion
    Toggle {
        #[arg(value_name = "CATEGORY")]
        category: TaskCategory,
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Delete a task
    Delete {
        #[arg(value_name = "CATEGORY")]
        category: TaskCategory,
        #[arg(value_name = "ID")]
        id: i64,
    },
}
