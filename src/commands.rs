use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};

use toolnest::api::auth::Credentials;
use toolnest::app::ToolNest;
use toolnest::form::TaskForm;
use toolnest::models::{OrderBy, Priority, TaskCategory, TaskPatch, TaskRecord, Tool};

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input).context("Failed to read input")?;
    Ok(input.trim().to_string())
}

fn read_credentials(email: &str, confirm: bool) -> Result<Credentials> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    if password.is_empty() {
        bail!("Password cannot be empty");
    }
    if confirm {
        let again = rpassword::prompt_password("Confirm password: ").context("Failed to read password confirmation")?;
        if password != again {
            bail!("Passwords do not match");
        }
    }
    Ok(Credentials {
        email: email.trim().to_string(),
        password,
    })
}

pub async fn signup(app: &ToolNest, email: &str) -> Result<()> {
    let credentials = read_credentials(email, true)?;
    let response = app
        .auth
        .signup(&credentials)
        .await
        .map_err(|e| anyhow!("Signup failed: {}", e.user_message()))?;
    app.session.save_session(&response.token);
    println!("✓ Account created, logged in as {}", credentials.email);
    Ok(())
}

pub async fn login(app: &ToolNest, email: &str) -> Result<()> {
    let credentials = read_credentials(email, false)?;
    let response = app
        .auth
        .login(&credentials)
        .await
        .map_err(|e| anyhow!("Login failed: {}", e.user_message()))?;
    app.session.save_session(&response.token);
    println!("✓ Logged in as {}", credentials.email);
    Ok(())
}

pub fn logout(app: &ToolNest) {
    app.session.clear_session();
    println!("✓ Logged out");
}

pub fn status(app: &ToolNest) {
    if app.session.is_logged_in() {
        println!("Logged in ({})", app.config.api_url);
    } else {
        println!("Not logged in ({})", app.config.api_url);
    }
}

pub async fn send_otp(app: &ToolNest) -> Result<()> {
    app.auth
        .send_otp()
        .await
        .map_err(|_| anyhow!("Failed to send OTP. Try again."))?;
    println!("A one-time password has been sent to your email address.");
    Ok(())
}

pub async fn verify_otp(app: &ToolNest, code: &str) -> Result<()> {
    app.auth
        .verify_otp(code)
        .await
        .map_err(|_| anyhow!("Invalid OTP. Try again."))?;
    println!("✓ OTP verified");
    Ok(())
}

pub async fn list_tools(app: &ToolNest) -> Result<()> {
    let tools = app.tools.list_tools().await.context("Failed to fetch tools")?;
    if tools.is_empty() {
        println!("No tools installed.");
        return Ok(());
    }
    for tool in &tools {
        println!("{} (/{})", tool.title, tool.base_route.trim_matches('/'));
        for feature in &tool.description {
            println!("  • {}", feature);
        }
    }
    Ok(())
}

pub fn find_tool<'a>(tools: &'a [Tool], query: &str) -> Option<&'a Tool> {
    let query = query.trim().trim_matches('/').to_lowercase();
    tools.iter().find(|tool| {
        tool.title.to_lowercase() == query || tool.base_route.trim_matches('/').to_lowercase() == query
    })
}

/// Sends an OTP, asks for it and verifies it. Returns the tool on success.
pub async fn explore(app: &ToolNest, query: &str) -> Result<Tool> {
    let tools = app.tools.list_tools().await.context("Failed to fetch tools")?;
    let tool = find_tool(&tools, query)
        .cloned()
        .ok_or_else(|| anyhow!("No installed tool named '{}'", query))?;

    send_otp(app).await?;
    let code = prompt_line("One-Time Password: ")?;
    verify_otp(app, &code).await?;
    Ok(tool)
}

fn print_task(task: &TaskRecord) {
    let common = task.common();
    let done = if common.is_completed { "x" } else { " " };
    println!("[{}] #{:<5} {:<40} [{}]", done, common.id, common.title, common.priority);
}

fn print_task_details(task: &TaskRecord) {
    let common = task.common();
    println!("Task #{} ({})", common.id, task.category().label());
    println!("Title:          {}", common.title);
    println!(
        "Description:    {}",
        if common.description.is_empty() { "—" } else { common.description.as_str() }
    );
    println!("Priority:       {}", common.priority);
    println!(
        "Smart priority: {}",
        if common.smart_priority { "Enabled" } else { "Disabled" }
    );
    println!(
        "Status:         {}",
        if common.is_completed { "Completed" } else { "Pending" }
    );
    println!("Postponed:      {} time(s)", common.postponed_count);
    match task {
        TaskRecord::Single(t) => println!("Due:            {}", t.due_date.as_deref().unwrap_or("—")),
        TaskRecord::Daily(t) => {
            println!("Weekdays:       {}", t.weekdays.join(", "));
            println!("Active:         {}", if t.is_active { "yes" } else { "no" });
        }
        TaskRecord::Instance(t) => {
            println!("Daily task:     #{}", t.daily_task);
            println!("Date:           {}", t.date);
        }
    }
    if let Some(created) = &common.created_at {
        println!("Created:        {}", created);
    }
    if let Some(updated) = &common.updated_at {
        println!("Updated:        {}", updated);
    }
}

pub async fn list_tasks(app: &ToolNest, category: TaskCategory, page: u32, ordering: Option<OrderBy>) -> Result<()> {
    let page_data = app
        .tasks
        .list(category, page.max(1), ordering.as_ref(), None)
        .await
        .context("Failed to fetch tasks")?;

    println!("{} tasks, page {}", category.label(), page.max(1));
    if page_data.results.is_empty() {
        println!("No Task Available");
    }
    for task in &page_data.results {
        print_task(task);
    }
    let mut nav = Vec::new();
    if page_data.has_previous {
        nav.push(format!("prev: --page {}", page.max(1) - 1));
    }
    if page_data.has_next {
        nav.push(format!("next: --page {}", page.max(1) + 1));
    }
    if !nav.is_empty() {
        println!("({})", nav.join(", "));
    }
    Ok(())
}

pub async fn show_task(app: &ToolNest, category: TaskCategory, id: i64) -> Result<()> {
    let task = app.tasks.get(category, id).await.context("Failed to fetch task")?;
    print_task_details(&task);
    Ok(())
}

pub struct CreateArgs {
    pub category: TaskCategory,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub weekdays: Vec<String>,
    pub daily_task: Option<String>,
    pub date: Option<String>,
}

pub async fn create_task(app: &ToolNest, args: CreateArgs) -> Result<()> {
    let mut form = TaskForm::new(args.category);
    let draft = form.draft_mut();
    draft.title = args.title;
    draft.description = args.description;
    draft.priority = args.priority;
    if let Some(due_date) = args.due_date {
        draft.due_date = due_date;
    }
    for day in &args.weekdays {
        draft.toggle_weekday(day.trim());
    }
    if let Some(daily_task) = &args.daily_task {
        draft.set_daily_task(daily_task);
    }
    if let Some(date) = &args.date {
        draft.set_date(date);
    }

    let created = form
        .submit(app.tasks.as_ref())
        .await
        .map_err(|e| anyhow!("Failed to create task: {}", e))?;
    println!("✓ Task created successfully!");
    print_task(&created);
    Ok(())
}

pub async fn set_priority(app: &ToolNest, category: TaskCategory, id: i64, priority: Priority) -> Result<()> {
    let current = app.tasks.get(category, id).await.context("Failed to fetch task")?;
    if current.priority() == priority {
        println!("Task #{} already has priority '{}'", id, priority);
        return Ok(());
    }
    app.tasks
        .update(category, id, &TaskPatch::priority(priority))
        .await
        .context("Failed to update priority")?;
    println!("✓ Task #{} priority set to '{}'", id, priority);
    Ok(())
}

pub async fn toggle_task(app: &ToolNest, category: TaskCategory, id: i64) -> Result<()> {
    let task = app
        .tasks
        .toggle_complete(category, id)
        .await
        .context("Failed to toggle task")?;
    print_task(&task);
    Ok(())
}

pub async fn delete_task(app: &ToolNest, category: TaskCategory, id: i64) -> Result<()> {
    app.tasks.remove(category, id).await.context("Failed to delete task")?;
    println!("✓ Task #{} deleted", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(title: &str, route: &str) -> Tool {
        Tool {
            title: title.to_string(),
            description: Vec::new(),
            base_route: route.to_string(),
        }
    }

    #[test]
    fn finds_tool_by_title_or_route() {
        let tools = vec![tool("Task Manager", "tasks_manager"), tool("Notes", "/notes/")];
        assert_eq!(find_tool(&tools, "task manager").unwrap().title, "Task Manager");
        assert_eq!(find_tool(&tools, "/tasks_manager").unwrap().title, "Task Manager");
        assert_eq!(find_tool(&tools, "notes").unwrap().title, "Notes");
        assert!(find_tool(&tools, "calendar").is_none());
    }
}
