use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::api::TaskGateway;
use crate::error::FormError;
use crate::models::{
    NewDailyTask, NewSingleTask, NewTask, NewTaskCommon, NewTaskInstance, Priority, TaskCategory, TaskRecord,
};

pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: String,
    pub weekdays: Vec<String>,
    pub daily_task: Option<i64>,
    pub date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn toggle_weekday(&mut self, day: &str) {
        if let Some(pos) = self.weekdays.iter().position(|d| d.eq_ignore_ascii_case(day)) {
            self.weekdays.remove(pos);
        } else {
            self.weekdays.push(day.to_string());
        }
    }

    /// Unparsable input clears the field, which then fails the required check.
    pub fn set_daily_task(&mut self, input: &str) {
        self.daily_task = input.trim().parse().ok();
    }

    pub fn set_date(&mut self, input: &str) {
        self.date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok();
    }
}

/// Draft of a new task for the selected category.
pub struct TaskForm {
    category: TaskCategory,
    draft: TaskDraft,
}

impl TaskForm {
    pub fn new(category: TaskCategory) -> Self {
        TaskForm {
            category,
            draft: TaskDraft::default(),
        }
    }

    pub fn category(&self) -> TaskCategory {
        self.category
    }

    /// Discards the current draft.
    pub fn set_category(&mut self, category: TaskCategory) {
        self.category = category;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.draft = TaskDraft::default();
    }

    pub fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut TaskDraft {
        &mut self.draft
    }

    pub fn build_payload(&self, now: DateTime<Utc>) -> Result<NewTask, FormError> {
        let draft = &self.draft;
        if draft.title.trim().is_empty() {
            return Err(FormError::MissingField("title"));
        }

        let common = NewTaskCommon::new(draft.title.trim().to_string(), draft.description.clone(), draft.priority);

        let payload = match self.category {
            TaskCategory::Single => {
                let due_date = if draft.due_date.trim().is_empty() {
                    now.to_rfc3339_opts(SecondsFormat::Millis, true)
                } else {
                    draft.due_date.trim().to_string()
                };
                NewTask::Single(NewSingleTask { common, due_date })
            }
            TaskCategory::Daily => NewTask::Daily(NewDailyTask {
                common,
                weekdays: draft.weekdays.iter().map(|day| day.to_lowercase()).collect(),
                is_active: true,
            }),
            TaskCategory::Instance => {
                let daily_task = draft.daily_task.ok_or(FormError::MissingField("daily_task"))?;
                let date = draft.date.ok_or(FormError::MissingField("date"))?;
                NewTask::Instance(NewTaskInstance {
                    common,
                    daily_task,
                    date,
                })
            }
        };
        Ok(payload)
    }

    /// On success the draft resets; on failure it is kept for a retry.
    pub async fn submit(&mut self, gateway: &dyn TaskGateway) -> Result<TaskRecord, FormError> {
        let payload = self.build_payload(Utc::now())?;
        match gateway.create(&payload).await {
            Ok(created) => {
                log::info!("Created {} task {}", self.category, created.id());
                self.reset();
                Ok(created)
            }
            Err(e) => {
                log::error!("Failed to create task: {}", e);
                Err(e.into())
            }
        }
    }
}
