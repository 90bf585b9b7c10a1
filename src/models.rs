use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    Single,
    Daily,
    Instance,
}

const COMMON_FIELDS: [&str; 9] = [
    "id",
    "title",
    "description",
    "priority",
    "postponed_count",
    "smart_priority",
    "is_completed",
    "created_at",
    "updated_at",
];

const SINGLE_FIELDS: [&str; 10] = [
    "id",
    "title",
    "description",
    "priority",
    "postponed_count",
    "smart_priority",
    "is_completed",
    "created_at",
    "updated_at",
    "due_date",
];

const DAILY_FIELDS: [&str; 11] = [
    "id",
    "title",
    "description",
    "priority",
    "postponed_count",
    "smart_priority",
    "is_completed",
    "created_at",
    "updated_at",
    "weekdays",
    "is_active",
];

const INSTANCE_FIELDS: [&str; 11] = [
    "id",
    "title",
    "description",
    "priority",
    "postponed_count",
    "smart_priority",
    "is_completed",
    "created_at",
    "updated_at",
    "daily_task",
    "date",
];

impl TaskCategory {
    pub const ALL: [TaskCategory; 3] = [TaskCategory::Single, TaskCategory::Daily, TaskCategory::Instance];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Single => "single",
            TaskCategory::Daily => "daily",
            TaskCategory::Instance => "instance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::Single => "Single Task",
            TaskCategory::Daily => "Daily Task",
            TaskCategory::Instance => "Task Instance",
        }
    }

    /// REST collection path for this category.
    pub fn endpoint(&self) -> &'static str {
        match self {
            TaskCategory::Single => "/tasks_manager/tasks/",
            TaskCategory::Daily => "/tasks_manager/daily-tasks/",
            TaskCategory::Instance => "/tasks_manager/task-instances/",
        }
    }

    /// Field names a record of this category carries, usable as ordering keys.
    pub fn ordering_fields(&self) -> &'static [&'static str] {
        match self {
            TaskCategory::Single => &SINGLE_FIELDS,
            TaskCategory::Daily => &DAILY_FIELDS,
            TaskCategory::Instance => &INSTANCE_FIELDS,
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(TaskCategory::Single),
            "daily" => Ok(TaskCategory::Daily),
            "instance" => Ok(TaskCategory::Instance),
            other => Err(format!("unknown task category '{}' (expected single, daily or instance)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "very low")]
    VeryLow,
    #[serde(rename = "low")]
    Low,
    #[default]
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "very high")]
    VeryHigh,
}

impl Priority {
    /// Selector order, most urgent first.
    pub const ALL: [Priority; 5] = [
        Priority::VeryHigh,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::VeryLow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::VeryLow => "very low",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::VeryHigh => "very high",
        }
    }

    /// 1 = very high .. 5 = very low, matching the selector order.
    pub fn from_digit(digit: u8) -> Option<Priority> {
        match digit {
            1..=5 => Some(Self::ALL[(digit - 1) as usize]),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| format!("unknown priority '{}'", s))
    }
}

/// Fields every task variant carries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskCommon {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub postponed_count: u32,
    #[serde(default)]
    pub smart_priority: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SingleTask {
    #[serde(flatten)]
    pub common: TaskCommon,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyTask {
    #[serde(flatten)]
    pub common: TaskCommon,
    #[serde(default)]
    pub weekdays: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskInstance {
    #[serde(flatten)]
    pub common: TaskCommon,
    pub daily_task: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskRecord {
    Single(SingleTask),
    Daily(DailyTask),
    Instance(TaskInstance),
}

impl TaskRecord {
    /// Decodes a backend record; the category is known from the resource it came from.
    pub fn from_value(category: TaskCategory, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match category {
            TaskCategory::Single => TaskRecord::Single(serde_json::from_value(value)?),
            TaskCategory::Daily => TaskRecord::Daily(serde_json::from_value(value)?),
            TaskCategory::Instance => TaskRecord::Instance(serde_json::from_value(value)?),
        })
    }

    pub fn category(&self) -> TaskCategory {
        match self {
            TaskRecord::Single(_) => TaskCategory::Single,
            TaskRecord::Daily(_) => TaskCategory::Daily,
            TaskRecord::Instance(_) => TaskCategory::Instance,
        }
    }

    pub fn common(&self) -> &TaskCommon {
        match self {
            TaskRecord::Single(t) => &t.common,
            TaskRecord::Daily(t) => &t.common,
            TaskRecord::Instance(t) => &t.common,
        }
    }

    fn common_mut(&mut self) -> &mut TaskCommon {
        match self {
            TaskRecord::Single(t) => &mut t.common,
            TaskRecord::Daily(t) => &mut t.common,
            TaskRecord::Instance(t) => &mut t.common,
        }
    }

    pub fn id(&self) -> i64 {
        self.common().id
    }

    pub fn title(&self) -> &str {
        &self.common().title
    }

    pub fn priority(&self) -> Priority {
        self.common().priority
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.common_mut().priority = priority;
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.common_mut().is_completed = completed;
    }

    pub fn field_names(&self) -> &'static [&'static str] {
        self.category().ordering_fields()
    }
}

/// Ordering key sent as the `ordering` query parameter; `-` prefix for descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            descending: true,
        }
    }

    pub fn to_param(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (field, descending) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if field.is_empty() {
            return Err("ordering field cannot be empty".to_string());
        }
        Ok(OrderBy {
            field: field.to_string(),
            descending,
        })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "↓ {}", self.field)
        } else {
            write!(f, "↑ {}", self.field)
        }
    }
}

/// Paginated envelope returned by the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskPage {
    pub results: Vec<TaskRecord>,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tool {
    pub title: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub base_route: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTaskCommon {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub postponed_count: u32,
    pub smart_priority: bool,
    pub is_completed: bool,
}

impl NewTaskCommon {
    /// Server-maintained counters and flags always start cleared.
    pub fn new(title: String, description: String, priority: Priority) -> Self {
        NewTaskCommon {
            title,
            description,
            priority,
            postponed_count: 0,
            smart_priority: false,
            is_completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSingleTask {
    #[serde(flatten)]
    pub common: NewTaskCommon,
    pub due_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDailyTask {
    #[serde(flatten)]
    pub common: NewTaskCommon,
    pub weekdays: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTaskInstance {
    #[serde(flatten)]
    pub common: NewTaskCommon,
    pub daily_task: i64,
    pub date: NaiveDate,
}

/// Creation payload; the variant decides the resource it is posted to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NewTask {
    Single(NewSingleTask),
    Daily(NewDailyTask),
    Instance(NewTaskInstance),
}

impl NewTask {
    pub fn category(&self) -> TaskCategory {
        match self {
            NewTask::Single(_) => TaskCategory::Single,
            NewTask::Daily(_) => TaskCategory::Daily,
            NewTask::Instance(_) => TaskCategory::Instance,
        }
    }

    pub fn common(&self) -> &NewTaskCommon {
        match self {
            NewTask::Single(t) => &t.common,
            NewTask::Daily(t) => &t.common,
            NewTask::Instance(t) => &t.common,
        }
    }
}

/// Partial update body; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn priority(priority: Priority) -> Self {
        TaskPatch {
            priority: Some(priority),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_endpoints() {
        assert_eq!(TaskCategory::Single.endpoint(), "/tasks_manager/tasks/");
        assert_eq!(TaskCategory::Daily.endpoint(), "/tasks_manager/daily-tasks/");
        assert_eq!(TaskCategory::Instance.endpoint(), "/tasks_manager/task-instances/");
        assert_eq!("Daily".parse::<TaskCategory>().unwrap(), TaskCategory::Daily);
        assert!("weekly".parse::<TaskCategory>().is_err());
    }

    #[test]
    fn ordering_fields_extend_common_fields() {
        for category in TaskCategory::ALL {
            let fields = category.ordering_fields();
            assert!(COMMON_FIELDS.iter().all(|f| fields.contains(f)));
        }
        assert!(TaskCategory::Single.ordering_fields().contains(&"due_date"));
        assert!(!TaskCategory::Single.ordering_fields().contains(&"weekdays"));
        assert!(TaskCategory::Instance.ordering_fields().contains(&"daily_task"));
    }

    #[test]
    fn priority_parsing() {
        assert_eq!("very high".parse::<Priority>().unwrap(), Priority::VeryHigh);
        assert_eq!("Very_Low".parse::<Priority>().unwrap(), Priority::VeryLow);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::from_digit(1), Some(Priority::VeryHigh));
        assert_eq!(Priority::from_digit(5), Some(Priority::VeryLow));
        assert_eq!(Priority::from_digit(6), None);
        assert_eq!(serde_json::to_value(Priority::VeryLow).unwrap(), json!("very low"));
    }

    #[test]
    fn decodes_instance_record() {
        let value = json!({
            "id": 7,
            "title": "Stretch",
            "description": "",
            "priority": "high",
            "postponed_count": 2,
            "smart_priority": true,
            "is_completed": false,
            "created_at": "2024-05-01T10:00:00Z",
            "daily_task": 3,
            "date": "2024-05-02"
        });
        let record = TaskRecord::from_value(TaskCategory::Instance, value).unwrap();
        assert_eq!(record.category(), TaskCategory::Instance);
        assert_eq!(record.id(), 7);
        assert_eq!(record.priority(), Priority::High);
        match record {
            TaskRecord::Instance(t) => {
                assert_eq!(t.daily_task, 3);
                assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
                assert_eq!(t.common.postponed_count, 2);
            }
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let value = json!({"id": 1, "title": "x", "priority": "urgent"});
        assert!(TaskRecord::from_value(TaskCategory::Single, value).is_err());
    }

    #[test]
    fn order_by_param() {
        assert_eq!(OrderBy::desc("priority").to_param(), "-priority");
        assert_eq!("-title".parse::<OrderBy>().unwrap(), OrderBy::desc("title"));
        assert_eq!("title".parse::<OrderBy>().unwrap(), OrderBy::asc("title"));
        assert!("-".parse::<OrderBy>().is_err());
    }

    #[test]
    fn single_payload_shape() {
        let task = NewTask::Single(NewSingleTask {
            common: NewTaskCommon::new("Pay rent".into(), String::new(), Priority::High),
            due_date: "2024-06-01T09:00:00Z".into(),
        });
        let body = serde_json::to_value(&task).unwrap();
        assert_eq!(
            body,
            json!({
                "title": "Pay rent",
                "description": "",
                "priority": "high",
                "postponed_count": 0,
                "smart_priority": false,
                "is_completed": false,
                "due_date": "2024-06-01T09:00:00Z"
            })
        );
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::from_digit(3), Some(Priority::default()));
    }

    #[test]
    fn patch_only_sends_set_fields() {
        let body = serde_json::to_value(TaskPatch::priority(Priority::Low)).unwrap();
        assert_eq!(body, json!({"priority": "low"}));
    }
}
