use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::models::{NewTask, OrderBy, Paginated, TaskCategory, TaskPage, TaskPatch, TaskRecord};

/// CRUD access to the three task resources.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Fetches one page. Cancelling `cancel` abandons the request with [`ApiError::Canceled`].
    async fn list(
        &self,
        category: TaskCategory,
        page: u32,
        ordering: Option<&OrderBy>,
        cancel: Option<&CancellationToken>,
    ) -> Result<TaskPage, ApiError>;

    async fn get(&self, category: TaskCategory, id: i64) -> Result<TaskRecord, ApiError>;

    async fn create(&self, task: &NewTask) -> Result<TaskRecord, ApiError>;

    /// Partial update. Returns the server's copy when the response carries one.
    async fn update(&self, category: TaskCategory, id: i64, patch: &TaskPatch) -> Result<Option<TaskRecord>, ApiError>;

    async fn remove(&self, category: TaskCategory, id: i64) -> Result<(), ApiError>;

    async fn toggle_complete(&self, category: TaskCategory, id: i64) -> Result<TaskRecord, ApiError>;
}

pub struct HttpTaskGateway {
    client: ApiClient,
}

impl HttpTaskGateway {
    pub fn new(client: ApiClient) -> Self {
        HttpTaskGateway { client }
    }
}

fn item_path(category: TaskCategory, id: i64) -> String {
    format!("{}{}/", category.endpoint(), id)
}

#[async_trait]
impl TaskGateway for HttpTaskGateway {
    async fn list(
        &self,
        category: TaskCategory,
        page: u32,
        ordering: Option<&OrderBy>,
        cancel: Option<&CancellationToken>,
    ) -> Result<TaskPage, ApiError> {
        let mut query = vec![("page", page.to_string())];
        if let Some(order) = ordering {
            query.push(("ordering", order.to_param()));
        }

        let envelope: Paginated<serde_json::Value> = self.client.get(category.endpoint(), &query, cancel).await?;

        let mut results = Vec::with_capacity(envelope.results.len());
        for value in envelope.results {
            match TaskRecord::from_value(category, value) {
                Ok(record) => results.push(record),
                Err(e) => log::warn!("Skipping malformed {} task: {}", category, e),
            }
        }

        Ok(TaskPage {
            results,
            has_next: envelope.next.is_some(),
            has_previous: envelope.previous.is_some(),
        })
    }

    async fn get(&self, category: TaskCategory, id: i64) -> Result<TaskRecord, ApiError> {
        let value: serde_json::Value = self.client.get(&item_path(category, id), &[], None).await?;
        Ok(TaskRecord::from_value(category, value)?)
    }

    async fn create(&self, task: &NewTask) -> Result<TaskRecord, ApiError> {
        let category = task.category();
        log::debug!("Creating {} task", category);
        let value: serde_json::Value = self.client.post(category.endpoint(), task, None).await?;
        Ok(TaskRecord::from_value(category, value)?)
    }

    async fn update(&self, category: TaskCategory, id: i64, patch: &TaskPatch) -> Result<Option<TaskRecord>, ApiError> {
        let value: serde_json::Value = self.client.patch(&item_path(category, id), patch, None).await?;
        Ok(TaskRecord::from_value(category, value).ok())
    }

    async fn remove(&self, category: TaskCategory, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(category, id), None).await
    }

    async fn toggle_complete(&self, category: TaskCategory, id: i64) -> Result<TaskRecord, ApiError> {
        let path = format!("{}toggle-complete/", item_path(category, id));
        let value: serde_json::Value = self.client.post(&path, &serde_json::json!({}), None).await?;
        Ok(TaskRecord::from_value(category, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_paths() {
        assert_eq!(item_path(TaskCategory::Single, 4), "/tasks_manager/tasks/4/");
        assert_eq!(item_path(TaskCategory::Instance, 12), "/tasks_manager/task-instances/12/");
    }
}
