use crate::error::ApiError;
use crate::http::ApiClient;
use crate::models::Tool;

pub const TOOLS: &str = "/tools/";

#[derive(Clone)]
pub struct ToolsApi {
    client: ApiClient,
}

impl ToolsApi {
    pub fn new(client: ApiClient) -> Self {
        ToolsApi { client }
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>, ApiError> {
        self.client.get(TOOLS, &[], None).await
    }
}
