use async_trait::async_trait;

use super::models::FloorModels;

/// Where the starting floor comes from.
#[async_trait]
pub trait FloorModelSource: Send + Sync {
    async fn load_models(&self) -> Result<FloorModels, String>;
}
