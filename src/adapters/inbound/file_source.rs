use crate::domains::floor::{FloorModelSource, FloorModels};
use async_trait::async_trait;
use std::path::PathBuf;

/// Floor models read from a JSON document shaped like [`FloorModels`].
pub struct JsonFloorSource {
    path: PathBuf,
}

impl JsonFloorSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FloorModelSource for JsonFloorSource {
    async fn load_models(&self) -> Result<FloorModels, String> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| format!("Failed to read floor models {}: {}", self.path.display(), e))?;
        let models: FloorModels = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse floor models {}: {}", self.path.display(), e))?;
        models.validate().map_err(|e| e.to_string())?;
        Ok(models)
    }
}
