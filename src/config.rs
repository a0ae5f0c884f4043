use clap::Args;
use std::path::PathBuf;

/// Server settings, taken from flags or `EDUSCAN_*` environment variables.
#[derive(Args, Debug, Clone)]
pub struct AppConfig {
    /// Address to bind
    #[arg(long, env = "EDUSCAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "EDUSCAN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory holding the JSON record files
    #[arg(long, env = "EDUSCAN_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Serialized scaler + classifier bundle
    #[arg(long, env = "EDUSCAN_MODEL_PATH", default_value = "models/risk_model.json")]
    pub model_path: PathBuf,
}

impl AppConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: data_dir.into(),
            model_path: model_path.into(),
        }
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.data_dir.join("student_predictions.json")
    }

    pub fn observations_path(&self) -> PathBuf {
        self.data_dir.join("parent_observations.json")
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
