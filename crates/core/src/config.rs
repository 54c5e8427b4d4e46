use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub organization: OrganizationConfig,
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_min_files")]
    pub min_files_for_subfolder: usize,
    #[serde(default = "default_output_dir")]
    pub base_output_dir: String,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,
}

fn default_threshold() -> f32 {
    0.3
}
fn default_min_files() -> usize {
    3
}
fn default_output_dir() -> String {
    "Organized_Files".to_string()
}
fn default_provider() -> String {
    "noop".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_threshold(),
            min_files_for_subfolder: default_min_files(),
            base_output_dir: default_output_dir(),
            exclude: Vec::new(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
        }
    }
}

impl AppConfig {
    /// Threshold with out-of-range values replaced by the default.
    pub fn similarity_threshold(&self) -> f32 {
        let t = self.organization.similarity_threshold;
        if t > 0.0 && t <= 1.0 {
            t
        } else {
            default_threshold()
        }
    }

    /// Minimum group size before a subfolder is created; values below 2 fall
    /// back to the default.
    pub fn min_files_for_subfolder(&self) -> usize {
        let n = self.organization.min_files_for_subfolder;
        if n > 1 {
            n
        } else {
            default_min_files()
        }
    }
}

/// Loads configuration from an optional TOML file, falling back silently to
/// defaults on any load or parse failure.
pub fn load(path: Option<&str>) -> AppConfig {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    match settings.build().and_then(|c| c.try_deserialize()) {
        Ok(cfg) => cfg,
        Err(e) => {
            debug!("config load failed, using defaults: {e}");
            AppConfig::default()
        }
    }
}
