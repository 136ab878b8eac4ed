use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Model used for answer generation and query rewriting
    pub chat_model: String,
    /// Model used for embeddings; must match between build and query time
    pub embedding_model: String,
    /// Model used to score answers during evaluation
    pub judge_model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retry attempts for failed provider calls
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            chat_model: "qwen2.5:7b-instruct".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            judge_model: "qwen2.5:7b-instruct".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per query
    pub top_k: usize,
    /// Embedding batch size during index builds
    pub embed_batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            embed_batch_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexConfig {
    /// Directory holding persisted index snapshots; defaults to ~/.docchat/index
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config =
            toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".docchat").join("config.toml"))
    }

    /// Directory where index snapshots are persisted
    pub fn index_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.index.dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".docchat").join("index"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ollama: OllamaConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 80);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.ollama.base_url, "http://127.0.0.1:11434");
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.ollama.chat_model = "llama3.1:8b".to_string();

        let toml_string = toml::to_string(&config).unwrap();
        assert!(toml_string.contains("llama3.1:8b"));

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(deserialized.ollama.chat_model, "llama3.1:8b");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[ollama]\nbase_url = \"http://host:1234\"\nchat_model = \"m\"\nembedding_model = \"e\"\njudge_model = \"j\"\ntimeout_secs = 10\nmax_retries = 1\n").unwrap();
        assert_eq!(config.ollama.base_url, "http://host:1234");
        // Sections absent from the file fall back to defaults
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.retrieval.embed_batch_size, 16);
    }

    #[test]
    fn test_explicit_index_dir_wins() {
        let mut config = Config::default();
        config.index.dir = Some(PathBuf::from("/tmp/idx"));
        assert_eq!(config.index_dir().unwrap(), PathBuf::from("/tmp/idx"));
    }
}
