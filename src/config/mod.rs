mod app_config;

pub use app_config::{
    AppConfig, CohereConfig, LogFormat, LoggingConfig, OpenAiConfig, RetrievalConfig,
    ServerConfig, WeaviateConfig,
};
