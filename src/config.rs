use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub session_duration_hours: i64,
    pub cookie_secure: bool,
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub ai_timeout_secs: u64,
    pub docs_path: PathBuf,
    pub search_match_threshold: f32,
    pub search_match_count: usize,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://autocrm.db?mode=rwc".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            admin_email: None,
            admin_password: None,
            session_duration_hours: 24,
            cookie_secure: false,
            llm_api_url: "https://api.openai.com/v1".to_string(),
            llm_api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            ai_timeout_secs: 30,
            docs_path: PathBuf::from("./help-docs"),
            search_match_threshold: 0.3,
            search_match_count: 5,
            otel_exporter_endpoint: None,
            service_name: "autocrm".to_string(),
            metrics_port: 9000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let session_duration_hours = parse_var("SESSION_DURATION_HOURS", defaults.session_duration_hours)?;
        if session_duration_hours < 1 {
            return Err(ConfigError::Invalid {
                var: "SESSION_DURATION_HOURS",
                value: session_duration_hours.to_string(),
            });
        }

        let search_match_count = parse_var("SEARCH_MATCH_COUNT", defaults.search_match_count)?;
        if !(1..=20).contains(&search_match_count) {
            return Err(ConfigError::Invalid {
                var: "SEARCH_MATCH_COUNT",
                value: search_match_count.to_string(),
            });
        }

        Ok(Config {
            database_url: string_var("DATABASE_URL").unwrap_or(defaults.database_url),
            server_host: string_var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            admin_email: string_var("ADMIN_EMAIL"),
            admin_password: string_var("ADMIN_PASSWORD"),
            session_duration_hours,
            cookie_secure: parse_var("COOKIE_SECURE", defaults.cookie_secure)?,
            llm_api_url: string_var("LLM_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm_api_url),
            llm_api_key: string_var("LLM_API_KEY"),
            chat_model: string_var("CHAT_MODEL").unwrap_or(defaults.chat_model),
            embedding_model: string_var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            ai_timeout_secs: parse_var("AI_TIMEOUT_SECS", defaults.ai_timeout_secs)?,
            docs_path: string_var("DOCS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.docs_path),
            search_match_threshold: parse_var("SEARCH_MATCH_THRESHOLD", defaults.search_match_threshold)?,
            search_match_count,
            otel_exporter_endpoint: string_var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            service_name: string_var("SERVICE_NAME").unwrap_or(defaults.service_name),
            metrics_port: parse_var("METRICS_PORT", defaults.metrics_port)?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Set and non-blank.
fn string_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match string_var(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var: name,
            value: raw,
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
