use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OpenAI API error: {0}")]
    OpenAiApi(String),

    #[error("Email API error: {0}")]
    MailerApi(String),

    #[error("Forms API error: {0}")]
    FormsApi(String),

    #[error("Unknown saved item: {0}")]
    UnknownSavedItem(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
