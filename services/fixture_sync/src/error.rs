#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{provider} request failed ({status}): {body}")]
    ProviderStatus {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("Provider config error: {0}")]
    ProviderConfig(String),
    #[error("Missing environment variable. Checked keys: {0}")]
    MissingEnv(String),
    #[error("{0}")]
    Other(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    pub fn store(context: impl Into<String>) -> impl FnOnce(sqlx::Error) -> SyncError {
        let context = context.into();
        move |source| SyncError::Store { context, source }
    }
}
