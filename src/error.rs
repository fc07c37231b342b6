use thiserror::Error;

pub type Result<T> = core::result::Result<T, ScoutError>;

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid page range `{0}`: expected l-r with 1 <= l <= r <= 100")]
    InvalidRange(String),

    #[error("LianJia has no listings for city `{0}`")]
    UnknownCity(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Blocked by anti-bot verification at {url}")]
    Blocked { url: String },

    #[error("Unexpected page structure: {0}")]
    Parse(String),

    #[error("Page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<ScoutError>,
    },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<reqwest::Error> for ScoutError {
    fn from(value: reqwest::Error) -> Self {
        let url = value
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        ScoutError::Fetch {
            url,
            reason: value.to_string(),
        }
    }
}
