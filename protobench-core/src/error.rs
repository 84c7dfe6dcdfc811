pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid report json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`fallbackWindow` must be a positive duration")]
    InvalidFallbackWindow,

    #[error("metric name for `{0}` cannot be empty")]
    EmptyMetricName(&'static str),

    #[error("run override `{0}`: `vus` must be a positive integer")]
    InvalidVus(String),

    #[error("run override `{0}`: `replicas` must be a positive integer")]
    InvalidReplicas(String),

    #[error("run override has an empty `name`")]
    EmptyOverrideName,

    #[error("duplicate run override for `{0}`")]
    DuplicateOverride(String),
}
