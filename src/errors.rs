use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("no TGT token set, authenticate first")]
    Authentication,

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("response body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
