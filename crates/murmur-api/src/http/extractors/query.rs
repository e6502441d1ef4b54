//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for the contact candidate list.
#[derive(Debug, Deserialize, Default)]
pub struct ContactQuery {
    /// Case-insensitive name substring.
    pub q: Option<String>,
}
