use serde::{Deserialize, Serialize};

/// Query string for GET /api/search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// title | author | series | narrator; anything else searches titles
    #[serde(default = "default_field")]
    pub field: String,
}

fn default_field() -> String {
    "title".to_string()
}

/// Query string for GET /api/cover
#[derive(Debug, Deserialize)]
pub struct CoverParams {
    pub title: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoverResponse {
    pub cover: Option<String>,
}
