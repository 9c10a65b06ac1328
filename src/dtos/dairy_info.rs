use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DairyInfoRequest {
    pub dairy_name: String,
}

#[derive(Debug, Serialize)]
pub struct DairyInfoResponse {
    pub dairy_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
