pub mod campaigns;
pub mod functions;
pub mod health;
pub mod leads;
pub mod messages;
pub mod stages;

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header naming the acting user. Absent or unparsable means anonymous.
pub const USER_HEADER: &str = "x-user-id";

pub fn actor(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}
