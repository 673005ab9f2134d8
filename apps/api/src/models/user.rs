use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display identity of a user, keyed by the same id as the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
}
