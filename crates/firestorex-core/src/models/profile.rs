use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ActorId;

/// Profile row created or refreshed after sign-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpsert {
    pub id: ActorId,
    pub username: String,
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}
