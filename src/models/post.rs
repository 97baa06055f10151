use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Identity;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    #[serde(rename = "user")]
    pub owner_id: String,
    /// Copy of the owner's username. Usernames never change, so it cannot go stale.
    pub username: String,
    #[serde(default)]
    pub likes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(owner: &Identity, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            owner_id: owner.id.clone(),
            username: owner.username.clone(),
            likes: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
