//! Row types and DTOs for the relational backend. This data model is
//! independent of the file store's: integer ids, JSON-encoded states.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMap {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    /// JSON-encoded state list, as the original schema stored it
    pub states: String,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
    /// Joined owner email; absent outside the detail query
    #[sqlx(default)]
    pub creator_email: Option<String>,
}

impl DbMap {
    /// Decode the states column. Malformed JSON reads as an empty list.
    pub fn decode_states(&self) -> Vec<String> {
        match serde_json::from_str(&self.states) {
            Ok(states) => states,
            Err(e) => {
                warn!(map_id = self.id, error = %e, "States column is malformed, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn into_response(self) -> DbMapResponse {
        let states = self.decode_states();
        DbMapResponse {
            id: self.id,
            user_id: self.user_id,
            creator_email: self.creator_email,
            title: self.title,
            states,
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DbMapResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_email: Option<String>,
    pub title: String,
    pub states: Vec<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct DbCreateMapRequest {
    pub user_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct DbUpdateMapRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_row(states: &str) -> DbMap {
        DbMap {
            id: 1,
            user_id: Some(1),
            title: "Trip".to_string(),
            states: states.to_string(),
            is_public: true,
            created_at: "2026-01-01 00:00:00".to_string(),
            updated_at: "2026-01-01 00:00:00".to_string(),
            creator_email: None,
        }
    }

    #[test]
    fn test_decode_states() {
        let row = map_row(r#"["Texas","Utah"]"#);
        assert_eq!(row.decode_states(), vec!["Texas", "Utah"]);
    }

    #[test]
    fn test_malformed_states_decode_empty() {
        assert!(map_row("not json").decode_states().is_empty());
        assert!(map_row(r#"{"wrong":"shape"}"#).decode_states().is_empty());
    }
}
