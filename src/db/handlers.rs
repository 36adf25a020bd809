//! REST handlers for the relational backend. The endpoint set mirrors
//! the file-store API's auth and map CRUD; sharing, drafts, and magic
//! links exist only on the file backend.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::error::ApiError;
use crate::model::{LoginRequest, RegisterRequest};

use super::{DbCreateMapRequest, DbMap, DbMapResponse, DbPool, DbUpdateMapRequest, DbUser};

pub fn api_router(pool: DbPool) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/maps", post(create_map))
        .route("/api/maps/:id", get(get_map).put(update_map))
        .route("/api/users/:user_id/maps", get(list_user_maps))
        .route("/api/health-check", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn register(
    State(pool): State<DbPool>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Err(e) = crate::api::validation::validate_email(req.email.trim()) {
        return Err(ApiError::validation_field("email", e));
    }

    // A UNIQUE violation surfaces as a conflict through the error mapping
    let result = sqlx::query("INSERT INTO users (email, password) VALUES (?, ?)")
        .bind(req.email.trim())
        .bind(&req.password)
        .execute(&pool)
        .await?;

    info!(email = %req.email.trim(), "Account registered");
    Ok(Json(json!({ "id": result.last_insert_rowid() })))
}

async fn login(
    State(pool): State<DbPool>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user: Option<DbUser> =
        sqlx::query_as("SELECT * FROM users WHERE email = ? AND password = ?")
            .bind(req.email.trim())
            .bind(&req.password)
            .fetch_optional(&pool)
            .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;
    Ok(Json(json!({ "id": user.id, "email": user.email })))
}

async fn create_map(
    State(pool): State<DbPool>,
    Json(req): Json<DbCreateMapRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Err(e) = crate::api::validation::validate_states(&req.states) {
        return Err(ApiError::validation_field("states", e));
    }

    let states = serde_json::to_string(&req.states)
        .map_err(|e| ApiError::internal(format!("Failed to encode states: {e}")))?;

    let result = sqlx::query(
        "INSERT INTO maps (user_id, title, states, is_public) VALUES (?, ?, ?, ?)",
    )
    .bind(req.user_id)
    .bind(&req.title)
    .bind(&states)
    .bind(req.is_public)
    .execute(&pool)
    .await?;

    Ok(Json(json!({ "id": result.last_insert_rowid() })))
}

async fn update_map(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
    Json(req): Json<DbUpdateMapRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Err(e) = crate::api::validation::validate_states(&req.states) {
        return Err(ApiError::validation_field("states", e));
    }

    let states = serde_json::to_string(&req.states)
        .map_err(|e| ApiError::internal(format!("Failed to encode states: {e}")))?;

    let result = sqlx::query(
        "UPDATE maps
         SET title = ?, states = ?, is_public = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(&req.title)
    .bind(&states)
    .bind(req.is_public)
    .bind(id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Map not found"));
    }

    Ok(Json(json!({ "success": true })))
}

async fn get_map(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
) -> Result<Json<DbMapResponse>, ApiError> {
    let map: Option<DbMap> = sqlx::query_as(
        "SELECT m.*, u.email AS creator_email
         FROM maps m
         LEFT JOIN users u ON m.user_id = u.id
         WHERE m.id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let map = map.ok_or_else(|| ApiError::not_found("Map not found"))?;
    Ok(Json(map.into_response()))
}

async fn list_user_maps(
    State(pool): State<DbPool>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<DbMapResponse>>, ApiError> {
    let maps: Vec<DbMap> =
        sqlx::query_as("SELECT * FROM maps WHERE user_id = ? ORDER BY updated_at DESC")
            .bind(user_id)
            .fetch_all(&pool)
            .await?;

    Ok(Json(maps.into_iter().map(DbMap::into_response).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());
        let pool = crate::db::connect(&url).await.unwrap();
        (dir, pool)
    }

    fn creds(email: &str, password: &str) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (_dir, pool) = test_pool().await;

        let body = register(State(pool.clone()), creds("a@x.com", "pw1"))
            .await
            .unwrap();
        assert_eq!(body.0["id"], 1);

        // Duplicate email is a conflict
        assert!(register(State(pool.clone()), creds("a@x.com", "pw2"))
            .await
            .is_err());

        let body = login(
            State(pool.clone()),
            Json(LoginRequest {
                email: "a@x.com".to_string(),
                password: "pw1".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(body.0["email"], "a@x.com");

        assert!(login(
            State(pool),
            Json(LoginRequest {
                email: "a@x.com".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_map_crud_roundtrip() {
        let (_dir, pool) = test_pool().await;
        register(State(pool.clone()), creds("a@x.com", "pw1"))
            .await
            .unwrap();

        let created = create_map(
            State(pool.clone()),
            Json(DbCreateMapRequest {
                user_id: 1,
                title: "Trip".to_string(),
                states: vec!["Texas".to_string(), "Utah".to_string()],
                is_public: true,
            }),
        )
        .await
        .unwrap();
        let id = created.0["id"].as_i64().unwrap();

        let fetched = get_map(State(pool.clone()), Path(id)).await.unwrap();
        assert_eq!(fetched.0.title, "Trip");
        assert_eq!(fetched.0.states, vec!["Texas", "Utah"]);
        assert_eq!(fetched.0.creator_email.as_deref(), Some("a@x.com"));

        update_map(
            State(pool.clone()),
            Path(id),
            Json(DbUpdateMapRequest {
                title: "Big Trip".to_string(),
                states: vec!["Texas".to_string()],
                is_public: false,
            }),
        )
        .await
        .unwrap();

        let listed = list_user_maps(State(pool.clone()), Path(1)).await.unwrap();
        assert_eq!(listed.0.len(), 1);
        assert_eq!(listed.0[0].title, "Big Trip");
        assert!(!listed.0[0].is_public);

        // Unknown ids are 404s
        assert!(get_map(State(pool.clone()), Path(999)).await.is_err());
        assert!(update_map(
            State(pool),
            Path(999),
            Json(DbUpdateMapRequest {
                title: String::new(),
                states: Vec::new(),
                is_public: false,
            }),
        )
        .await
        .is_err());
    }
}
