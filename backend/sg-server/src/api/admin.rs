use crate::api::error::Result as ApiResult;

use sg_bridge::AppState;
use sg_core::{IdentityKey, UserRecord};

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserRecord>,
    pub count: usize,
}

/// GET /admin/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListResponse>> {
    let users = state.store.list().await?;
    Ok(Json(UserListResponse {
        count: users.len(),
        users,
    }))
}

/// GET /admin/users/{provider}/{external_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path((provider, external_id)): Path<(String, String)>,
) -> ApiResult<Json<UserRecord>> {
    let record = state
        .store
        .get(&IdentityKey::new(provider, external_id))
        .await?;
    Ok(Json(record))
}
