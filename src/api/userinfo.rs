// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use serde::Serialize;

use crate::auth::Auth;

/// Business user attributes shown by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUserInfo {
    pub title: String,
    pub regions: Vec<String>,
}

pub async fn get_user_info(Auth(principal): Auth) -> Json<ClientUserInfo> {
    let claims = principal.extra();
    Json(ClientUserInfo {
        title: claims.title.clone(),
        regions: claims.regions.clone(),
    })
}
