use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use validator::Validate;

use crate::{
    api::{extract::AppJson, middleware::auth::CurrentUser, state::AppState},
    auth::{AuthService, SESSION_COOKIE},
    domain::{ChangePasswordRequest, LoginRequest, User},
    error::{AppError, Result},
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    req.validate()?;
    let ctx = &state.service_context;

    let password_hash = ctx.user_repo
        .password_hash(&req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !AuthService::verify_password(&req.password, &password_hash).await? {
        tracing::info!("Failed login attempt");
        return Err(invalid_credentials());
    }

    let user = ctx.user_repo
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // Only administrators have anything to sign in to.
    if !user.is_admin() {
        return Err(invalid_credentials());
    }

    let (_session, token) = ctx.auth_service.create_session(user.id).await?;
    let cookie = ctx.auth_service.create_session_cookie(&token);

    tracing::info!("Admin {} signed in", user.id);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        state.service_context.auth_service
            .invalidate_session(session_cookie.value())
            .await?;
    }

    let jar = jar.add(AuthService::create_logout_cookie());

    Ok((jar, StatusCode::NO_CONTENT))
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.user)
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;
    let ctx = &state.service_context;

    let password_hash = ctx.user_repo
        .password_hash(&current.user.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !AuthService::verify_password(&req.current_password, &password_hash).await? {
        return Err(AppError::BadRequest("Current password is incorrect".to_string()));
    }

    ctx.user_repo.set_password(current.user.id, &req.new_password).await?;
    let revoked = ctx.auth_service
        .invalidate_other_sessions(current.user.id, &current.session)
        .await?;

    tracing::info!("Admin {} changed password, {} other session(s) revoked", current.user.id, revoked);

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
