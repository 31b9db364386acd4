use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::{session::Session, SESSION_COOKIE},
    domain::User,
    error::AppError,
};

#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_cookie = jar
        .get(SESSION_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;

    let session = state
        .service_context
        .auth_service
        .validate_session(session_cookie.value())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session expired".to_string()))?;

    let user = state
        .service_context
        .user_repo
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session expired".to_string()))?;

    // Demoted accounts keep their session row but lose access.
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(CurrentUser { user, session });

    Ok(next.run(request).await)
}
