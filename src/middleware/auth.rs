use crate::common::response::ApiError;
use crate::common::security;
use crate::modules::video::error::UploadError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

/// Resolves the caller identity from the bearer token and stores the
/// claims in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(security::bearer_token)
        .map(str::to_owned);

    let token = match token {
        Some(t) => t,
        None => return Err(reject("Missing or invalid token")),
    };

    let claims = security::validate_access_token(&token, &state.config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        reject("Invalid token signature")
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn reject(reason: &str) -> ApiError {
    UploadError::Unauthorized(reason.to_string()).into()
}
