use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::error::ServiceError;
use super::{form, AppState, PASSWORD_FIELD, POST_HASH_ROUTE};
use crate::routing::RequestContext;

/// `POST /hash`: schedule the digest of the `password` field, answer its key.
pub async fn post_hash(state: Arc<AppState>, ctx: RequestContext) -> Result<String, ServiceError> {
    let (parts, body) = ctx.into_request().into_parts();

    // Only urlencoded bodies carry form fields.
    if !form::is_urlencoded(&parts.headers) {
        return Err(ServiceError::MissingField(PASSWORD_FIELD));
    }
    let bytes = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|e| ServiceError::MalformedBody(e.to_string()))?;
    let password = form::single_field(&bytes, PASSWORD_FIELD)?;

    let digest = state.transform.apply(password.as_bytes());
    let key = state.store.insert(digest);
    let delay_ms = u64::try_from(state.store.delay().as_millis()).unwrap_or(u64::MAX);
    tracing::debug!(key, delay_ms, "Digest scheduled");

    Ok(key.to_string())
}

/// `GET /hash/{key}`: the base64 digest for `key`, once committed.
pub async fn get_hash(state: Arc<AppState>, ctx: RequestContext) -> Result<String, ServiceError> {
    let param = ctx.param(0);
    let key: u64 = param
        .parse()
        .map_err(|_| ServiceError::InvalidKey(param.to_string()))?;

    let digest = state.store.lookup(key).ok_or(ServiceError::KeyNotFound(key))?;
    Ok(STANDARD.encode(digest))
}

/// `GET /stats`: request count and average handler time of `POST /hash`.
pub async fn get_stats(ctx: RequestContext) -> Result<Response, ServiceError> {
    let route = ctx
        .routes()
        .get(POST_HASH_ROUTE)
        .ok_or(ServiceError::RouteMissing(POST_HASH_ROUTE))?;
    let snapshot = route.stats().snapshot();

    let body = format!(
        r#"{{"total": {}, "average": {}}}"#,
        snapshot.total_requests,
        snapshot.average_micros()
    );
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// `GET /shutdown`: begin graceful termination.
pub async fn shutdown(state: Arc<AppState>, _ctx: RequestContext) -> StatusCode {
    tracing::info!("Received shutdown request, terminating self");
    state.shutdown.trigger("shutdown endpoint");
    StatusCode::OK
}
