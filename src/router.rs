use crate::handlers::outlook_oauth::{CALLBACK_PATH, outlook_oauth_callback, outlook_oauth_entry};
use crate::handlers::unsupported_method;
use crate::handlers::workflow::workflow_fallback;
use crate::outlook_oauth::TokenManager;
use crate::service::RunsHandle;
use axum::{Router, routing::get};
use std::sync::Arc;
use url::Url;

#[derive(Clone)]
pub struct LeadsState {
    pub runs: RunsHandle,
    pub tokens: Arc<TokenManager>,
    pub public_url: Option<Url>,
}

impl LeadsState {
    pub fn new(runs: RunsHandle, tokens: Arc<TokenManager>, public_url: Option<Url>) -> Self {
        Self {
            runs,
            tokens,
            public_url,
        }
    }
}

pub fn leads_router(state: LeadsState) -> Router {
    Router::new()
        .route("/auth", get(outlook_oauth_entry).fallback(unsupported_method))
        .route(
            CALLBACK_PATH,
            get(outlook_oauth_callback).fallback(unsupported_method),
        )
        .fallback(workflow_fallback)
        .with_state(state)
}
