use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};

use crate::config::SESSION_COOKIE;
use crate::core::errors::ApiError;
use crate::core::helpers::now;
use crate::models::Identity;
use crate::AppState;

/// Taking an `Identity` argument makes a handler require a valid session.
///
/// The user lookup runs on the blocking pool, like every other store access.
impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req
            .cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|value| !value.is_empty());

        Box::pin(async move {
            let state =
                state.ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;
            web::block(move || super::authenticate(&state, token.as_deref(), now())).await?
        })
    }
}
