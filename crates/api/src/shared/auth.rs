use crate::error::AwaytixError;
use actix_web::HttpRequest;
use awaytix_infra::Context;

const API_KEY_HEADER: &str = "awaytix-api-key";

/// Admin routes are protected by a single shared secret; the scraper
/// pipeline and ops tooling are the only callers.
pub fn protect_admin_route(http_req: &HttpRequest, ctx: &Context) -> Result<(), AwaytixError> {
    let api_key = http_req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match api_key {
        Some(api_key) if api_key == ctx.config.api_key => Ok(()),
        Some(_) => Err(AwaytixError::Unauthorized(
            "The provided api key is invalid".into(),
        )),
        None => Err(AwaytixError::Unauthorized(format!(
            "Missing `{}` header",
            API_KEY_HEADER
        ))),
    }
}
