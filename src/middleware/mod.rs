use crate::error::ApiError;
use crate::helper::validation_helpers::normalize_email;
use crate::services::identity::{IdentityError, IdentityVerifier};
use actix_web::{dev, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;

/// A caller whose bearer credential the identity verifier accepted.
///
/// Carries only who the caller is. Role and status are loaded from the users
/// store on every request by the authorization helpers.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedPrincipal {
    pub email: String,
    pub subject: String,
}

fn bearer_credential(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then(|| credential.to_string())
}

impl FromRequest for AuthenticatedPrincipal {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let credential = bearer_credential(req);
        let verifier = req.app_data::<web::Data<dyn IdentityVerifier>>().cloned();

        Box::pin(async move {
            let credential = credential.ok_or_else(|| {
                ApiError::Unauthorized("Missing or malformed bearer credential.".to_string())
            })?;
            let verifier = verifier
                .ok_or_else(|| ApiError::upstream("No identity verifier registered"))?;

            match verifier.verify(&credential).await {
                Ok(identity) => Ok(AuthenticatedPrincipal {
                    email: normalize_email(&identity.email),
                    subject: identity.subject,
                }),
                Err(IdentityError::Rejected(reason)) => {
                    log::warn!("Rejected bearer credential: {}", reason);
                    Err(ApiError::Unauthorized("Invalid or expired credential.".to_string()))
                }
                Err(e @ IdentityError::Unavailable(_)) => Err(ApiError::upstream(e)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn extracts_bearer_credential() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_credential(&req).as_deref(), Some("abc.def"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer   xyz "))
            .to_http_request();
        assert_eq!(bearer_credential(&req).as_deref(), Some("xyz"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_credentials() {
        for value in ["Basic abc", "Bearer ", "Bearer", "abc"] {
            let req = TestRequest::default()
                .insert_header((header::AUTHORIZATION, value))
                .to_http_request();
            assert_eq!(bearer_credential(&req), None, "{value}");
        }
        assert_eq!(bearer_credential(&TestRequest::default().to_http_request()), None);
    }
}
