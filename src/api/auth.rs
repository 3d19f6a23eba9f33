//! Caller identity forwarded by the gateway

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};

use super::error::ApiError;
use crate::model::Caller;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
const ADMIN_ROLE: &str = "admin";

fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, ApiError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("malformed {} header", USER_ID_HEADER)))?;

    let is_admin = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE));

    Ok(Caller { user_id, is_admin })
}

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_from_headers(req.headers()))
    }
}

pub fn require_admin(caller: &Caller) -> Result<(), ApiError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin role required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_caller_from_headers() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "42"))
            .insert_header((USER_ROLE_HEADER, "Admin"))
            .to_http_request();
        assert_eq!(
            caller_from_headers(req.headers()).unwrap(),
            Caller {
                user_id: 42,
                is_admin: true
            }
        );

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "7"))
            .to_http_request();
        assert!(!caller_from_headers(req.headers()).unwrap().is_admin);
    }

    #[test]
    fn test_missing_or_malformed_id_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            caller_from_headers(req.headers()),
            Err(ApiError::Unauthorized(_))
        ));

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "abc"))
            .to_http_request();
        assert!(matches!(
            caller_from_headers(req.headers()),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_require_admin() {
        let user = Caller {
            user_id: 1,
            is_admin: false,
        };
        assert!(require_admin(&user).is_err());
    }
}
