//! Mapping of failed HTTP exchanges onto binding errors.
//!
//! Status codes pick the error family. Where one status covers several CMIS
//! exceptions (409 and 500), the exception name carried in the fault body
//! selects the code.

use aho_corasick::{AhoCorasick, MatchKind};
use bytes::Bytes;
use once_cell::sync::Lazy;

use super::codes::ErrorCode;
use crate::http::RequestError;
use crate::session::BindingError;

static EXCEPTION_NAMES: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build([
            "invalidArgument",
            "objectNotFound",
            "notSupported",
            "permissionDenied",
            "runtime",
            "constraint",
            "contentAlreadyExists",
            "filterNotValid",
            "nameConstraintViolation",
            "storage",
            "streamNotSupported",
            "updateConflict",
            "versioning",
        ])
        .expect("Failed to build exception name matcher")
});

/// First exception name in `body` that maps to one of `allowed`.
fn exception_in_body(body: Option<&Bytes>, allowed: &[ErrorCode]) -> Option<ErrorCode> {
    let body = body?;
    EXCEPTION_NAMES
        .find_iter(body.as_ref())
        .filter_map(|m| std::str::from_utf8(&body[m.range()]).ok())
        .filter_map(ErrorCode::from_exception_name)
        .find(|code| allowed.contains(code))
}

impl BindingError {
    /// Map an HTTP error status. `target` names what was requested and is
    /// reported by [`BindingError::ObjectNotFound`].
    pub fn from_status(status: u16, message: String, body: Option<Bytes>, target: &str) -> Self {
        let code = match status {
            401 => return BindingError::Unauthorized,
            407 => return BindingError::ProxyAuthenticationRequired,
            404 => {
                return BindingError::ObjectNotFound {
                    target: target.to_string(),
                    body,
                };
            },
            400 => exception_in_body(body.as_ref(), &[ErrorCode::FilterNotValid]).unwrap_or(ErrorCode::InvalidArgument),
            403 => ErrorCode::PermissionDenied,
            405 => ErrorCode::NotSupported,
            409 => exception_in_body(
                body.as_ref(),
                &[
                    ErrorCode::ContentAlreadyExists,
                    ErrorCode::NameConstraintViolation,
                    ErrorCode::UpdateConflict,
                    ErrorCode::Versioning,
                    ErrorCode::Constraint,
                ],
            )
            .unwrap_or(ErrorCode::Constraint),
            500 => exception_in_body(
                body.as_ref(),
                &[ErrorCode::Storage, ErrorCode::StreamNotSupported, ErrorCode::Runtime],
            )
            .unwrap_or(ErrorCode::Runtime),
            _ => ErrorCode::Runtime,
        };
        BindingError::Cmis {
            code,
            status,
            message,
            body,
        }
    }

    /// Map a failed exchange about `target`.
    pub fn from_request(err: RequestError, target: &str) -> Self {
        match err {
            RequestError::Cancelled => BindingError::Cancelled,
            RequestError::TransportFailure(message) => BindingError::ConnectionError(message),
            RequestError::StreamingNotSupported => {
                BindingError::NotSupported("the transport does not support streamed transfers".to_string())
            },
            RequestError::HttpStatus { code, message, body } => Self::from_status(code, message, body, target),
        }
    }
}

impl From<RequestError> for BindingError {
    fn from(err: RequestError) -> Self {
        BindingError::from_request(err, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &'static str) -> BindingError {
        let body = (!body.is_empty()).then(|| Bytes::from_static(body.as_bytes()));
        BindingError::from_status(code, String::new(), body, "doc-1")
    }

    #[test]
    fn test_auth_and_not_found() {
        assert!(matches!(status(401, ""), BindingError::Unauthorized));
        assert!(matches!(status(407, ""), BindingError::ProxyAuthenticationRequired));
        match status(404, "gone") {
            BindingError::ObjectNotFound { target, body } => {
                assert_eq!(target, "doc-1");
                assert_eq!(body.as_deref(), Some(&b"gone"[..]));
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exception_name_selects_code() {
        assert_eq!(status(409, "").code(), ErrorCode::Constraint);
        assert_eq!(
            status(409, "<!--exception-->nameConstraintViolation<!--/exception-->").code(),
            ErrorCode::NameConstraintViolation
        );
        assert_eq!(status(409, "CmisUpdateConflictException").code(), ErrorCode::UpdateConflict);
        assert_eq!(status(400, "filterNotValid: bad filter").code(), ErrorCode::FilterNotValid);
        assert_eq!(status(400, "updateConflict").code(), ErrorCode::InvalidArgument);
        assert_eq!(status(500, "storage full").code(), ErrorCode::Storage);
        assert_eq!(status(403, "").code(), ErrorCode::PermissionDenied);
        assert_eq!(status(405, "").code(), ErrorCode::NotSupported);
        assert_eq!(status(418, "").code(), ErrorCode::Runtime);
    }

    #[test]
    fn test_request_errors() {
        assert!(BindingError::from(RequestError::Cancelled).is_cancelled());
        assert_eq!(
            BindingError::from(RequestError::TransportFailure("timeout".into())).code(),
            ErrorCode::Connection
        );
        assert_eq!(
            BindingError::from(RequestError::StreamingNotSupported).code(),
            ErrorCode::NotSupported
        );
    }
}
