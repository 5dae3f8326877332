//! `application/x-www-form-urlencoded` body handling.

use axum::http::{header, HeaderMap};

use super::error::ServiceError;

/// Returns true if the request declares a urlencoded form body.
pub fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

/// Extract the value of a field that must appear exactly once in `body`.
pub fn single_field(body: &[u8], field: &'static str) -> Result<String, ServiceError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|e| ServiceError::MalformedBody(e.to_string()))?;

    let mut values = pairs.into_iter().filter(|(name, _)| name == field).map(|(_, value)| value);
    let first = values.next().ok_or(ServiceError::MissingField(field))?;
    let extra = values.count();
    if extra > 0 {
        return Err(ServiceError::DuplicateField {
            field,
            count: extra + 1,
        });
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_single_field() {
        assert_eq!(single_field(b"password=angryMonkey", "password").unwrap(), "angryMonkey");
        assert_eq!(single_field(b"user=bob&password=a%20b+c", "password").unwrap(), "a b c");
        assert_eq!(single_field(b"password=", "password").unwrap(), "");
    }

    #[test]
    fn test_missing_field() {
        assert!(matches!(single_field(b"", "password"), Err(ServiceError::MissingField("password"))));
        assert!(matches!(
            single_field(b"passwd=x", "password"),
            Err(ServiceError::MissingField("password"))
        ));
    }

    #[test]
    fn test_duplicate_field() {
        let err = single_field(b"password=a&password=b&password=c", "password").unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateField { field: "password", count: 3 }));
    }

    #[test]
    fn test_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_urlencoded(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        assert!(is_urlencoded(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Application/X-WWW-Form-Urlencoded; charset=utf-8"),
        );
        assert!(is_urlencoded(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_urlencoded(&headers));
    }
}
