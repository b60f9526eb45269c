//! Custom assertion macros
//!
//! Status assertions that print the response body on failure, which is
//! where the server explains what went wrong.

/// Assert the status of a `(StatusCode, Value)` response
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $expected:expr) => {{
        let (status, body) = &$response;
        assert_eq!(
            *status, $expected,
            "unexpected status {}, body: {}",
            status, body
        );
    }};
}

/// Assert an error response carries the given status and message fragment
#[macro_export]
macro_rules! assert_error {
    ($response:expr, $expected:expr, $fragment:expr) => {{
        $crate::assert_status!($response, $expected);
        let message = $response.1["error"].as_str().unwrap_or_default().to_string();
        assert!(
            message.contains($fragment),
            "error message {:?} does not contain {:?}",
            message,
            $fragment
        );
    }};
}
