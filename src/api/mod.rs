//! Backend API plumbing: transport seam, error taxonomy and wire bodies

mod error;
mod transport;
pub mod wire;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{ClientError, GENERIC_LOGIN_FAILURE};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestBody};

/// Join the API base and a route without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8000/api", "/auth/me"),
            "http://localhost:8000/api/auth/me"
        );
        assert_eq!(
            join_url("http://localhost:8000/api/", "auth/me"),
            "http://localhost:8000/api/auth/me"
        );
    }
}
