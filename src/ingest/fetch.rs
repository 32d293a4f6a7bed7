/// Bounded upstream fetcher.
///
/// One blocking GET per call, classified into exactly one of: body,
/// non-2xx status, body too large, transport failure. No retries; the first
/// failure goes straight back to the caller.

use crate::config::UpstreamConfig;
use crate::model::FetchError;
use reqwest::blocking::{Client, Response};
use std::io::{self, Read};

/// Shared outbound client. Cheap to clone; holds the connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    /// Builds the client with the configured timeout and user agent.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Sends the GET and checks the status, returning the live response for
    /// streaming consumers.
    ///
    /// A non-2xx body is drained so the connection can go back to the pool,
    /// then discarded.
    pub fn open(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let mut response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let _ = io::copy(&mut response, &mut io::sink());
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response)
    }

    /// GET `url` and return the whole body, refusing anything over `limit`
    /// bytes.
    pub fn fetch(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<u8>, FetchError> {
        let response = self.open(url, headers)?;
        read_bounded(response, limit)
    }
}

/// Reads at most `limit + 1` bytes from `reader`.
///
/// Seeing the extra byte means the body is larger than allowed, which is
/// reported as `BodyTooLarge` instead of handing back a truncated document.
pub fn read_bounded<R: Read>(reader: R, limit: usize) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut body)?;

    if body.len() > limit {
        return Err(FetchError::BodyTooLarge { limit });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_body_of_exactly_limit_bytes_succeeds() {
        let body = read_bounded(Cursor::new(vec![b'x'; 1024]), 1024).expect("at limit is fine");
        assert_eq!(body.len(), 1024);
    }

    #[test]
    fn test_body_one_byte_over_limit_is_too_large() {
        let result = read_bounded(Cursor::new(vec![b'x'; 1025]), 1024);
        assert!(
            matches!(result, Err(FetchError::BodyTooLarge { limit: 1024 })),
            "limit+1 bytes must not be truncated into a success, got {:?}",
            result.map(|b| b.len())
        );
    }

    #[test]
    fn test_body_far_over_limit_is_too_large() {
        let result = read_bounded(Cursor::new(vec![0u8; 10_000]), 16);
        assert!(matches!(result, Err(FetchError::BodyTooLarge { .. })));
    }

    #[test]
    fn test_empty_body_succeeds() {
        let body = read_bounded(Cursor::new(Vec::<u8>::new()), 16).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(UpstreamClient::new(&UpstreamConfig::default()).is_ok());
    }
}
