// ABOUTME: Plain HTTP/1.1 prober built on a hyper client connection.
// ABOUTME: One TCP connection per probe; no pooling, no redirects, no TLS.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::header::HOST;
use hyper::{Method, Request, Uri};
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::net::TcpStream;

use super::probe::{HealthCheckPolicy, ProbeError, Prober};

/// Probes `http://` endpoints over TCP.
#[derive(Debug, Clone)]
pub struct HttpProber {
    request_timeout: Duration,
}

impl HttpProber {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    pub fn for_policy(policy: &HealthCheckPolicy) -> Self {
        Self::new(policy.request_timeout)
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(HealthCheckPolicy::DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Host, port and Host-header value for an endpoint.
fn target(endpoint: &Uri) -> Result<(String, u16, String), ProbeError> {
    match endpoint.scheme_str() {
        Some("http") => {}
        Some(other) => {
            return Err(ProbeError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                other
            )));
        }
        None => {
            return Err(ProbeError::InvalidEndpoint(format!(
                "'{}' has no scheme",
                endpoint
            )));
        }
    }

    let authority = endpoint
        .authority()
        .ok_or_else(|| ProbeError::InvalidEndpoint(format!("'{}' has no host", endpoint)))?;
    let port = authority.port_u16().unwrap_or(80);
    // IPv6 literals keep their brackets in the authority but not in a socket address.
    let host = authority
        .host()
        .trim_start_matches('[')
        .trim_end_matches(']');

    Ok((
        host.to_string(),
        port,
        authority.as_str().to_string(),
    ))
}

async fn exchange(stream: TcpStream, endpoint: &Uri, host_header: &str) -> Result<u16, ProbeError> {
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| ProbeError::Http(format!("handshake failed: {}", e)))?;

    let conn_task = tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("health probe connection error: {}", e);
        }
    });

    let path = endpoint
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or("/");

    let req = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(HOST, host_header)
        .body(Empty::<Bytes>::new())
        .map_err(|e| ProbeError::Http(format!("failed to build request: {}", e)))?;

    let result = sender
        .send_request(req)
        .await
        .map(|resp| resp.status().as_u16())
        .map_err(|e| ProbeError::Http(format!("request failed: {}", e)));

    conn_task.abort();
    result
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &Uri, connect_timeout: Duration) -> Result<u16, ProbeError> {
        let (host, port, host_header) = target(endpoint)?;

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| ProbeError::ConnectTimeout(connect_timeout))?
            .map_err(ProbeError::Connect)?;

        tokio::time::timeout(self.request_timeout, exchange(stream, endpoint, &host_header))
            .await
            .map_err(|_| ProbeError::RequestTimeout(self.request_timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use std::net::ToSocketAddrs;
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static str) -> (Uri, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        let uri: Uri = format!("http://{}/health", addr).parse().unwrap();
        (uri, handle)
    }

    #[test]
    fn rejects_non_http_endpoints() {
        let err = target(&Uri::from_static("https://api-blue/health")).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidEndpoint(_)));

        let err = target(&Uri::from_static("/health")).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidEndpoint(_)));
    }

    #[test]
    fn port_defaults_to_80() {
        let (host, port, header) = target(&Uri::from_static("http://api-green/health")).unwrap();
        assert_eq!(host, "api-green");
        assert_eq!(port, 80);
        assert_eq!(header, "api-green");
    }

    #[test]
    fn ipv6_literal_loses_brackets() {
        let (host, port, header) =
            target(&Uri::from_static("http://[::1]:8080/health")).unwrap();
        assert_eq!(host, "::1");
        assert_eq!(port, 8080);
        assert_eq!(header, "[::1]:8080");

        let addr = (host.as_str(), port)
            .to_socket_addrs()
            .unwrap()
            .next()
            .unwrap();
        assert!(addr.is_ipv6());
    }

    #[tokio::test]
    async fn reports_status_code() {
        let (uri, server) =
            serve_once("HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\n\r\n").await;

        let status = HttpProber::default()
            .probe(&uri, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(status, 503);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /health HTTP/1.1"));
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let uri: Uri = format!("http://{}/health", addr).parse().unwrap();
        let result = HttpProber::default()
            .probe(&uri, Duration::from_secs(2))
            .await;

        assert!(result.is_err());
    }
}
