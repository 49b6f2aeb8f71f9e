//! Client address resolution for rate limiting.

use actix_web::HttpRequest;
use std::net::IpAddr;

/// First valid address in a proxy header. `X-Forwarded-For` lists the
/// original client first.
fn forwarded_address(req: &HttpRequest, header: &str) -> Option<IpAddr> {
    let value = req.headers().get(header)?.to_str().ok()?;
    value.split(',').next()?.trim().parse().ok()
}

/// Client address of a request. With `trust_proxy` the `X-Forwarded-For`
/// and `X-Real-IP` headers are consulted before the socket peer; otherwise
/// they are ignored, since any client can set them.
pub fn extract_client_ip(req: &HttpRequest, trust_proxy: bool) -> Option<String> {
    let forwarded = if trust_proxy {
        forwarded_address(req, "x-forwarded-for").or_else(|| forwarded_address(req, "x-real-ip"))
    } else {
        None
    };
    forwarded
        .or_else(|| req.peer_addr().map(|peer| peer.ip()))
        .map(|ip| ip.to_string())
}

/// Rate-limit key for a request. Requests with no resolvable address share
/// one bucket.
pub fn client_key(req: &HttpRequest, trust_proxy: bool) -> String {
    extract_client_ip(req, trust_proxy).unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_takes_first_address() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.1"))
            .insert_header(("x-real-ip", "198.51.100.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req, true).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_invalid_forwarded_for_falls_through() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "not-an-ip"))
            .insert_header(("x-real-ip", "2001:db8::1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req, true).as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn test_peer_address_and_fallback() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.10:5555".parse().unwrap())
            .to_http_request();
        assert_eq!(client_key(&req, false), "192.0.2.10");

        let req = TestRequest::default().to_http_request();
        assert_eq!(client_key(&req, true), "unknown");
    }

    #[test]
    fn test_proxy_headers_ignored_unless_trusted() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.10:5555".parse().unwrap())
            .insert_header(("x-forwarded-for", "203.0.113.7"))
            .insert_header(("x-real-ip", "198.51.100.1"))
            .to_http_request();
        assert_eq!(client_key(&req, false), "192.0.2.10");
        assert_eq!(client_key(&req, true), "203.0.113.7");
    }
}
