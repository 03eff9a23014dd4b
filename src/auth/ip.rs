//! Client IP extraction for per-client limits.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

use crate::cli::IpExtractor;

/// Extract the client IP of `request`.
///
/// With an extractor configured the address comes from its header only; a
/// missing or unparseable header is an error and never falls back to the peer
/// address, which would be the proxy's. Without one the peer address from
/// `ConnectInfo` is used.
pub fn extract_client_ip(
    request: &Request,
    ip_extractor: Option<IpExtractor>,
) -> Result<String, &'static str> {
    match ip_extractor {
        Some(extractor) => {
            let header_value = request
                .headers()
                .get(extractor.header_name())
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            extractor.extract(header_value)
        }
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}
