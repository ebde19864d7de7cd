//! Development server for static files.
//!
//! Every request path is stripped of the configured URL prefix and
//! resolved through the finder chain, so the server reflects the sources
//! directly without requiring a collection run first.

mod response;

use anyhow::{Result, bail};
use std::net::SocketAddr;
use tiny_http::{Request, Server};

use crate::config::StaticConfig;
use crate::finder::FinderChain;
use crate::{debug, log};

/// How many consecutive ports to try when the configured one is in use.
const MAX_PORT_RETRIES: u16 = 10;

pub fn run_serve(config: &StaticConfig) -> Result<()> {
    if !cfg!(debug_assertions) && !config.serve.insecure {
        bail!(
            "the development server only runs in debug builds; \
             pass --insecure or set `serve.insecure` to override"
        );
    }

    let chain = FinderChain::from_config(config)?;
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    log!("serve"; "serving static files at http://{addr}{}", config.collect.url);

    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, config, &chain) {
            log!("serve"; "request error: {err}");
        }
    }
    Ok(())
}

fn bind_with_retry(interface: std::net::IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &StaticConfig, chain: &FinderChain) -> Result<()> {
    if config.collect.url.trim().is_empty() {
        return response::respond_error(request, "improperly configured: `collect.url` is not set");
    }

    let url = normalize_url(request.url());
    let prefix = config.collect.url.trim_matches('/');

    let logical = if prefix.is_empty() {
        url
    } else if let Some(rest) = url.strip_prefix(&format!("{prefix}/")) {
        rest.to_string()
    } else {
        return response::respond_not_found(request);
    };

    // Reject traversal attempts before touching the finders
    if logical.is_empty() || logical.split('/').any(|seg| seg == "..") {
        return response::respond_not_found(request);
    }

    match chain.resolve(&logical, false).into_iter().next() {
        Some(path) => response::respond_file(request, &path),
        None => {
            debug!("serve"; "miss: {logical}");
            response::respond_not_found(request)
        }
    }
}

/// Normalize URL: decode, strip query string, trim slashes
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let decoded = percent_decode_str(url)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    let path = decoded.split('?').next().unwrap_or(&decoded);
    path.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/static/css/app.css"), "static/css/app.css");
        assert_eq!(normalize_url("/static/a%20b.css?v=1"), "static/a b.css");
        assert_eq!(normalize_url("/"), "");
    }
}
