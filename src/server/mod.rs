pub mod api;

pub use api::{ router, AppState };

use crate::cli::Args;
use log::{ error, info };
use std::error::Error;
use std::net::{ IpAddr, SocketAddr };

/// Builds the listen address from a bare host IP and a port. IPv6 hosts
/// such as `::` need no brackets.
pub fn bind_address(host: &str, port: u16) -> Result<SocketAddr, String> {
    let ip = host
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map_err(|e| format!("Invalid server host '{}': {}", host, e))?;
    Ok(SocketAddr::new(ip, port))
}

pub struct Server {
    addr: SocketAddr,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(addr: SocketAddr, state: AppState, args: Args) -> Self {
        Self { addr, state, args }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let tls = self.tls_paths()?;
        api::start_http_server(self.addr, self.state, tls).await
    }

    fn tls_paths(&self) -> Result<Option<(String, String)>, Box<dyn Error + Send + Sync>> {
        if !self.args.enable_tls {
            info!("TLS not enabled. Serving plain HTTP.");
            return Ok(None);
        }
        match (&self.args.tls_cert_path, &self.args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                Ok(Some((cert_path.clone(), key_path.clone())))
            }
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("Missing TLS certificate or key path".into())
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                Err("TLS enabled without cert/key".into())
            }
        }
    }
}
