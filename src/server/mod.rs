pub mod api;

use crate::cli::Args;
use std::error::Error;

/// Proxy server wrapper. Owns the listen address and configuration and
/// serves until shutdown.
pub struct Server {
    addr: String,
    args: Args,
}

impl Server {
    pub fn new(addr: String, args: Args) -> Self {
        Self { addr, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.args.clone()).await
    }
}
