//! Provider specific [`ClientWrapper`](crate::client_wrapper::ClientWrapper)
//! implementations, plus the shared HTTP client they are built on.

use lazy_static::lazy_static;
use std::time::Duration;

pub mod openai;

lazy_static! {
    /// Process-wide `reqwest::Client` configured for persistent connections.
    ///
    /// Sharing one client keeps TCP connections and TLS sessions alive across
    /// the many sequential calls a single routed request can make
    /// (classification, specialist dispatch, embedding).
    static ref SHARED_HTTP_CLIENT: reqwest::Client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(300))
        .build()
        .expect("Failed to build HTTP client");
}

/// A clone of the shared HTTP client (clones share the connection pool).
pub fn shared_http_client() -> reqwest::Client {
    SHARED_HTTP_CLIENT.clone()
}
