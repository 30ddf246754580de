use crate::{RedirectError, Result};

/// Fixed path the browser is redirected back to; the listener accepts
/// requests on exactly this path.
pub(crate) const REDIRECT_PATH: &str = "/authorize/";

/// The local redirect target handed to the authorization-URL builder
///
/// The port is chosen once per receiver and never changes for the lifetime of
/// that receiver instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectEndpoint {
    port: u16,
}

impl RedirectEndpoint {
    /// Pick a free loopback port and build the endpoint around it.
    pub(crate) fn allocate() -> Result<Self> {
        Ok(Self {
            port: allocate_port()?,
        })
    }

    /// The allocated port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The redirect URI to register with the authorization server,
    /// `http://localhost:{port}/authorize/`.
    pub fn uri(&self) -> String {
        format!("http://localhost:{}{}", self.port, REDIRECT_PATH)
    }
}

/// Ask the OS for an unused loopback port.
///
/// Binds port 0, reads back the assigned port, and releases the socket right
/// away. The port is guaranteed free at the instant of the call only; the
/// listener rebinds it moments later, and that short local race window is
/// accepted.
pub(crate) fn allocate_port() -> Result<u16> {
    let probe = std::net::TcpListener::bind(("127.0.0.1", 0))
        .map_err(|e| RedirectError::PortAllocation(format!("failed to bind 127.0.0.1:0: {e}")))?;
    let port = probe
        .local_addr()
        .map_err(|e| {
            RedirectError::PortAllocation(format!("failed to read probe socket address: {e}"))
        })?
        .port();
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_embeds_port_and_fixed_path() {
        let endpoint = RedirectEndpoint { port: 1455 };
        assert_eq!(endpoint.uri(), "http://localhost:1455/authorize/");
        assert_eq!(endpoint.port(), 1455);

        let endpoint = RedirectEndpoint { port: 65535 };
        assert_eq!(endpoint.uri(), "http://localhost:65535/authorize/");
    }

    #[test]
    fn allocated_port_is_bindable() {
        let port = allocate_port().unwrap();
        assert!(port > 0);
        // The probe released the port, so rebinding it succeeds.
        std::net::TcpListener::bind(("127.0.0.1", port)).unwrap();
    }

    #[test]
    fn allocations_are_distinct_sockets() {
        // Two probes in a row must not return a port that is still held.
        let a = allocate_port().unwrap();
        let b = allocate_port().unwrap();
        assert!(a > 0 && b > 0);
    }
}
