use anyhow::Result;
use std::net::TcpListener;
use tracing::{debug, warn};

/// Bind the preferred address if possible, otherwise fall back to an
/// ephemeral port so the engine can still come up.
pub fn bind_listener(preferred: Option<&str>) -> Result<TcpListener> {
    if let Some(addr) = preferred {
        match TcpListener::bind(addr) {
            Ok(listener) => return Ok(listener),
            Err(e) => warn!("Could not bind {addr}: {e}, falling back"),
        }
    }

    if let Ok(listener) = TcpListener::bind("127.0.0.1:0") {
        return Ok(listener);
    }

    for port in 8000..9000 {
        let addr = format!("127.0.0.1:{}", port);
        debug!("Trying port {}", port);
        if let Ok(listener) = TcpListener::bind(&addr) {
            return Ok(listener);
        }
    }
    Err(anyhow::anyhow!("No available ports found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_when_preferred_is_taken() {
        let held = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = held.local_addr().unwrap().to_string();
        let listener = bind_listener(Some(&addr)).unwrap();
        assert_ne!(listener.local_addr().unwrap(), held.local_addr().unwrap());
    }
}
