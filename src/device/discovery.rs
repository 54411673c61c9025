//! SSDP discovery of zone speakers on the local network.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::net::{IpAddr, UdpSocket};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

const SSDP_MULTICAST: &str = "239.255.255.250:1900";
const SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// How often the search request is repeated, UDP being lossy.
const SEARCH_REPEATS: usize = 3;

/// Broadcasts an SSDP search and collects answering speaker addresses
/// until `wait` elapses. Addresses come back deduplicated and sorted.
pub fn discover(wait: Duration) -> Result<Vec<IpAddr>> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).context("Failed to open a discovery socket")?;
    socket.set_read_timeout(Some(Duration::from_millis(250)))?;

    let request = format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {SSDP_MULTICAST}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 1\r\n\
         ST: {SEARCH_TARGET}\r\n\r\n"
    );
    for _ in 0..SEARCH_REPEATS {
        socket
            .send_to(request.as_bytes(), SSDP_MULTICAST)
            .context("Failed to send the discovery request")?;
    }

    let mut found = BTreeSet::new();
    let deadline = Instant::now() + wait;
    let mut buffer = [0u8; 1024];
    while Instant::now() < deadline {
        match socket.recv_from(&mut buffer) {
            Ok((length, source)) => {
                let response = String::from_utf8_lossy(&buffer[..length]);
                if is_zone_player(&response) {
                    debug!(ip = %source.ip(), "zone player answered discovery");
                    found.insert(source.ip());
                }
            }
            Err(error) if matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(error) => return Err(error).context("Discovery receive failed"),
        }
    }
    Ok(found.into_iter().collect())
}

/// Only replies whose ST or USN header names the zone-player device type
/// count; other UPnP gear on the network answers searches too.
fn is_zone_player(response: &str) -> bool {
    response.lines().any(|line| {
        let lower = line.to_ascii_lowercase();
        (lower.starts_with("st:") || lower.starts_with("usn:")) && line.contains("ZonePlayer")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_zone_player_reply() {
        let reply = "HTTP/1.1 200 OK\r\n\
                     CACHE-CONTROL: max-age = 1800\r\n\
                     EXT:\r\n\
                     LOCATION: http://192.168.1.44:1400/xml/device_description.xml\r\n\
                     SERVER: Linux UPnP/1.0 ZonePlayer/83.1-61240\r\n\
                     ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
                     USN: uuid:RINCON_347E5C0A1F2001400::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\r\n";
        assert!(is_zone_player(reply));
    }

    #[test]
    fn test_ignores_other_upnp_gear() {
        let reply = "HTTP/1.1 200 OK\r\n\
                     ST: urn:schemas-upnp-org:device:MediaServer:1\r\n\
                     USN: uuid:4d696e69-444c-164e-9d41::urn:schemas-upnp-org:device:MediaServer:1\r\n\r\n";
        assert!(!is_zone_player(reply));
        assert!(!is_zone_player("HTTP/1.1 200 OK\r\n\r\n"));
    }

    #[test]
    fn test_header_match_is_case_insensitive_on_the_header_name() {
        let reply = "HTTP/1.1 200 OK\r\nSt: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\r\n";
        assert!(is_zone_player(reply));
    }
}
