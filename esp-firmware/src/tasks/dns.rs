// DNS-Auflösung für MQTT Broker und NTP Server
use embassy_net::{IpAddress, Ipv4Address, Stack, dns::DnsQueryType};
use embassy_time::{Duration, with_timeout};

use crate::config::DNS_TIMEOUT_SECS;

/// Fehler bei der DNS-Auflösung
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum DnsError {
    ResolutionFailed,
    Timeout,
}

/// Löst Hostname zu IPv4-Adresse auf
///
/// Nutzt embassy-net DNS-Stack mit konfigurierbarem Timeout.
pub async fn resolve_hostname(
    stack: &'static Stack<'static>,
    hostname: &str,
) -> Result<Ipv4Address, DnsError> {
    let result = with_timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        stack.dns_query(hostname, DnsQueryType::A),
    )
    .await;

    match result {
        Ok(Ok(addrs)) => {
            for addr in addrs {
                if let IpAddress::Ipv4(ipv4) = addr {
                    return Ok(ipv4);
                }
            }
            Err(DnsError::ResolutionFailed)
        }
        Ok(Err(_)) => Err(DnsError::ResolutionFailed),
        Err(_) => Err(DnsError::Timeout),
    }
}
