//! SNTP Pakete (RFC 4330)
//!
//! Nur Aufbau der Anfrage und Auswertung der Antwort, der UDP-Transport
//! liegt in der Firmware.

/// Größe eines NTP-Pakets ohne Erweiterungen
pub const NTP_PACKET_SIZE: usize = 48;

/// Sekunden zwischen 1900-01-01 (NTP) und 1970-01-01 (Unix)
pub const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;

/// LI = 0, Version 4, Mode 3 (Client)
const CLIENT_HEADER: u8 = (4 << 3) | 3;
const MODE_SERVER: u8 = 4;
const LEAP_ALARM: u8 = 3;
const TRANSMIT_OFFSET: usize = 40;

/// Fehler beim Auswerten einer Server-Antwort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NtpError {
    /// Antwort kürzer als 48 Bytes
    Truncated,
    /// Kein Server-Paket (Mode != 4)
    UnexpectedMode,
    /// Stratum 0: der Server lehnt ab ("Kiss-o'-Death")
    KissOfDeath,
    /// Server selbst nicht synchronisiert (Leap-Alarm oder Stratum > 15)
    Unsynchronized,
    /// Transmit-Timestamp ist 0
    ZeroTimestamp,
}

/// Baut eine Client-Anfrage
pub fn request_packet() -> [u8; NTP_PACKET_SIZE] {
    let mut packet = [0u8; NTP_PACKET_SIZE];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Liest den Transmit-Timestamp einer Server-Antwort als Unix-Mikrosekunden
///
/// Zeitstempel mit gelöschtem MSB liegen in NTP-Ära 1 (ab 2036-02-07).
pub fn parse_response(packet: &[u8]) -> Result<i64, NtpError> {
    if packet.len() < NTP_PACKET_SIZE {
        return Err(NtpError::Truncated);
    }

    let leap = packet[0] >> 6;
    let mode = packet[0] & 0x07;
    let stratum = packet[1];

    if mode != MODE_SERVER {
        return Err(NtpError::UnexpectedMode);
    }
    if stratum == 0 {
        return Err(NtpError::KissOfDeath);
    }
    if leap == LEAP_ALARM || stratum > 15 {
        return Err(NtpError::Unsynchronized);
    }

    let seconds = read_u32(packet, TRANSMIT_OFFSET);
    let fraction = read_u32(packet, TRANSMIT_OFFSET + 4);
    if seconds == 0 && fraction == 0 {
        return Err(NtpError::ZeroTimestamp);
    }

    let mut ntp_secs = i64::from(seconds);
    if seconds & 0x8000_0000 == 0 {
        ntp_secs += 1 << 32;
    }
    let micros = (u64::from(fraction) * 1_000_000) >> 32;

    Ok((ntp_secs - NTP_UNIX_OFFSET_SECS) * 1_000_000 + micros as i64)
}

fn read_u32(packet: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        packet[offset],
        packet[offset + 1],
        packet[offset + 2],
        packet[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_reply(seconds: u32, fraction: u32) -> [u8; NTP_PACKET_SIZE] {
        let mut packet = [0u8; NTP_PACKET_SIZE];
        packet[0] = (4 << 3) | MODE_SERVER;
        packet[1] = 2;
        packet[40..44].copy_from_slice(&seconds.to_be_bytes());
        packet[44..48].copy_from_slice(&fraction.to_be_bytes());
        packet
    }

    #[test]
    fn test_request_header() {
        let packet = request_packet();
        assert_eq!(packet[0], 0x23);
        assert!(packet[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_unix_epoch() {
        let reply = server_reply(2_208_988_800, 0);
        assert_eq!(parse_response(&reply), Ok(0));
    }

    #[test]
    fn test_fraction_to_micros() {
        // 2024-01-01T00:00:00.5Z
        let reply = server_reply(3_913_056_000, 0x8000_0000);
        assert_eq!(parse_response(&reply), Ok(1_704_067_200_500_000));
    }

    #[test]
    fn test_era_rollover() {
        // Sekunde 0 der Ära 1 = 2036-02-07T06:28:16Z, Fraction != 0
        let reply = server_reply(0, 0x8000_0000);
        assert_eq!(parse_response(&reply), Ok(2_085_978_496_500_000));
    }

    #[test]
    fn test_rejects_invalid_replies() {
        assert_eq!(parse_response(&[0u8; 12]), Err(NtpError::Truncated));

        let mut reply = server_reply(3_913_056_000, 0);
        reply[0] = CLIENT_HEADER;
        assert_eq!(parse_response(&reply), Err(NtpError::UnexpectedMode));

        let mut reply = server_reply(3_913_056_000, 0);
        reply[1] = 0;
        assert_eq!(parse_response(&reply), Err(NtpError::KissOfDeath));

        let mut reply = server_reply(3_913_056_000, 0);
        reply[0] |= LEAP_ALARM << 6;
        assert_eq!(parse_response(&reply), Err(NtpError::Unsynchronized));

        assert_eq!(parse_response(&server_reply(0, 0)), Err(NtpError::ZeroTimestamp));
    }
}
