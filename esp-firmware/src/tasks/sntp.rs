// SNTP Task - Synchronisiert die Wanduhr und meldet `TimeSynced`
use defmt::{info, warn};
use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_time::{Duration, Timer, with_timeout};
use esp_core::{Event, NtpError, parse_response, request_packet};

use super::dns::{DnsError, resolve_hostname};
use crate::config::*;
use crate::hal::WallClock;
use crate::{EventSender, SyncMode, SyncRequest, SyncSignal};

/// Lokaler UDP-Port für NTP-Anfragen
const SNTP_LOCAL_PORT: u16 = 50123;

/// SNTP Task
///
/// - Wartet auf `Init` vom Controller (erster WiFi-Connect)
/// - Synchronisiert gemäß `SNTP_SYNC_MODE` und meldet jeden Erfolg
/// - Re-Sync alle `SNTP_SYNC_INTERVAL_SECS`
/// - `Restart` (WiFi-Reconnect) bricht Warten und laufende Versuche ab
///   und beginnt sofort neu
#[embassy_executor::task]
pub async fn sntp_task(
    stack: &'static Stack<'static>,
    control: &'static SyncSignal,
    clock: &'static WallClock,
    events: EventSender,
) {
    let request = control.wait().await;
    info!("SNTP: {} (server {}, mode {})", request, SNTP_SERVER, SNTP_SYNC_MODE);

    loop {
        match select(sync(stack, SNTP_SYNC_MODE), control.wait()).await {
            Either::First(Ok(unix_us)) => {
                clock.set(unix_us);
                info!("SNTP: Synchronized, unix time {} us", unix_us);
                events.send(Event::TimeSynced { now_unix_us: unix_us }).await;
            }
            Either::First(Err(e)) => {
                warn!("SNTP: Sync failed: {}, next try in {}s", e, SNTP_SYNC_INTERVAL_SECS);
            }
            Either::Second(request) => {
                info!("SNTP: {} while syncing, starting over", request);
                continue;
            }
        }

        match select(
            Timer::after(Duration::from_secs(SNTP_SYNC_INTERVAL_SECS)),
            control.wait(),
        )
        .await
        {
            Either::First(()) => info!("SNTP: Periodic resync"),
            Either::Second(SyncRequest::Init) => warn!("SNTP: Already initialized, restarting"),
            Either::Second(SyncRequest::Restart) => info!("SNTP: Restart requested"),
        }
    }
}

/// Ein Sync-Durchlauf mit Wiederholungen
///
/// `Immediate` gibt nach `SNTP_MAX_RETRIES` Versuchen auf, `Smooth` nie.
async fn sync(stack: &'static Stack<'static>, mode: SyncMode) -> Result<i64, SntpError> {
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match query_time(stack).await {
            Ok(unix_us) => return Ok(unix_us),
            Err(e) => warn!("SNTP: Attempt {} failed: {}", attempt, e),
        }

        if mode == SyncMode::Immediate && attempt >= SNTP_MAX_RETRIES {
            return Err(SntpError::RetriesExhausted);
        }
        Timer::after(Duration::from_secs(SNTP_RETRY_DELAY_SECS)).await;
    }
}

/// Eine Anfrage an den NTP Server
async fn query_time(stack: &'static Stack<'static>) -> Result<i64, SntpError> {
    let server = resolve_hostname(stack, SNTP_SERVER).await?;

    let mut rx_meta = [PacketMetadata::EMPTY; 2];
    let mut rx_buffer = [0u8; SNTP_BUFFER_SIZE];
    let mut tx_meta = [PacketMetadata::EMPTY; 2];
    let mut tx_buffer = [0u8; SNTP_BUFFER_SIZE];
    let mut socket = UdpSocket::new(
        *stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket
        .bind(SNTP_LOCAL_PORT)
        .map_err(|_| SntpError::SocketFailed)?;

    socket
        .send_to(&request_packet(), (server, SNTP_PORT))
        .await
        .map_err(|_| SntpError::SocketFailed)?;

    let mut reply = [0u8; SNTP_BUFFER_SIZE];
    let (len, _) = with_timeout(
        Duration::from_secs(SNTP_RESPONSE_TIMEOUT_SECS),
        socket.recv_from(&mut reply),
    )
    .await
    .map_err(|_| SntpError::Timeout)?
    .map_err(|_| SntpError::SocketFailed)?;

    parse_response(&reply[..len]).map_err(SntpError::from)
}

/// SNTP Fehler-Typen
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
enum SntpError {
    Dns(DnsError),
    SocketFailed,
    Timeout,
    InvalidReply(NtpError),
    RetriesExhausted,
}

impl From<DnsError> for SntpError {
    fn from(e: DnsError) -> Self {
        SntpError::Dns(e)
    }
}

impl From<NtpError> for SntpError {
    fn from(e: NtpError) -> Self {
        SntpError::InvalidReply(e)
    }
}
