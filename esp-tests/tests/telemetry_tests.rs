//! Integration Tests für den Telemetrie-Publisher
//!
//! Ringpuffer → Mittelwert → Line-Protocol → Mock-Transport

mod common;

use common::{MockPublisher, Published};
use esp_core::telemetry::send_record;
use esp_core::{
    Channel, ChannelConfig, ChannelTable, FormatError, LineProtocol, PUBLISH_GROUP, QoS, Windows,
    publish_tick,
};

const LINE: LineProtocol<'static> = LineProtocol {
    measurement: "cabahla",
    tag: ",id=v1-n6",
};

const TOPIC: &str = "/ciu/lopy4/irradiation/1";

fn setup() -> (ChannelTable, Windows<16>) {
    let table = ChannelTable::new(
        ChannelConfig::new("irradiation", 3, 5, 60, 4),
        ChannelConfig::new("battery", 4, 10, 60, 2),
        ChannelConfig::new("", 3, 5, 60, 4),
    )
    .unwrap();
    let windows = Windows::new(3, 4).unwrap();
    (table, windows)
}

#[test]
fn test_never_sampled_channels_publish_zero() {
    let (mut table, mut windows) = setup();
    let tick = publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 7).unwrap();
    assert_eq!(tick.record.as_str(), "cabahla,id=v1-n6 irradiation=0,battery=0 7");
    assert_eq!(tick.stale.as_slice(), &[Channel::Irradiation, Channel::Battery]);
}

#[test]
fn test_fresh_means_in_group_order() {
    let (mut table, mut windows) = setup();
    for v in [10, 20, 30, 40] {
        windows.get_mut(Channel::Irradiation).unwrap().record(v);
    }
    windows.get_mut(Channel::Battery).unwrap().record(3900);
    windows.get_mut(Channel::Battery).unwrap().record(3901);

    let tick = publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 1_000).unwrap();

    assert_eq!(tick.record.as_str(), "cabahla,id=v1-n6 irradiation=30,battery=3900 1000");
    assert!(tick.stale.is_empty());
    assert_eq!(table.get(Channel::Irradiation).last_mean, 30);
}

#[test]
fn test_stale_channel_republishes_last_mean() {
    let (mut table, mut windows) = setup();
    windows.get_mut(Channel::Irradiation).unwrap().record(250);
    windows.get_mut(Channel::Battery).unwrap().record(4000);
    publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 1).unwrap();

    windows.get_mut(Channel::Battery).unwrap().record(3800);
    let tick = publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 2).unwrap();

    assert_eq!(tick.record.as_str(), "cabahla,id=v1-n6 irradiation=250,battery=3800 2");
    assert_eq!(tick.stale.as_slice(), &[Channel::Irradiation]);
    assert_eq!(table.get(Channel::Irradiation).last_mean, 250);
}

#[test]
fn test_bias_is_never_published() {
    let (mut table, mut windows) = setup();
    let tick = publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 1).unwrap();
    assert!(!tick.record.contains("bias"));
    assert_eq!(tick.record.matches('=').count(), 3); // Tag + zwei Felder
}

#[test]
fn test_empty_group_fails_cleanly() {
    let (mut table, mut windows) = setup();
    let result = publish_tick(&mut table, &mut windows, &[], &LINE, 1);
    assert!(result.is_err());
}

#[test]
fn test_oversized_group_is_rejected_before_reducing() {
    let (mut table, mut windows) = setup();
    windows.get_mut(Channel::Irradiation).unwrap().record(250);
    let group = [
        Channel::Irradiation,
        Channel::Battery,
        Channel::Irradiation,
        Channel::Battery,
    ];

    let result = publish_tick(&mut table, &mut windows, &group, &LINE, 1);

    assert_eq!(result, Err(FormatError::GroupTooLarge));
    // Puffer unverändert: der nächste reguläre Tick sieht das Sample noch
    let tick = publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 2).unwrap();
    assert_eq!(tick.record.as_str(), "cabahla,id=v1-n6 irradiation=250,battery=0 2");
    assert_eq!(tick.stale.as_slice(), &[Channel::Battery]);
}

#[test]
fn test_send_uses_at_least_once_without_retain() {
    let (mut table, mut windows) = setup();
    let tick = publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 5).unwrap();
    let mut publisher = MockPublisher::default();

    send_record(&mut publisher, TOPIC, &tick.record).unwrap();

    assert_eq!(
        publisher.sent,
        vec![Published {
            topic: TOPIC.into(),
            payload: "cabahla,id=v1-n6 irradiation=0,battery=0 5".into(),
            qos: QoS::AtLeastOnce,
            retain: false,
        }]
    );
}

#[test]
fn test_send_while_disconnected_reports_error() {
    let (mut table, mut windows) = setup();
    let tick = publish_tick(&mut table, &mut windows, &PUBLISH_GROUP, &LINE, 5).unwrap();
    let mut publisher = MockPublisher {
        disconnected: true,
        ..Default::default()
    };
    assert!(send_record(&mut publisher, TOPIC, &tick.record).is_err());
    assert!(publisher.sent.is_empty());
}
