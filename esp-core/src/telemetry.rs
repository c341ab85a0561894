//! Telemetrie-Datensatz im Line-Protocol Format
//!
//! `<measurement><tag> <feld1>=<wert1>,<feld2>=<wert2> <unix_ns>`

use core::fmt::Write;

use heapless::{String, Vec};

use crate::buffer::Windows;
use crate::traits::{MessagePublisher, PublishError, QoS};
use crate::types::{CHANNEL_COUNT, Channel, ChannelTable};

/// Maximale Länge eines Datensatzes in Bytes
pub const RECORD_CAPACITY: usize = 128;

/// Serialisierter Datensatz
pub type Record = String<RECORD_CAPACITY>;

/// Fehler beim Serialisieren
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Die Publish-Gruppe ist leer
    NoFields,
    /// Der Datensatz passt nicht in `RECORD_CAPACITY`
    Overflow,
    /// Die Publish-Gruppe hat mehr Einträge als es Kanäle gibt
    GroupTooLarge,
}

/// Measurement-Name und Tag-Suffix (z.B. `",id=v1-n6"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineProtocol<'a> {
    pub measurement: &'a str,
    pub tag: &'a str,
}

impl LineProtocol<'_> {
    /// Schreibt einen Datensatz, Felder in der gegebenen Reihenfolge
    ///
    /// # Beispiele
    ///
    /// ```
    /// # use esp_core::LineProtocol;
    /// let line = LineProtocol { measurement: "cabahla", tag: ",id=v1-n6" };
    /// let fields = [("irradiation", 412), ("battery", 3900)];
    /// let record = line.format(fields, 1_700_000_000_000_000_000).unwrap();
    /// assert_eq!(
    ///     record.as_str(),
    ///     "cabahla,id=v1-n6 irradiation=412,battery=3900 1700000000000000000"
    /// );
    /// ```
    pub fn format<'f, I>(&self, fields: I, timestamp_ns: i64) -> Result<Record, FormatError>
    where
        I: IntoIterator<Item = (&'f str, i32)>,
    {
        let mut record = Record::new();
        write!(record, "{}{} ", self.measurement, self.tag).map_err(|_| FormatError::Overflow)?;

        let mut count = 0usize;
        for (field, value) in fields {
            let separator = if count == 0 { "" } else { "," };
            write!(record, "{}{}={}", separator, field, value).map_err(|_| FormatError::Overflow)?;
            count += 1;
        }
        if count == 0 {
            return Err(FormatError::NoFields);
        }

        write!(record, " {}", timestamp_ns).map_err(|_| FormatError::Overflow)?;
        Ok(record)
    }
}

/// Ergebnis eines Publish-Ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTick {
    pub record: Record,
    /// Kanäle ohne neue Samples seit dem letzten Tick (alter Mittelwert gesendet)
    pub stale: Vec<Channel, CHANNEL_COUNT>,
}

/// Reduziert die Ringpuffer der Publish-Gruppe und serialisiert den Datensatz
///
/// Ein Kanal ohne neue Samples behält seinen letzten Mittelwert und wird
/// damit erneut gesendet. Kanäle, deren Mittelwert nie gesetzt wurde,
/// erscheinen mit 0. Eine Gruppe mit mehr als `CHANNEL_COUNT` Einträgen
/// wird abgelehnt, bevor ein Puffer angefasst wird.
pub fn publish_tick<const N: usize>(
    table: &mut ChannelTable,
    windows: &mut Windows<N>,
    group: &[Channel],
    line: &LineProtocol<'_>,
    timestamp_ns: i64,
) -> Result<PublishTick, FormatError> {
    if group.len() > CHANNEL_COUNT {
        return Err(FormatError::GroupTooLarge);
    }

    let mut stale = Vec::new();

    for &channel in group {
        let fresh = windows.get_mut(channel).and_then(|buffer| buffer.reduce_and_reset());
        match fresh {
            Some(mean) => table.get_mut(channel).last_mean = mean,
            None => stale
                .push(channel)
                .map_err(|_| FormatError::GroupTooLarge)?,
        }
    }

    let record = line.format(
        group.iter().map(|&channel| {
            let config = table.get(channel);
            (config.field, config.last_mean)
        }),
        timestamp_ns,
    )?;

    Ok(PublishTick { record, stale })
}

/// Übergibt einen Datensatz an den Transport: QoS "at least once", kein Retain
///
/// Ist der Transport getrennt, entscheidet er selbst über Puffern oder Verwerfen.
pub fn send_record<P: MessagePublisher>(
    publisher: &mut P,
    topic: &str,
    record: &Record,
) -> Result<(), PublishError> {
    publisher.publish(topic, record.as_bytes(), QoS::AtLeastOnce, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: LineProtocol<'static> = LineProtocol {
        measurement: "cabahla",
        tag: ",id=v1-n6",
    };

    #[test]
    fn test_single_field_has_no_comma() {
        let record = LINE.format([("battery", 3900)], 42).unwrap();
        assert_eq!(record.as_str(), "cabahla,id=v1-n6 battery=3900 42");
    }

    #[test]
    fn test_empty_field_list_fails() {
        let fields: [(&str, i32); 0] = [];
        assert_eq!(LINE.format(fields, 42), Err(FormatError::NoFields));
    }

    #[test]
    fn test_negative_values() {
        let record = LINE.format([("irradiation", -12), ("battery", 0)], 1).unwrap();
        assert_eq!(record.as_str(), "cabahla,id=v1-n6 irradiation=-12,battery=0 1");
    }

    #[test]
    fn test_overflow_is_reported() {
        let line = LineProtocol {
            measurement: "a-very-long-measurement-name-that-keeps-going-and-going-and-going",
            tag: ",location=somewhere-far-away-with-a-long-name-too",
        };
        assert_eq!(line.format([("field", 1)], i64::MAX), Err(FormatError::Overflow));
    }
}
