// ADC Reader - Kalibrierter Zugriff auf die analogen Eingänge
//
// Panel, Batterie-Sense und Bias hängen an ADC1. Die Werte werden über
// die Kalibrierkurve des Chips direkt in Millivolt geliefert.

use esp_core::{AdcInput, AnalogReader, ReadError};
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcCalCurve, AdcConfig, AdcPin, Attenuation};
use esp_hal::gpio::Output;
use esp_hal::peripherals::{ADC1, GPIO0, GPIO1, GPIO6};

type Adc1 = ADC1<'static>;

/// ADC-Pin mit Kurven-Kalibrierung (Ergebnis in mV)
type CalibratedPin<P> = AdcPin<P, Adc1, AdcCalCurve<Adc1>>;

/// Real Hardware ADC Reader
pub struct EspAnalogReader {
    adc: Adc<'static, Adc1, Blocking>,
    panel: CalibratedPin<GPIO0<'static>>,
    battery_sense: CalibratedPin<GPIO1<'static>>,
    bias: CalibratedPin<GPIO6<'static>>,
}

impl EspAnalogReader {
    /// Konfiguriert ADC1 mit 11 dB Dämpfung (Messbereich bis ca. 3,1 V)
    ///
    /// # Parameter
    /// - `adc1`: ADC1 Peripheral
    /// - `panel`: GPIO0, Spannung am Solar-Panel
    /// - `battery_sense`: GPIO1, Spannungsteiler der Batterie
    /// - `bias`: GPIO6, Referenz für die Einstrahlung
    pub fn new(
        adc1: Adc1,
        panel: GPIO0<'static>,
        battery_sense: GPIO1<'static>,
        bias: GPIO6<'static>,
    ) -> Self {
        let mut config = AdcConfig::new();
        let panel = config.enable_pin_with_cal::<_, AdcCalCurve<Adc1>>(panel, Attenuation::_11dB);
        let battery_sense =
            config.enable_pin_with_cal::<_, AdcCalCurve<Adc1>>(battery_sense, Attenuation::_11dB);
        let bias = config.enable_pin_with_cal::<_, AdcCalCurve<Adc1>>(bias, Attenuation::_11dB);

        Self {
            adc: Adc::new(adc1, config),
            panel,
            battery_sense,
            bias,
        }
    }
}

impl AnalogReader for EspAnalogReader {
    fn read_mv(&mut self, input: AdcInput) -> Result<i32, ReadError> {
        let millivolts = match input {
            AdcInput::Panel => nb::block!(self.adc.read_oneshot(&mut self.panel)),
            AdcInput::BatterySense => nb::block!(self.adc.read_oneshot(&mut self.battery_sense)),
            AdcInput::Bias => nb::block!(self.adc.read_oneshot(&mut self.bias)),
        }
        .map_err(|_| ReadError::ConversionFailed)?;

        Ok(i32::from(millivolts))
    }
}

/// ADC und Versorgungs-Pin des Panels
///
/// Liegt hinter einem async Mutex: ein Sampling-Tick hält ihn inklusive
/// Einschwingzeit, damit niemand sonst den Pin schaltet.
pub struct SensorFrontEnd {
    pub reader: EspAnalogReader,
    pub power: Output<'static>,
}
