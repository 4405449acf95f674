//! Voltage sensing through a resistive divider.
//!
//! A raw converter sample is mapped into two voltage domains: the voltage
//! across the low-side resistor (what the converter pin actually sees) and
//! the reconstructed full-scale voltage upstream of the divider. Both
//! conversion ratios are derived once at construction and never recomputed.

/// Source of raw analog samples, one bound hardware channel per instance.
pub trait AnalogSource {
    type Error;

    /// Takes one sample, nominally in `0..=max_count` of the converter.
    fn read_sample(&mut self) -> Result<u16, Self::Error>;
}

/// Converter calibration: full count and reference voltage.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcScale {
    /// Highest raw sample the converter can produce, e.g. 4095 for 12 bit.
    pub max_count: u16,
    /// Voltage corresponding to a full-count sample.
    pub reference_volts: f32,
}

/// One calibrated sample in both voltage domains.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Reconstructed voltage at the divider input node.
    pub volts: f32,
    /// Voltage across the low-side resistor.
    pub divider_volts: f32,
    /// Raw converter sample.
    pub raw: u16,
}

/// Calibrated voltage sensor behind a resistive divider.
pub struct VoltageSensor<A> {
    source: A,
    low_ratio: f32,
    full_ratio: f32,
    last: Reading,
}

impl<A: AnalogSource> VoltageSensor<A> {
    /// Binds the sensor to a sample source and fixes the conversion ratios.
    ///
    /// The resistor values only enter as the ratio `low / (low + high)`, so
    /// any consistent unit works.
    pub fn new(source: A, r_high_ohms: f32, r_low_ohms: f32, scale: AdcScale) -> Self {
        let divider_ratio = r_low_ohms / (r_low_ohms + r_high_ohms);
        let low_ratio = f32::from(scale.max_count) / scale.reference_volts;
        let full_ratio = f32::from(scale.max_count) / (scale.reference_volts / divider_ratio);
        Self {
            source,
            low_ratio,
            full_ratio,
            last: Reading::default(),
        }
    }

    /// Takes one hardware sample and derives both voltage domains from it.
    ///
    /// Raw samples outside the converter range are not clamped or flagged,
    /// they scale through the same ratios. The hardware is expected to keep
    /// samples in range.
    pub fn read(&mut self) -> Result<Reading, A::Error> {
        let raw = self.source.read_sample()?;
        self.last = Reading {
            volts: f32::from(raw) / self.full_ratio,
            divider_volts: f32::from(raw) / self.low_ratio,
            raw,
        };
        Ok(self.last)
    }

    /// Full-scale voltage from a fresh sample.
    pub fn volts(&mut self) -> Result<f32, A::Error> {
        Ok(self.read()?.volts)
    }

    /// Divider-side voltage from a fresh sample.
    pub fn divider_volts(&mut self) -> Result<f32, A::Error> {
        Ok(self.read()?.divider_volts)
    }

    /// Raw converter value from a fresh sample.
    pub fn raw_sample(&mut self) -> Result<u16, A::Error> {
        Ok(self.read()?.raw)
    }

    /// Last reading taken, without sampling again.
    ///
    /// Each sampling accessor above triggers its own hardware sample, so a
    /// caller that needs a consistent snapshot across both voltage domains
    /// should call [`read`](VoltageSensor::read) once and use the returned
    /// reading, not the accessors back to back.
    pub fn last_reading(&self) -> Reading {
        self.last
    }
}
