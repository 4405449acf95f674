//! Status telemetry seam.
//!
//! The charge regulator reports mode changes through whatever implements
//! [`StatusSink`]. Firmware wires in a Morse LED; tests substitute a recorder
//! or [`NullStatus`].

use core::convert::Infallible;

/// Consumer of the short status reports emitted on charge-mode transitions.
pub trait StatusSink {
    type Error;

    /// Emits a fixed wake-up pulse train to cue an observer before data.
    fn attention(&mut self) -> Result<(), Self::Error>;

    /// Sends a short text status report.
    fn send(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Sink that discards every report.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NullStatus;

impl StatusSink for NullStatus {
    type Error = Infallible;

    fn attention(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn send(&mut self, _text: &str) -> Result<(), Infallible> {
        Ok(())
    }
}
