//! Hardware-independent core of a PWM solar charge controller for lead-acid
//! batteries.
//!
//! Three building blocks, each generic over `embedded-hal` traits so they run
//! unchanged on target hardware and in host tests:
//! - [`sensor::VoltageSensor`]: converts raw ADC samples into calibrated
//!   voltages through a resistive-divider model
//! - [`charge::ChargePwm`]: the three-mode charge regulator (off, trickle,
//!   hard-on) driving a duty-cycle output
//! - [`morse::MorseSender`]: timing-coded status telemetry on a single LED
//!
//! The regulator reports every mode transition through an injected
//! [`status::StatusSink`], so firmware wires in a Morse LED while tests can
//! substitute a recorder or [`status::NullStatus`].

#![cfg_attr(not(test), no_std)]

pub mod charge;
pub mod morse;
pub mod sensor;
pub mod status;

pub use charge::{ChargeMode, ChargePwm};
pub use morse::MorseSender;
pub use sensor::{AdcScale, AnalogSource, Reading, VoltageSensor};
pub use status::{NullStatus, StatusSink};
