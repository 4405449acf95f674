//! Charge-mode state machine driving a PWM output.
//!
//! Three regimes: off, hard-on at full duty, and smart trickle where the
//! duty cycle is proportional to the voltage deficit below target. That
//! tapering makes it a plain proportional controller, no integral or
//! derivative terms. The decision *when* to change regime (target voltage,
//! hysteresis band) belongs to the outer control loop; this type only
//! executes commanded transitions and reports each one through the injected
//! status sink.

use core::fmt::Write;

use embedded_hal::pwm::SetDutyCycle;
use heapless::String;

use crate::status::StatusSink;

/// Charge regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeMode {
    /// Charger output disabled.
    Off,
    /// Duty cycle proportional to the voltage deficit.
    Trickle,
    /// Full duty cycle, maximum charge rate.
    HardOn,
}

/// Errors from the duty-cycle output or the status sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<P, S> {
    /// The duty-cycle primitive rejected a command.
    Duty(P),
    /// The status sink failed while reporting.
    Status(S),
}

/// Charge regulator bound to one duty-cycle output.
///
/// Holds the current mode, the mode saved across [`suspend`]/[`resume`], the
/// last commanded duty value and the last trickle gap.
///
/// [`suspend`]: ChargePwm::suspend
/// [`resume`]: ChargePwm::resume
pub struct ChargePwm<P, S> {
    pwm: P,
    status: S,
    mode: ChargeMode,
    saved_mode: ChargeMode,
    duty: u16,
    gap: f32,
}

impl<P: SetDutyCycle, S: StatusSink> ChargePwm<P, S> {
    /// Binds the regulator to a duty-cycle output and a status sink.
    ///
    /// Starts in [`ChargeMode::Off`] with the output commanded to zero.
    pub fn new(mut pwm: P, status: S) -> Result<Self, Error<P::Error, S::Error>> {
        pwm.set_duty_cycle(0).map_err(Error::Duty)?;
        Ok(Self {
            pwm,
            status,
            mode: ChargeMode::Off,
            saved_mode: ChargeMode::Off,
            duty: 0,
            gap: 0.0,
        })
    }

    /// Full-rate charging. Reports `n`.
    pub fn charge_hard_on(&mut self) -> Result<(), Error<P::Error, S::Error>> {
        self.apply(ChargeMode::HardOn).map_err(Error::Duty)?;
        self.status.send("n").map_err(Error::Status)
    }

    /// Disables the charge output. Reports `f`.
    pub fn charge_off(&mut self) -> Result<(), Error<P::Error, S::Error>> {
        self.apply(ChargeMode::Off).map_err(Error::Duty)?;
        self.status.send("f").map_err(Error::Status)
    }

    /// Disables the charge output without telemetry.
    ///
    /// Used by [`suspend`](ChargePwm::suspend) so brief pauses do not put
    /// noise on the status line.
    pub fn charge_off_silent(&mut self) -> Result<(), Error<P::Error, S::Error>> {
        self.apply(ChargeMode::Off).map_err(Error::Duty)
    }

    /// Proportional trickle charging.
    ///
    /// `gap` is the normalized voltage deficit: 0 at target voltage, 1 at
    /// maximum deficit. Values outside `[0, 1]` are clamped, not rejected.
    /// Reports an attention burst followed by the decimal duty value.
    pub fn charge_trickle(&mut self, gap: f32) -> Result<(), Error<P::Error, S::Error>> {
        self.gap = gap;
        self.apply(ChargeMode::Trickle).map_err(Error::Duty)?;

        // A u16 duty always fits in five digits.
        let mut text: String<5> = String::new();
        write!(text, "{}", self.duty).ok();
        self.status.attention().map_err(Error::Status)?;
        self.status.send(&text).map_err(Error::Status)
    }

    /// Saves the current mode and silences the output.
    ///
    /// Intended for brief pauses, e.g. while a voltage sample is taken
    /// without PWM interference on the rail.
    pub fn suspend(&mut self) -> Result<(), Error<P::Error, S::Error>> {
        self.saved_mode = self.mode;
        self.charge_off_silent()
    }

    /// Re-enters the mode saved by the most recent [`suspend`](ChargePwm::suspend).
    ///
    /// Goes through the normal transition, so duty cycle and telemetry are
    /// re-emitted exactly as if the mode had been freshly entered. Without a
    /// prior suspend this re-enters the construction default, `Off`.
    pub fn resume(&mut self) -> Result<(), Error<P::Error, S::Error>> {
        match self.saved_mode {
            ChargeMode::Off => self.charge_off(),
            ChargeMode::Trickle => self.charge_trickle(self.gap),
            ChargeMode::HardOn => self.charge_hard_on(),
        }
    }

    pub fn is_off(&self) -> bool {
        self.mode == ChargeMode::Off
    }

    pub fn is_trickle(&self) -> bool {
        self.mode == ChargeMode::Trickle
    }

    pub fn is_hard_on(&self) -> bool {
        self.mode == ChargeMode::HardOn
    }

    /// Current charge mode.
    pub fn mode(&self) -> ChargeMode {
        self.mode
    }

    /// Last commanded duty value, in the range of the duty-cycle primitive.
    pub fn duty(&self) -> u16 {
        self.duty
    }

    /// The injected status sink.
    pub fn status(&self) -> &S {
        &self.status
    }

    /// Mutable access to the status sink, e.g. to retune the telegraph tempo
    /// between transmissions.
    pub fn status_mut(&mut self) -> &mut S {
        &mut self.status
    }

    fn apply(&mut self, mode: ChargeMode) -> Result<(), P::Error> {
        let max = self.pwm.max_duty_cycle();
        let duty = match mode {
            ChargeMode::Off => 0,
            ChargeMode::HardOn => max,
            ChargeMode::Trickle => {
                libm::roundf(self.gap.clamp(0.0, 1.0) * f32::from(max)) as u16
            }
        };
        self.pwm.set_duty_cycle(duty)?;
        self.duty = duty;
        self.mode = mode;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{NullStatus, StatusSink};
    use core::convert::Infallible;

    struct FakeDuty {
        duty: u16,
        max: u16,
    }

    impl embedded_hal::pwm::ErrorType for FakeDuty {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakeDuty {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty = duty;
            Ok(())
        }
    }

    // `super::*` pulls in `heapless::String`, so spell out the std one here.
    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<std::string::String>,
        attention_count: usize,
    }

    impl StatusSink for RecordingSink {
        type Error = Infallible;

        fn attention(&mut self) -> Result<(), Infallible> {
            self.attention_count += 1;
            Ok(())
        }

        fn send(&mut self, text: &str) -> Result<(), Infallible> {
            self.sent.push(text.to_string());
            Ok(())
        }
    }

    const MAX: u16 = 1000;

    fn charger() -> ChargePwm<FakeDuty, RecordingSink> {
        ChargePwm::new(FakeDuty { duty: 0, max: MAX }, RecordingSink::default()).unwrap()
    }

    #[test]
    fn starts_off_with_zero_duty() {
        let charger = charger();
        assert!(charger.is_off());
        assert!(!charger.is_trickle());
        assert!(!charger.is_hard_on());
        assert_eq!(charger.duty(), 0);
        assert!(charger.status().sent.is_empty());
    }

    #[test]
    fn hard_on_commands_full_duty_and_reports_n() {
        let mut charger = charger();
        charger.charge_hard_on().unwrap();
        assert!(charger.is_hard_on());
        assert!(!charger.is_off());
        assert!(!charger.is_trickle());
        assert_eq!(charger.duty(), MAX);
        assert_eq!(charger.status().sent, vec!["n"]);
    }

    #[test]
    fn off_reports_f() {
        let mut charger = charger();
        charger.charge_hard_on().unwrap();
        charger.charge_off().unwrap();
        assert!(charger.is_off());
        assert_eq!(charger.duty(), 0);
        assert_eq!(charger.status().sent, vec!["n", "f"]);
    }

    #[test]
    fn silent_off_emits_no_telemetry() {
        let mut charger = charger();
        charger.charge_hard_on().unwrap();
        charger.charge_off_silent().unwrap();
        assert!(charger.is_off());
        assert_eq!(charger.duty(), 0);
        assert_eq!(charger.status().sent, vec!["n"]);
    }

    #[test]
    fn trickle_clamps_gap_below_zero() {
        let mut charger = charger();
        charger.charge_trickle(-0.5).unwrap();
        assert!(charger.is_trickle());
        assert_eq!(charger.duty(), 0);
    }

    #[test]
    fn trickle_clamps_gap_above_one() {
        let mut charger = charger();
        charger.charge_trickle(2.0).unwrap();
        assert_eq!(charger.duty(), MAX);
    }

    #[test]
    fn trickle_duty_is_proportional() {
        let mut charger = charger();
        charger.charge_trickle(0.5).unwrap();
        assert_eq!(charger.duty(), MAX / 2);
        charger.charge_trickle(0.2).unwrap();
        assert_eq!(charger.duty(), MAX / 5);
    }

    #[test]
    fn trickle_reports_attention_then_duty_value() {
        let mut charger = charger();
        charger.charge_trickle(0.5).unwrap();
        assert_eq!(charger.status().attention_count, 1);
        assert_eq!(charger.status().sent, vec!["500"]);
    }

    #[test]
    fn suspend_silences_output_without_telemetry() {
        let mut charger = charger();
        charger.charge_trickle(0.5).unwrap();
        let reports_before = charger.status().sent.len();

        charger.suspend().unwrap();
        assert!(charger.is_off());
        assert_eq!(charger.duty(), 0);
        assert_eq!(charger.status().sent.len(), reports_before);
    }

    #[test]
    fn resume_restores_trickle_mode_and_duty() {
        let mut charger = charger();
        charger.charge_trickle(0.25).unwrap();
        charger.suspend().unwrap();
        charger.resume().unwrap();

        assert!(charger.is_trickle());
        assert_eq!(charger.duty(), 250);
        // telemetry is re-emitted as if the mode had been freshly entered
        assert_eq!(charger.status().sent, vec!["250", "250"]);
        assert_eq!(charger.status().attention_count, 2);
    }

    #[test]
    fn resume_restores_hard_on() {
        let mut charger = charger();
        charger.charge_hard_on().unwrap();
        charger.suspend().unwrap();
        charger.resume().unwrap();

        assert!(charger.is_hard_on());
        assert_eq!(charger.duty(), MAX);
        assert_eq!(charger.status().sent, vec!["n", "n"]);
    }

    #[test]
    fn runs_headless_with_null_status() {
        let mut charger = ChargePwm::new(FakeDuty { duty: 0, max: MAX }, NullStatus).unwrap();
        charger.charge_trickle(0.5).unwrap();
        assert_eq!(charger.duty(), MAX / 2);
        charger.charge_off().unwrap();
        assert!(charger.is_off());
    }

    #[test]
    fn resume_without_suspend_reenters_off() {
        let mut charger = charger();
        charger.resume().unwrap();
        assert!(charger.is_off());
        assert_eq!(charger.duty(), 0);
    }
}
