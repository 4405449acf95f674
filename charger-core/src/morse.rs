//! Morse code telemetry on a single output line.
//!
//! Every duration is a multiple of a tempo value in milliseconds. The
//! mark-space ratios deviate from textbook Morse: a dash is five dot-lengths
//! instead of three, and every pulse carries three units of trailing low
//! time, because the wider spacing reads far better off a bare LED. The
//! default tempo lands near NATO signalling speed (8 WPM).
//!
//! # Timing
//! - dot: high 1x tempo, low 3x tempo
//! - dash: high 5x tempo, low 3x tempo
//! - extra gap after each character: 3x tempo
//! - gap after a space and after each transmission: 6x tempo
//! - wake-up bursts: fixed 25 ms flashes, independent of tempo
//!
//! Sending blocks the caller for the full duration of the pulse train.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::status::StatusSink;

/// Pulse pattern for a supported character, dots and dashes only.
///
/// Characters outside the table map to `None` and are skipped by the sender,
/// so arbitrary free text can be transmitted without rejection.
fn pattern_for(c: char) -> Option<&'static str> {
    let pattern = match c.to_ascii_uppercase() {
        'A' => ".-",
        'B' => "-...",
        'C' => "-.-.",
        'D' => "-..",
        'E' => ".",
        'F' => "..-.",
        'G' => "--.",
        'H' => "....",
        'I' => "..",
        'J' => ".---",
        'K' => "-.-",
        'L' => ".-..",
        'M' => "--",
        'N' => "-.",
        'O' => "---",
        'P' => ".--.",
        'Q' => "--.-",
        'R' => ".-.",
        'S' => "...",
        'T' => "-",
        'U' => "..-",
        'V' => "...-",
        'W' => ".--",
        'X' => "-..-",
        'Y' => "-.--",
        'Z' => "--..",
        '0' => "-----",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        '.' => ".-.-.-",
        '?' => "..--..",
        _ => return None,
    };
    Some(pattern)
}

/// Sends timing-coded characters by pulsing an output line.
///
/// The line is always returned low between and after each timed pulse.
pub struct MorseSender<O, D> {
    line: O,
    delay: D,
    tempo_ms: u32,
}

impl<O: OutputPin, D: DelayNs> MorseSender<O, D> {
    /// Default base time unit in milliseconds.
    pub const DEFAULT_TEMPO_MS: u32 = 100;

    /// Binds the sender to an output line and a delay provider.
    pub fn new(line: O, delay: D) -> Self {
        Self {
            line,
            delay,
            tempo_ms: Self::DEFAULT_TEMPO_MS,
        }
    }

    /// Sets the base time unit. `tempo_ms` must be nonzero.
    ///
    /// Speeding up much beyond the default tends to break readability on an
    /// LED, slowing down is always safe.
    pub fn set_tempo(&mut self, tempo_ms: u32) {
        debug_assert!(tempo_ms > 0);
        self.tempo_ms = tempo_ms;
    }

    /// Current base time unit in milliseconds.
    pub fn tempo(&self) -> u32 {
        self.tempo_ms
    }

    /// Sends `text` character by character, then a trailing word gap.
    ///
    /// The trailing gap keeps back-to-back transmissions readable whether or
    /// not the text already ends in a space.
    pub fn transmit(&mut self, text: &str) -> Result<(), O::Error> {
        for c in text.chars() {
            self.send_char(c)?;
        }
        self.word_gap();
        Ok(())
    }

    /// Sends a single character, including its inter-character gap.
    ///
    /// A space emits only a word gap. `.` and `?` get one extra gap in front
    /// and a doubled gap behind, which makes the pause around punctuation
    /// perceptible. Unsupported characters emit nothing at all.
    pub fn send_char(&mut self, c: char) -> Result<(), O::Error> {
        if c == ' ' {
            self.word_gap();
            return Ok(());
        }
        let Some(pattern) = pattern_for(c) else {
            return Ok(());
        };
        let punctuation = c == '.' || c == '?';
        if punctuation {
            self.char_gap();
        }
        for mark in pattern.chars() {
            match mark {
                '.' => self.dot()?,
                _ => self.dash()?,
            }
        }
        self.char_gap();
        if punctuation {
            self.char_gap();
        }
        Ok(())
    }

    /// Wake-up call for the operator: three bursts of rapid flashes.
    ///
    /// Burst timing is fixed and does not scale with tempo.
    pub fn wake(&mut self) -> Result<(), O::Error> {
        for _ in 0..3 {
            self.burst()?;
        }
        Ok(())
    }

    /// Single rapid flash burst, used to cue an observer before data.
    pub fn attention_burst(&mut self) -> Result<(), O::Error> {
        self.burst()
    }

    /// Radio-style start-of-transmission marker: two groups of three `V`s at
    /// triple speed. The previous tempo is restored afterwards.
    pub fn start_of_transmission(&mut self) -> Result<(), O::Error> {
        let saved = self.tempo_ms;
        self.tempo_ms = (saved / 3).max(1);
        for _ in 0..2 {
            for _ in 0..3 {
                self.send_char('V')?;
            }
            self.word_gap();
        }
        self.tempo_ms = saved;
        Ok(())
    }

    fn burst(&mut self) -> Result<(), O::Error> {
        for _ in 0..20 {
            self.line.set_high()?;
            self.delay.delay_ms(25);
            self.line.set_low()?;
            self.delay.delay_ms(25);
        }
        self.delay.delay_ms(250);
        Ok(())
    }

    fn dot(&mut self) -> Result<(), O::Error> {
        self.mark(1)
    }

    fn dash(&mut self) -> Result<(), O::Error> {
        self.mark(5)
    }

    fn mark(&mut self, units: u32) -> Result<(), O::Error> {
        self.line.set_high()?;
        self.delay.delay_ms(units * self.tempo_ms);
        self.line.set_low()?;
        self.delay.delay_ms(3 * self.tempo_ms);
        Ok(())
    }

    fn char_gap(&mut self) {
        self.delay.delay_ms(3 * self.tempo_ms);
    }

    fn word_gap(&mut self) {
        self.delay.delay_ms(6 * self.tempo_ms);
    }
}

impl<O: OutputPin, D: DelayNs> StatusSink for MorseSender<O, D> {
    type Error = O::Error;

    fn attention(&mut self) -> Result<(), O::Error> {
        self.attention_burst()
    }

    fn send(&mut self, text: &str) -> Result<(), O::Error> {
        self.transmit(text)
    }
}
