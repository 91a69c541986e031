// syn.txt -- a text based synthesizer and audio workstation
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::units::{Time, Tone};
use crate::wave::Stereo;

/// Position within one period of a wave, always in `[0, 1)`.
///
/// ```
/// use syn_roll::generator::Phase;
///
/// assert_eq!(Phase::new(1.25).offset(), 0.25);
/// assert_eq!(Phase::new(-0.25).offset(), 0.75);
/// assert_eq!(Phase::new(0.5).step(0.75).offset(), 0.25);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Phase(f64);

impl Phase {
    pub const ZERO: Phase = Phase(0.0);

    pub fn new(offset: f64) -> Phase {
        if !offset.is_finite() {
            return Phase::ZERO;
        }
        let wrapped = offset - offset.floor();
        // tiny negative offsets round up to exactly 1.0
        if wrapped >= 1.0 {
            Phase::ZERO
        } else {
            Phase(wrapped)
        }
    }

    pub fn offset(self) -> f64 {
        self.0
    }

    pub fn step(self, amount: f64) -> Phase {
        Phase::new(self.0 + amount)
    }
}

/// The shape of the wave produced by an oscillator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    /// Rises from -1 to 1 in the first half of the period, then falls back.
    Saw,
    /// -1 in the first half of the period, 1 in the second.
    Square,
}

impl Waveform {
    pub fn eval(self, phase: Phase) -> f64 {
        let offset = phase.offset();
        use std::f64::consts::PI;
        match self {
            Waveform::Sine => (offset * 2.0 * PI).sin(),
            Waveform::Saw => {
                if offset < 0.5 {
                    -1.0 + 4.0 * offset
                } else {
                    1.0 - 4.0 * (offset - 0.5)
                }
            }
            Waveform::Square => {
                if offset < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
        }
    }
}

/// An oscillator whose frequency may change on every tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Oscillator {
    waveform: Waveform,
    wheel: Phase,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            wheel: Phase::ZERO,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn phase(&self) -> Phase {
        self.wheel
    }

    /// Advance the wave by `dt` at the frequency of `tone` and return the new sample scaled by `gain`.
    pub fn sample(&mut self, dt: Time, tone: Tone, gain: Stereo<f64>) -> Stereo<f64> {
        self.wheel = self.wheel.step(tone.frequency() * dt);
        gain * self.waveform.eval(self.wheel)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn phase_wraps() {
        assert_eq!(Phase::new(3.5), Phase::new(0.5));
        assert_eq!(Phase::new(-1e-20), Phase::ZERO);
        assert_eq!(Phase::new(f64::NAN), Phase::ZERO);
        assert!(Phase::new(0.999).offset() < 1.0);
    }

    #[test]
    fn shapes() {
        let at = |w: Waveform, x: f64| w.eval(Phase::new(x));
        assert_eq!(at(Waveform::Saw, 0.0), -1.0);
        assert_eq!(at(Waveform::Saw, 0.25), 0.0);
        assert_eq!(at(Waveform::Saw, 0.5), 1.0);
        assert_eq!(at(Waveform::Saw, 0.75), 0.0);
        assert_eq!(at(Waveform::Square, 0.25), -1.0);
        assert_eq!(at(Waveform::Square, 0.5), 1.0);
        assert!((at(Waveform::Sine, 0.25) - 1.0).abs() < 1e-12);
        assert!(at(Waveform::Sine, 0.0).abs() < 1e-12);
    }

    #[test]
    fn bounded_output() {
        for &waveform in [Waveform::Sine, Waveform::Saw, Waveform::Square].iter() {
            for i in 0..1000 {
                let value = waveform.eval(Phase::new(i as f64 / 1000.0));
                assert!((-1.0..=1.0).contains(&value), "{:?} produced {}", waveform, value);
            }
        }
    }

    #[test]
    fn advances_by_frequency() {
        let mut osc = Oscillator::new(Waveform::Sine);
        // a quarter period of A4
        let s = osc.sample(Time::new(1.0 / 1760.0), Tone::ZERO, Stereo::new(0.5, 0.25));
        assert!((osc.phase().offset() - 0.25).abs() < 1e-12);
        assert!((s.left - 0.5).abs() < 1e-12);
        assert!((s.right - 0.25).abs() < 1e-12);

        // an octave up, the same time span covers twice the distance
        let mut osc = Oscillator::new(Waveform::Square);
        let s = osc.sample(Time::new(0.3 / 440.0), Tone::new(12.0), Stereo::mono(1.0));
        assert!((osc.phase().offset() - 0.6).abs() < 1e-12);
        assert_eq!(s, Stereo::mono(1.0));
    }
}
