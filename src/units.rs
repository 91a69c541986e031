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

//! Dimensioned scalars for time, beats, tempo and pitch.
//!
//! Each quantity wraps a single `f64`. Only the conversions that make sense
//! physically are implemented, so adding a beat to a time does not compile.
//!
//! ```
//! use syn_roll::units::*;
//!
//! let tempo = Tempo::new(2.0);
//! assert_eq!(tempo * Time::new(3.0), Beat::new(6.0));
//! assert_eq!(Beat::new(6.0) / tempo, Time::new(3.0));
//! assert_eq!(Tone::new(12.0).frequency(), Frequency::new(880.0));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops;

use crate::util;

/// Linear interpolation between two values of the same kind.
pub trait Lerp: Sized {
    /// Returns `self` at `t == 0` and `other` at `t == 1`.
    fn lerp(self, other: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(self, other: f64, t: f64) -> f64 {
        self * (1.0 - t) + other * t
    }
}

macro_rules! scalar_unit {
    ($(#[$meta:meta])* $name:ident, $suffix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default)]
        pub struct $name(f64);

        impl $name {
            pub const ZERO: $name = $name(0.0);

            pub const fn new(value: f64) -> Self {
                $name(value)
            }

            pub const fn value(self) -> f64 {
                self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == Ordering::Equal
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        /// Regular values compare as floats do, NaNs are placed by `total_cmp`.
        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0
                    .partial_cmp(&other.0)
                    .unwrap_or_else(|| self.0.total_cmp(&other.0))
            }
        }

        impl Lerp for $name {
            fn lerp(self, other: Self, t: f64) -> Self {
                $name(self.0.lerp(other.0, t))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)?;
                f.write_str($suffix)
            }
        }
    };
}

/// Arithmetic for quantities that form a vector space over `f64`.
macro_rules! linear_ops {
    ($name:ident) => {
        impl ops::Add for $name {
            type Output = $name;

            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: $name) {
                self.0 += rhs.0;
            }
        }

        impl ops::Sub for $name {
            type Output = $name;

            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl ops::SubAssign for $name {
            fn sub_assign(&mut self, rhs: $name) {
                self.0 -= rhs.0;
            }
        }

        impl ops::Neg for $name {
            type Output = $name;

            fn neg(self) -> $name {
                $name(-self.0)
            }
        }

        impl ops::Mul<f64> for $name {
            type Output = $name;

            fn mul(self, rhs: f64) -> $name {
                $name(self.0 * rhs)
            }
        }

        impl ops::Mul<$name> for f64 {
            type Output = $name;

            fn mul(self, rhs: $name) -> $name {
                $name(self * rhs.0)
            }
        }

        impl ops::Div<f64> for $name {
            type Output = $name;

            fn div(self, rhs: f64) -> $name {
                $name(self.0 / rhs)
            }
        }

        /// The ratio of two quantities of the same kind is dimensionless.
        impl ops::Div for $name {
            type Output = f64;

            fn div(self, rhs: $name) -> f64 {
                self.0 / rhs.0
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = $name>>(iter: I) -> $name {
                $name(iter.map(|x| x.0).sum())
            }
        }
    };
}

scalar_unit!(
    /// Wall-clock time in seconds, either a point since the start of a song or a span.
    Time,
    "s"
);
linear_ops!(Time);

scalar_unit!(
    /// Musical time measured in beats.
    Beat,
    " beats"
);
linear_ops!(Beat);

scalar_unit!(
    /// Speed of the music in beats per second.
    Tempo,
    " bps"
);
linear_ops!(Tempo);

scalar_unit!(
    /// Distance between two tones in semitones.
    Interval,
    " st"
);
linear_ops!(Interval);

scalar_unit!(
    /// Oscillation frequency in Hz.
    Frequency,
    " Hz"
);
linear_ops!(Frequency);

scalar_unit!(
    /// Pitch as an offset from A4 (440 Hz) in semitones.
    ///
    /// Tones are points on the pitch axis: they can be shifted by an [`Interval`],
    /// and subtracting two tones yields the interval between them.
    Tone,
    " st from A4"
);

impl Time {
    pub fn seconds(seconds: f64) -> Time {
        Time(seconds)
    }

    pub fn millis(millis: f64) -> Time {
        Time(millis / 1000.0)
    }
}

impl Tempo {
    /// Convert a tempo given in beats per minute.
    ///
    /// ```
    /// # use syn_roll::units::*;
    /// assert_eq!(Tempo::from_bpm(120.0), Tempo::new(2.0));
    /// assert_eq!(Tempo::new(2.0).bpm(), 120.0);
    /// ```
    pub fn from_bpm(bpm: f64) -> Tempo {
        Tempo(bpm / 60.0)
    }

    pub fn bpm(self) -> f64 {
        self.0 * 60.0
    }
}

impl Interval {
    pub const OCTAVE: Interval = Interval(12.0);

    /// An interval spanning a number of octaves plus some semitones.
    ///
    /// ```
    /// # use syn_roll::units::*;
    /// assert_eq!(Interval::octaves(-1, 7.0), Interval::new(-5.0));
    /// ```
    pub fn octaves(octaves: i32, semitones: f64) -> Interval {
        Interval(12.0 * f64::from(octaves) + semitones)
    }
}

impl Frequency {
    /// Concert pitch, the frequency of [`Tone::ZERO`].
    pub const A440: Frequency = Frequency(440.0);
}

impl Tone {
    pub fn frequency(self) -> Frequency {
        Frequency::A440 * util::from_semitones(self.0)
    }
}

impl From<Tone> for Frequency {
    fn from(tone: Tone) -> Frequency {
        tone.frequency()
    }
}

impl ops::Add<Interval> for Tone {
    type Output = Tone;

    fn add(self, rhs: Interval) -> Tone {
        Tone(self.0 + rhs.value())
    }
}

impl ops::AddAssign<Interval> for Tone {
    fn add_assign(&mut self, rhs: Interval) {
        self.0 += rhs.value();
    }
}

impl ops::Sub<Interval> for Tone {
    type Output = Tone;

    fn sub(self, rhs: Interval) -> Tone {
        Tone(self.0 - rhs.value())
    }
}

impl ops::Sub for Tone {
    type Output = Interval;

    fn sub(self, rhs: Tone) -> Interval {
        Interval::new(self.0 - rhs.0)
    }
}

impl ops::Mul<Time> for Tempo {
    type Output = Beat;

    fn mul(self, rhs: Time) -> Beat {
        Beat(self.0 * rhs.0)
    }
}

impl ops::Mul<Tempo> for Time {
    type Output = Beat;

    fn mul(self, rhs: Tempo) -> Beat {
        Beat(self.0 * rhs.0)
    }
}

impl ops::Div<Tempo> for Beat {
    type Output = Time;

    fn div(self, rhs: Tempo) -> Time {
        Time(self.0 / rhs.0)
    }
}

impl ops::Div<Time> for Beat {
    type Output = Tempo;

    fn div(self, rhs: Time) -> Tempo {
        Tempo(self.0 / rhs.0)
    }
}

/// Number of oscillation cycles completed within a time span.
impl ops::Mul<Time> for Frequency {
    type Output = f64;

    fn mul(self, rhs: Time) -> f64 {
        self.0 * rhs.0
    }
}

impl ops::Mul<Frequency> for Time {
    type Output = f64;

    fn mul(self, rhs: Frequency) -> f64 {
        self.0 * rhs.0
    }
}
