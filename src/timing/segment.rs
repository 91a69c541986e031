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

use snafu::Snafu;

use crate::units::{Beat, Lerp, Tempo, Time};

/// How the tempo evolves over a timing segment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TempoLaw {
    /// The same tempo throughout the segment.
    Constant { tempo: Tempo },
    /// The tempo changes linearly over time from `start` to `end`.
    Linear { start: Tempo, end: Tempo },
}

/// Invalid parameters for a timing segment.
#[derive(Debug, Copy, Clone, PartialEq, Snafu)]
pub enum SegmentError {
    #[snafu(display("Timing segment must span a positive number of beats, got {}", duration))]
    NonPositiveDuration { duration: Beat },
    #[snafu(display("Tempo must be positive and finite, got {}", tempo))]
    NonPositiveTempo { tempo: Tempo },
}

/// A tempo law over a bounded span of beats.
///
/// Positions passed to and returned from a segment are relative to its start.
///
/// # Examples
///
/// ```
/// use syn_roll::timing::TimingSegment;
/// use syn_roll::units::*;
///
/// // Speeding up from 1 to 3 beats per second over 8 beats takes 4 seconds.
/// let ramp = TimingSegment::linear(Beat::new(8.0), Tempo::new(1.0), Tempo::new(3.0));
/// assert_eq!(ramp.total_time(), Time::new(4.0));
/// assert_eq!(ramp.beat_at(Time::new(2.0)), Beat::new(3.0));
/// assert_eq!(ramp.time_at(Beat::new(3.0)), Time::new(2.0));
/// assert_eq!(ramp.tempo_at(Beat::new(8.0)), Tempo::new(3.0));
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimingSegment {
    duration: Beat,
    law: TempoLaw,
    total_time: Time,
}

fn check_duration(duration: Beat) -> Result<(), SegmentError> {
    if duration.value().is_finite() && duration > Beat::ZERO {
        Ok(())
    } else {
        Err(SegmentError::NonPositiveDuration { duration })
    }
}

fn check_tempo(tempo: Tempo) -> Result<(), SegmentError> {
    if tempo.value().is_finite() && tempo > Tempo::ZERO {
        Ok(())
    } else {
        Err(SegmentError::NonPositiveTempo { tempo })
    }
}

impl TimingSegment {
    pub fn try_constant(duration: Beat, tempo: Tempo) -> Result<TimingSegment, SegmentError> {
        check_duration(duration)?;
        check_tempo(tempo)?;
        Ok(TimingSegment {
            duration,
            law: TempoLaw::Constant { tempo },
            total_time: duration / tempo,
        })
    }

    pub fn try_linear(
        duration: Beat,
        start: Tempo,
        end: Tempo,
    ) -> Result<TimingSegment, SegmentError> {
        check_duration(duration)?;
        check_tempo(start)?;
        check_tempo(end)?;
        // The area under the tempo ramp must equal the duration:
        // duration = (start + end) / 2 * total_time
        Ok(TimingSegment {
            duration,
            law: TempoLaw::Linear { start, end },
            total_time: duration * 2.0 / (start + end),
        })
    }

    /// A segment of `duration` beats played at a constant tempo.
    ///
    /// # Panics
    ///
    /// If the duration or the tempo is not positive.
    pub fn constant(duration: Beat, tempo: Tempo) -> TimingSegment {
        Self::try_constant(duration, tempo).unwrap_or_else(|err| panic!("{}", err))
    }

    /// A segment of `duration` beats whose tempo moves linearly from `start` to `end`.
    ///
    /// # Panics
    ///
    /// If the duration or one of the tempos is not positive.
    pub fn linear(duration: Beat, start: Tempo, end: Tempo) -> TimingSegment {
        Self::try_linear(duration, start, end).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Length of the segment in beats.
    pub fn duration(&self) -> Beat {
        self.duration
    }

    pub fn law(&self) -> TempoLaw {
        self.law
    }

    /// Length of the segment in seconds.
    pub fn total_time(&self) -> Time {
        self.total_time
    }

    /// Number of beats played `time` seconds after the start of the segment.
    pub fn beat_at(&self, time: Time) -> Beat {
        match self.law {
            TempoLaw::Constant { tempo } => tempo * time,
            TempoLaw::Linear { start, end } => {
                // Area of the trapezoid below the tempo ramp up to `time`.
                let reached = start.lerp(end, time / self.total_time);
                (start + reached) / 2.0 * time
            }
        }
    }

    /// Seconds from the start of the segment until `beat` is played.
    pub fn time_at(&self, beat: Beat) -> Time {
        match self.law {
            TempoLaw::Constant { tempo } => beat / tempo,
            TempoLaw::Linear { start, .. } => {
                // beat = s*t + a*t^2/2 for the acceleration a = (end - start) / total_time.
                // The positive root is t = 2*beat / (s + sqrt(s^2 + 2*a*beat)), where the
                // square root is the tempo reached at `beat`. This form does not
                // cancel for flat ramps and never divides by a = 0.
                beat * 2.0 / (start + self.tempo_at(beat))
            }
        }
    }

    /// The tempo at `beat` beats after the start of the segment.
    pub fn tempo_at(&self, beat: Beat) -> Tempo {
        match self.law {
            TempoLaw::Constant { tempo } => tempo,
            TempoLaw::Linear { start, end } => {
                let acceleration = (end - start).value() / self.total_time.value();
                let squared = start.value().powi(2) + 2.0 * acceleration * beat.value();
                Tempo::new(squared.max(0.0).sqrt())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn constant_round_trip() {
        let seg = TimingSegment::constant(Beat::new(4.0), Tempo::new(2.0));
        assert_eq!(seg.total_time(), Time::new(2.0));
        for i in 0..=100 {
            let t = seg.total_time() * (i as f64 / 100.0);
            assert_close(seg.time_at(seg.beat_at(t)).value(), t.value());
        }
        assert_eq!(seg.tempo_at(Beat::new(3.0)), Tempo::new(2.0));
    }

    #[test]
    fn linear_full_length() {
        let ramps = [(1.0, 3.0), (3.0, 1.0), (2.0, 2.0), (0.25, 8.0), (5.0, 5.0 + 1e-12)];
        for &(start, end) in ramps.iter() {
            let seg = TimingSegment::linear(Beat::new(6.0), Tempo::new(start), Tempo::new(end));
            assert_close(seg.total_time().value(), 12.0 / (start + end));
            assert_close(seg.beat_at(seg.total_time()).value(), 6.0);
            assert_close(seg.time_at(Beat::new(6.0)).value(), seg.total_time().value());
            assert_close(seg.tempo_at(Beat::ZERO).value(), start);
            assert_close(seg.tempo_at(Beat::new(6.0)).value(), end);
        }
    }

    #[test]
    fn linear_inverse() {
        // accelerating, decelerating and flat ramps all pick the non-negative root
        let ramps = [(1.0, 3.0), (3.0, 1.0), (2.0, 2.0), (0.1, 10.0), (10.0, 0.1)];
        for &(start, end) in ramps.iter() {
            let seg = TimingSegment::linear(Beat::new(5.0), Tempo::new(start), Tempo::new(end));
            for i in 0..=50 {
                let b = Beat::new(5.0 * i as f64 / 50.0);
                let t = seg.time_at(b);
                assert!(t >= Time::ZERO && t <= seg.total_time() + Time::new(1e-9));
                assert_close(seg.beat_at(t).value(), b.value());
            }
        }
    }

    #[test]
    fn flat_ramp_matches_constant() {
        let flat = TimingSegment::linear(Beat::new(4.0), Tempo::new(2.0), Tempo::new(2.0));
        let constant = TimingSegment::constant(Beat::new(4.0), Tempo::new(2.0));
        assert_eq!(flat.total_time(), constant.total_time());
        for i in 0..=8 {
            let b = Beat::new(i as f64 / 2.0);
            assert_close(flat.time_at(b).value(), constant.time_at(b).value());
        }
    }

    #[test]
    fn tempo_follows_time_linearly() {
        let seg = TimingSegment::linear(Beat::new(8.0), Tempo::new(1.0), Tempo::new(3.0));
        // halfway through in time, the tempo is halfway between the endpoints
        let half = seg.beat_at(seg.total_time() / 2.0);
        assert_close(seg.tempo_at(half).value(), 2.0);
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(
            TimingSegment::try_constant(Beat::ZERO, Tempo::new(1.0)),
            Err(SegmentError::NonPositiveDuration { duration: Beat::ZERO })
        );
        assert_eq!(
            TimingSegment::try_linear(Beat::new(1.0), Tempo::new(1.0), Tempo::new(-1.0)),
            Err(SegmentError::NonPositiveTempo {
                tempo: Tempo::new(-1.0)
            })
        );
        assert!(TimingSegment::try_constant(Beat::new(1.0), Tempo::new(f64::NAN)).is_err());
        assert!(TimingSegment::try_constant(Beat::new(f64::INFINITY), Tempo::new(1.0)).is_err());
    }

    #[test]
    #[should_panic(expected = "Tempo must be positive")]
    fn zero_tempo_panics() {
        TimingSegment::constant(Beat::new(4.0), Tempo::ZERO);
    }

    #[test]
    #[should_panic(expected = "positive number of beats")]
    fn negative_duration_panics() {
        TimingSegment::linear(Beat::new(-4.0), Tempo::new(1.0), Tempo::new(2.0));
    }
}
