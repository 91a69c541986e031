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

//! The mapping between musical beats and wall-clock time.
//!
//! A song's tempo is described by a sequence of [`TimingSegment`]s. The
//! [`TempoCursor`] walks along them while the song plays, keeping track of the
//! current position on both axes.

use std::fmt;

use snafu::Snafu;

use crate::units::{Beat, Time};

mod cursor;
mod segment;

pub use cursor::TempoCursor;
pub use segment::{SegmentError, TempoLaw, TimingSegment};

/// Slack allowed when deciding whether the end of a song was overrun.
pub const TIME_EPSILON: Time = Time::new(1e-9);

/// Slack allowed when deciding whether a beat lies within a segment.
pub const BEAT_EPSILON: Beat = Beat::new(1e-9);

/// A single point on the time and beat axes.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct TimePoint {
    /// Seconds since the start of the song.
    pub time: Time,
    /// Beats since the start of the song.
    pub beat: Beat,
    /// Time elapsed during the tick that led to this point.
    /// Zero for fixed points such as the bounds of a note.
    pub dt: Time,
    /// Beats elapsed during the tick that led to this point.
    /// Zero for fixed points such as the bounds of a note.
    pub dbeat: Beat,
}

impl TimePoint {
    pub const ZERO: TimePoint = TimePoint::fixed(Time::ZERO, Beat::ZERO);

    /// A point without tick deltas.
    pub const fn fixed(time: Time, beat: Beat) -> TimePoint {
        TimePoint {
            time,
            beat,
            dt: Time::ZERO,
            dbeat: Beat::ZERO,
        }
    }
}

/// The span during which a note sounds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Period {
    pub start: TimePoint,
    pub end: TimePoint,
}

impl Period {
    pub fn new(start: TimePoint, end: TimePoint) -> Period {
        Period { start, end }
    }

    /// How far `now` has progressed through the period, measured in beats.
    /// Clamped to `[0, 1]`; a period without extent counts as not started.
    pub fn beat_fraction(&self, now: &TimePoint) -> f64 {
        let span = self.end.beat - self.start.beat;
        if span <= Beat::ZERO {
            return 0.0;
        }
        ((now.beat - self.start.beat) / span).max(0.0).min(1.0)
    }

    /// How far `now` has progressed through the period, measured in seconds.
    /// Clamped to `[0, 1]`; a period without extent counts as not started.
    pub fn time_fraction(&self, now: &TimePoint) -> f64 {
        let span = self.end.time - self.start.time;
        if span <= Time::ZERO {
            return 0.0;
        }
        ((now.time - self.start.time) / span).max(0.0).min(1.0)
    }

    /// Whether `time` lies within the closed interval of the period.
    pub fn contains(&self, time: Time) -> bool {
        self.start.time <= time && time <= self.end.time
    }
}

/// Why a beat could not be converted to a point in time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidBeatReason {
    /// The beat has already been played.
    InPast,
    /// The beat lies after the last timing segment.
    PastEnd,
}

impl fmt::Display for InvalidBeatReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidBeatReason::InPast => f.write_str("beat in the past"),
            InvalidBeatReason::PastEnd => f.write_str("beat past end of song"),
        }
    }
}

/// Runtime failures of the tempo cursor.
#[derive(Debug, Copy, Clone, PartialEq, Snafu)]
pub enum TimingError {
    #[snafu(display("Invalid beat {}: {}", beat, reason))]
    InvalidBeat {
        beat: Beat,
        reason: InvalidBeatReason,
    },
    #[snafu(display("Ran out of timing segments {} after the end of the song", overshoot))]
    EndOfSong { overshoot: Time },
}
