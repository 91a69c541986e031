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

use std::collections::VecDeque;

use super::{
    InvalidBeatReason, TimePoint, TimingError, TimingSegment, BEAT_EPSILON, TIME_EPSILON,
};
use crate::units::{Beat, Tempo, Time};

/// Tracks the current position of a song on both the time and beat axes.
///
/// The cursor owns the segments that have not been fully played yet.
/// The front segment is the one containing the current position.
///
/// # Examples
///
/// ```
/// use syn_roll::timing::{TempoCursor, TimingSegment};
/// use syn_roll::units::*;
///
/// let mut cursor = TempoCursor::from_segments(vec![
///     TimingSegment::constant(Beat::new(2.0), Tempo::new(1.0)),
///     TimingSegment::constant(Beat::new(2.0), Tempo::new(2.0)),
/// ]);
/// assert_eq!(cursor.beat_to_time(Beat::new(3.0)), Ok(Time::new(2.5)));
///
/// cursor.advance(Time::new(2.5)).unwrap();
/// assert_eq!(cursor.now().beat, Beat::new(3.0));
/// assert_eq!(cursor.now().dbeat, Beat::new(3.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TempoCursor {
    segments: VecDeque<TimingSegment>,
    /// Position relative to the start of the front segment.
    local: TimePoint,
    /// Position relative to the start of the song.
    global: TimePoint,
}

impl TempoCursor {
    /// A cursor at the start of a song without any timing segments.
    pub fn new() -> TempoCursor {
        TempoCursor::default()
    }

    pub fn from_segments<I: IntoIterator<Item = TimingSegment>>(segments: I) -> TempoCursor {
        TempoCursor {
            segments: segments.into_iter().collect(),
            local: TimePoint::ZERO,
            global: TimePoint::ZERO,
        }
    }

    /// Extend the song by another segment after the last one.
    pub fn push_segment(&mut self, segment: TimingSegment) {
        self.segments.push_back(segment);
    }

    /// The current position since the start of the song, including the deltas of the last tick.
    pub fn now(&self) -> TimePoint {
        self.global
    }

    /// The current position within the current segment.
    pub fn local(&self) -> TimePoint {
        self.local
    }

    /// The tempo at the current position, if any segment is left.
    pub fn tempo(&self) -> Option<Tempo> {
        self.segments
            .front()
            .map(|segment| segment.tempo_at(self.local.beat))
    }

    /// Beats left until the end of the last segment.
    pub fn remaining_beats(&self) -> Beat {
        let total: Beat = self.segments.iter().map(|s| s.duration()).sum();
        (total - self.local.beat).max(Beat::ZERO)
    }

    /// Whether the cursor has reached the end of its last segment.
    pub fn is_exhausted(&self) -> bool {
        match self.segments.front() {
            None => true,
            Some(segment) => {
                self.segments.len() == 1 && self.local.time + TIME_EPSILON >= segment.total_time()
            }
        }
    }

    /// Move forward by `dt` seconds, crossing as many segment boundaries as necessary.
    ///
    /// If the segments run out before `dt` has fully elapsed, the cursor stops at the
    /// end of the last segment, `now().dt` holds the time that was actually advanced,
    /// and [`TimingError::EndOfSong`] reports the rest.
    ///
    /// # Panics
    ///
    /// If `dt` is negative or NaN.
    pub fn advance(&mut self, dt: Time) -> Result<(), TimingError> {
        // compare the raw value, the unit ordering sorts NaN above zero
        assert!(dt.value() >= 0.0, "cannot advance by negative time {}", dt);

        let mut local_time = self.local.time + dt;
        let mut consumed = Beat::ZERO;
        let mut overshoot = Time::ZERO;

        while let Some(segment) = self.segments.front().copied() {
            if local_time < segment.total_time() {
                break;
            }
            if self.segments.len() > 1 {
                local_time -= segment.total_time();
                consumed += segment.duration();
                self.segments.pop_front();
            } else {
                overshoot = local_time - segment.total_time();
                local_time = segment.total_time();
                break;
            }
        }

        let local_beat = match self.segments.front() {
            Some(segment) if local_time >= segment.total_time() => segment.duration(),
            Some(segment) => segment.beat_at(local_time),
            None => {
                overshoot = local_time;
                local_time = Time::ZERO;
                Beat::ZERO
            }
        };

        let advanced = dt - overshoot;
        let dbeat = consumed - self.local.beat + local_beat;
        self.local = TimePoint {
            time: local_time,
            beat: local_beat,
            dt: advanced,
            dbeat,
        };
        self.global = TimePoint {
            time: self.global.time + advanced,
            beat: self.global.beat + dbeat,
            dt: advanced,
            dbeat,
        };

        if overshoot > TIME_EPSILON {
            Err(TimingError::EndOfSong { overshoot })
        } else {
            Ok(())
        }
    }

    /// The time since the start of the song at which `beat` will be played.
    ///
    /// Fails for beats that have already been played and for beats after the
    /// end of the last segment.
    pub fn beat_to_time(&self, beat: Beat) -> Result<Time, TimingError> {
        if beat + BEAT_EPSILON < self.global.beat {
            return Err(TimingError::InvalidBeat {
                beat,
                reason: InvalidBeatReason::InPast,
            });
        }

        // Walk the segments starting from the beginning of the front one.
        let mut time = self.global.time - self.local.time;
        let mut target = beat - (self.global.beat - self.local.beat);
        for segment in self.segments.iter() {
            if target <= segment.duration() + BEAT_EPSILON {
                let within = target.max(Beat::ZERO).min(segment.duration());
                return Ok(time + segment.time_at(within));
            }
            target -= segment.duration();
            time += segment.total_time();
        }

        Err(TimingError::InvalidBeat {
            beat,
            reason: InvalidBeatReason::PastEnd,
        })
    }
}
