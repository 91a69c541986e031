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

use crate::notation::PitchEnvelope;
use crate::timing::{Period, TimePoint};
use crate::units::{Lerp, Tone};

/// Produces the tone of a note at any point while it sounds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PitchGenerator {
    envelope: PitchEnvelope,
}

impl PitchGenerator {
    pub fn new(envelope: PitchEnvelope) -> Self {
        Self { envelope }
    }

    /// The tone at `now`, for a note sounding during `bounds`.
    pub fn pitch_at(&self, bounds: &Period, now: &TimePoint) -> Tone {
        match self.envelope {
            PitchEnvelope::Constant { tone } => tone,
            PitchEnvelope::Slide { from, to } => from.lerp(to, bounds.beat_fraction(now)),
        }
    }
}

impl From<PitchEnvelope> for PitchGenerator {
    fn from(envelope: PitchEnvelope) -> Self {
        PitchGenerator::new(envelope)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::units::{Beat, Time};

    fn bounds() -> Period {
        Period::new(
            TimePoint::fixed(Time::new(1.0), Beat::new(2.0)),
            TimePoint::fixed(Time::new(3.0), Beat::new(4.0)),
        )
    }

    #[test]
    fn constant() {
        let gen = PitchGenerator::new(PitchEnvelope::constant(Tone::new(-5.0)));
        let now = TimePoint::fixed(Time::new(2.0), Beat::new(3.0));
        assert_eq!(gen.pitch_at(&bounds(), &now), Tone::new(-5.0));
    }

    #[test]
    fn slide_follows_beats() {
        let gen = PitchGenerator::from(PitchEnvelope::slide(Tone::ZERO, Tone::new(12.0)));
        // a quarter of the beats, but not a quarter of the time
        let now = TimePoint::fixed(Time::new(2.0), Beat::new(2.5));
        assert_eq!(gen.pitch_at(&bounds(), &now), Tone::new(3.0));
        let before = TimePoint::fixed(Time::new(0.5), Beat::new(1.0));
        assert_eq!(gen.pitch_at(&bounds(), &before), Tone::ZERO);
        let after = TimePoint::fixed(Time::new(4.0), Beat::new(5.0));
        assert_eq!(gen.pitch_at(&bounds(), &after), Tone::new(12.0));
    }
}
