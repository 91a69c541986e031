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

use crate::notation::VolumeEnvelope;
use crate::timing::{Period, TimePoint};
use crate::units::{Lerp, Time};
use crate::wave::Stereo;

/// Default length of the fade applied at both ends of a note.
pub const FALLOFF: Time = Time::new(0.02);

/// Gain factor that fades a note in after its onset and out before its end.
///
/// Zero at both bounds, one once `falloff` has passed since the start and at least
/// `falloff` remains until the end, and linear in between. Outside the bounds the
/// factor is zero. A non-positive `falloff` disables the fade.
///
/// ```
/// use syn_roll::generator::volume::decrackle;
/// use syn_roll::timing::{Period, TimePoint};
/// use syn_roll::units::*;
///
/// let bounds = Period::new(
///     TimePoint::fixed(Time::new(1.0), Beat::ZERO),
///     TimePoint::fixed(Time::new(2.0), Beat::new(1.0)),
/// );
/// let at = |t| decrackle(&bounds, &TimePoint::fixed(Time::new(t), Beat::ZERO), Time::new(0.5));
/// assert_eq!(at(1.0), 0.0);
/// assert_eq!(at(1.25), 0.5);
/// assert_eq!(at(1.5), 1.0);
/// assert_eq!(at(1.75), 0.5);
/// assert_eq!(at(2.0), 0.0);
/// ```
pub fn decrackle(bounds: &Period, now: &TimePoint, falloff: Time) -> f64 {
    let since_start = now.time - bounds.start.time;
    let until_end = bounds.end.time - now.time;
    let edge = since_start.min(until_end);
    if edge < Time::ZERO {
        0.0
    } else if falloff <= Time::ZERO {
        1.0
    } else {
        (edge / falloff).min(1.0)
    }
}

/// Produces the stereo gain of a note at any point while it sounds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VolumeGenerator {
    envelope: VolumeEnvelope,
    falloff: Time,
}

impl VolumeGenerator {
    pub fn new(envelope: VolumeEnvelope, falloff: Time) -> Self {
        Self { envelope, falloff }
    }

    /// The gain at `now`, including the fade at the bounds of the note.
    pub fn volume_at(&self, bounds: &Period, now: &TimePoint) -> Stereo<f64> {
        let gain = match self.envelope {
            VolumeEnvelope::Simple { gain } => gain,
            VolumeEnvelope::Fade { from, to } => from.lerp(to, bounds.beat_fraction(now)),
        };
        gain * decrackle(bounds, now, self.falloff)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::units::Beat;

    fn bounds() -> Period {
        Period::new(
            TimePoint::fixed(Time::new(1.0), Beat::new(2.0)),
            TimePoint::fixed(Time::new(2.0), Beat::new(4.0)),
        )
    }

    fn at(time: f64, beat: f64) -> TimePoint {
        TimePoint::fixed(Time::new(time), Beat::new(beat))
    }

    #[test]
    fn decrackle_shape() {
        let b = bounds();
        assert_eq!(decrackle(&b, &at(1.0, 2.0), FALLOFF), 0.0);
        assert_eq!(decrackle(&b, &at(2.0, 4.0), FALLOFF), 0.0);
        assert_eq!(decrackle(&b, &at(1.02, 2.0), FALLOFF), 1.0);
        assert_eq!(decrackle(&b, &at(1.5, 3.0), FALLOFF), 1.0);
        assert_eq!(decrackle(&b, &at(0.5, 1.0), FALLOFF), 0.0);
        assert_eq!(decrackle(&b, &at(2.5, 5.0), FALLOFF), 0.0);

        // monotonic on both ramps
        let mut last = 0.0;
        for i in 0..=20 {
            let factor = decrackle(&b, &at(1.0 + i as f64 * 0.001, 2.0), FALLOFF);
            assert!(factor >= last);
            last = factor;
        }
        for i in 0..=20 {
            let factor = decrackle(&b, &at(1.98 + i as f64 * 0.001, 4.0), FALLOFF);
            assert!(factor <= last);
            last = factor;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn no_falloff() {
        let b = bounds();
        assert_eq!(decrackle(&b, &at(1.0, 2.0), Time::ZERO), 1.0);
        assert_eq!(decrackle(&b, &at(3.0, 6.0), Time::ZERO), 0.0);
    }

    #[test]
    fn simple_is_faded() {
        let gen = VolumeGenerator::new(VolumeEnvelope::simple(0.5, 0.25), FALLOFF);
        assert_eq!(gen.volume_at(&bounds(), &at(1.5, 3.0)), Stereo::new(0.5, 0.25));
        assert_eq!(gen.volume_at(&bounds(), &at(1.0, 2.0)), Stereo::mono(0.0));
        let tail = gen.volume_at(&bounds(), &at(1.99, 3.98));
        assert!((tail.left - 0.25).abs() < 1e-9);
    }

    #[test]
    fn fade_follows_beats() {
        let gen = VolumeGenerator::new(
            VolumeEnvelope::fade(Stereo::new(1.0, 0.0), Stereo::new(0.0, 1.0)),
            FALLOFF,
        );
        let v = gen.volume_at(&bounds(), &at(1.5, 2.5));
        assert!((v.left - 0.75).abs() < 1e-12);
        assert!((v.right - 0.25).abs() < 1e-12);
    }
}
