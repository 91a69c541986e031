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

//! The scheduler and mixer turning a [`Song`] into a stream of samples.
//!
//! On construction, every note of the song is resolved to absolute time
//! bounds and becomes an [`Instruction`]. The instructions are sorted by their
//! start time once, so on every tick the player only has to look at the front
//! of the pending schedule and at the notes that are currently sounding.
//!
//! ```
//! use syn_roll::generator::Waveform;
//! use syn_roll::notation::*;
//! use syn_roll::player::Player;
//! use syn_roll::timing::TimingSegment;
//! use syn_roll::units::*;
//!
//! let mut song = Song::new();
//! song.add_segment(TimingSegment::constant(Beat::new(4.0), Tempo::new(2.0)));
//! song.add_note(Note::new(
//!     PitchEnvelope::constant(Tone::ZERO),
//!     VolumeEnvelope::simple(0.5, 0.5),
//!     Waveform::Sine,
//!     Hit::new(Beat::ZERO, Beat::new(4.0)),
//! ));
//!
//! let mut player = Player::new(&song).unwrap();
//! player.advance(Time::new(1.0)).unwrap();
//! assert_eq!(player.active_count(), 1);
//! assert!(player.sound().left.abs() <= 0.5);
//! ```

use std::iter::Peekable;
use std::vec;

use log::{debug, trace};
use snafu::{ResultExt, Snafu};

use crate::generator::{Oscillator, PitchGenerator, VolumeGenerator, FALLOFF};
use crate::notation::{Note, Song};
use crate::timing::{Period, TempoCursor, TimePoint, TimingError};
use crate::units::Time;
use crate::wave::Stereo;

/// Failures while turning the notes of a song into instructions.
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum ScheduleError {
    #[snafu(display("Cannot schedule note #{}: {}", index, source))]
    UnresolvableNote { index: usize, source: TimingError },
}

/// Tuning knobs of the player.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Length of the fade in and fade out applied to every note.
    pub falloff: Time,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { falloff: FALLOFF }
    }
}

/// A note bound to absolute time, together with the generators producing its sound.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Position of the note in the song it was created from.
    note_index: usize,
    bounds: Period,
    accent: f64,
    pitch: PitchGenerator,
    volume: VolumeGenerator,
    oscillator: Oscillator,
}

impl Instruction {
    fn new(note_index: usize, note: &Note, bounds: Period, config: &PlayerConfig) -> Self {
        Self {
            note_index,
            bounds,
            accent: note.accent(),
            pitch: PitchGenerator::new(note.pitch()),
            volume: VolumeGenerator::new(note.volume(), config.falloff),
            oscillator: Oscillator::new(note.waveform()),
        }
    }

    pub fn note_index(&self) -> usize {
        self.note_index
    }

    pub fn bounds(&self) -> &Period {
        &self.bounds
    }

    pub fn start(&self) -> Time {
        self.bounds.start.time
    }

    pub fn end(&self) -> Time {
        self.bounds.end.time
    }

    /// Produce the next sample and the peak gain it was produced with.
    fn render(&mut self, now: &TimePoint) -> (Stereo<f64>, f64) {
        let tone = self.pitch.pitch_at(&self.bounds, now);
        let gain = self.volume.volume_at(&self.bounds, now) * self.accent;
        let sample = self.oscillator.sample(now.dt, tone, gain);
        (sample, gain.peak())
    }
}

/// Plays a song tick by tick.
///
/// The driver calls [`Player::advance`] and then [`Player::sound`] once per sample.
/// Neither of them allocates.
#[derive(Debug)]
pub struct Player {
    cursor: TempoCursor,
    /// Instructions that have not started yet, ordered by start time.
    pending: Peekable<vec::IntoIter<Instruction>>,
    /// Instructions that are currently sounding.
    active: Vec<Instruction>,
    sound: Stereo<f64>,
    normalization: f64,
    length: Time,
}

impl Player {
    /// Schedule all notes of `song` with the default configuration.
    ///
    /// # Panics
    ///
    /// If the song has no timing segments.
    pub fn new(song: &Song) -> Result<Player, ScheduleError> {
        Player::with_config(song, PlayerConfig::default())
    }

    /// # Panics
    ///
    /// If the song has no timing segments.
    pub fn with_config(song: &Song, config: PlayerConfig) -> Result<Player, ScheduleError> {
        assert!(
            !song.segments().is_empty(),
            "cannot play a song without timing segments"
        );
        let cursor = TempoCursor::from_segments(song.segments().iter().copied());
        let length: Time = song.segments().iter().map(|s| s.total_time()).sum();

        let mut schedule = Vec::with_capacity(song.notes().len());
        for (index, note) in song.notes().iter().enumerate() {
            let start = cursor
                .beat_to_time(note.start())
                .context(UnresolvableNote { index })?;
            let end = cursor
                .beat_to_time(note.end())
                .context(UnresolvableNote { index })?;
            let bounds = Period::new(
                TimePoint::fixed(start, note.start()),
                TimePoint::fixed(end, note.end()),
            );
            schedule.push(Instruction::new(index, note, bounds, &config));
        }
        // Stable, so notes starting together are admitted in the order they were added.
        schedule.sort_by(|a, b| a.start().cmp(&b.start()));

        let capacity = max_overlap(&schedule);
        debug!(
            "scheduled {} notes over {:.3} ({:.2}), at most {} at once",
            schedule.len(),
            length,
            song.beat_length(),
            capacity
        );

        Ok(Player {
            cursor,
            pending: schedule.into_iter().peekable(),
            active: Vec::with_capacity(capacity),
            sound: Stereo::mono(0.0),
            normalization: 0.0,
            length,
        })
    }

    /// Move the song forward by `dt` and compute the sample at the new position.
    ///
    /// When the song ends during this tick, all remaining notes are dropped, the
    /// sound becomes silent and [`TimingError::EndOfSong`] is returned.
    ///
    /// # Panics
    ///
    /// If `dt` is negative or NaN.
    pub fn advance(&mut self, dt: Time) -> Result<(), TimingError> {
        if let Err(err) = self.cursor.advance(dt) {
            self.finish();
            self.sound = Stereo::mono(0.0);
            self.normalization = 0.0;
            return Err(err);
        }

        let now = self.cursor.now();
        self.retire(now.time);
        self.admit(now.time);
        self.render(&now);

        // No time is left for anything still scheduled to sound.
        if self.cursor.is_exhausted() {
            self.finish();
        }
        Ok(())
    }

    /// The sample computed by the last call to [`Player::advance`].
    ///
    /// Nominally in `[-1, 1]` on both channels, but not clamped.
    pub fn sound(&self) -> Stereo<f64> {
        self.sound
    }

    /// The current position in the song.
    pub fn now(&self) -> TimePoint {
        self.cursor.now()
    }

    pub fn cursor(&self) -> &TempoCursor {
        &self.cursor
    }

    /// Total length of the song in seconds.
    pub fn length(&self) -> Time {
        self.length
    }

    /// The sum of the peak gains of all notes in the last tick.
    /// The mixed signal is divided by this value if it exceeds one.
    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    pub fn active(&self) -> impl Iterator<Item = &Instruction> {
        self.active.iter()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether all notes have been played.
    pub fn is_finished(&self) -> bool {
        self.active.is_empty() && self.pending_count() == 0
    }

    fn retire(&mut self, now: Time) {
        self.active.retain(|instruction| {
            let sounding = instruction.end() >= now;
            if !sounding {
                trace!("{:.6}: release note #{}", now, instruction.note_index);
            }
            sounding
        });
    }

    fn admit(&mut self, now: Time) {
        while let Some(instruction) = self.pending.next_if(|i| i.start() <= now) {
            if instruction.end() < now {
                // over before the tick ever reached it
                trace!("{:.6}: skip note #{}", now, instruction.note_index);
                continue;
            }
            trace!("{:.6}: play note #{}", now, instruction.note_index);
            self.active.push(instruction);
        }
    }

    fn render(&mut self, now: &TimePoint) {
        let mut sum = Stereo::mono(0.0);
        let mut normalization = 0.0;
        for instruction in self.active.iter_mut() {
            let (sample, peak) = instruction.render(now);
            sum += sample;
            normalization += peak;
        }
        self.normalization = normalization;
        self.sound = sum / normalization.max(1.0);
    }

    /// Drop all remaining notes.
    fn finish(&mut self) {
        if !self.is_finished() {
            debug!(
                "{:.6}: end of song, dropping {} active and {} pending notes",
                self.cursor.now().time,
                self.active.len(),
                self.pending.len()
            );
        }
        self.active.clear();
        self.pending.by_ref().for_each(drop);
    }
}

/// The largest number of instructions whose closed time bounds share a common instant.
fn max_overlap(schedule: &[Instruction]) -> usize {
    let mut edges: Vec<(Time, bool)> = Vec::with_capacity(2 * schedule.len());
    for instruction in schedule {
        edges.push((instruction.start(), false));
        edges.push((instruction.end(), true));
    }
    // starts sort before ends at the same instant
    edges.sort();

    let mut current = 0usize;
    let mut max = 0;
    for (_, is_end) in edges {
        if is_end {
            current -= 1;
        } else {
            current += 1;
            max = max.max(current);
        }
    }
    max
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::generator::Waveform;
    use crate::notation::{Hit, PitchEnvelope, VolumeEnvelope};
    use crate::timing::{InvalidBeatReason, TimingSegment};
    use crate::units::{Beat, Tempo, Tone};

    const DT: Time = Time::new(1.0 / 1024.0);

    fn note(start: f64, duration: f64, gain: f64, waveform: Waveform) -> Note {
        Note::new(
            PitchEnvelope::constant(Tone::ZERO),
            VolumeEnvelope::simple(gain, gain),
            waveform,
            Hit::new(Beat::new(start), Beat::new(duration)),
        )
    }

    fn song(notes: Vec<Note>) -> Song {
        let mut song = Song::new();
        song.add_segment(TimingSegment::constant(Beat::new(4.0), Tempo::new(2.0)));
        for n in notes {
            song.add_note(n);
        }
        song
    }

    #[test]
    fn single_note_fades_out_and_retires() {
        let song = song(vec![note(0.0, 4.0, 0.5, Waveform::Sine)]);
        let mut player = Player::new(&song).unwrap();
        assert_eq!(player.length(), Time::new(2.0));
        assert_eq!(player.pending_count(), 1);

        let mut loudest_tail: f64 = 0.0;
        for tick in 1..=2048 {
            player.advance(DT).unwrap();
            let now = player.now().time;
            let sound = player.sound();
            assert!(sound.left.abs() <= 0.5 + 1e-12);
            if tick < 2048 {
                assert_eq!(player.active_count(), 1);
            }
            if now > Time::new(0.02) && now < Time::new(1.98) {
                assert_eq!(player.normalization(), 0.5);
            }
            if now >= Time::new(1.998) {
                loudest_tail = loudest_tail.max(sound.left.abs());
            }
        }
        assert_eq!(player.now().time, Time::new(2.0));
        assert!(loudest_tail <= 0.05 + 1e-9, "tail too loud: {}", loudest_tail);
        assert_eq!(player.active_count(), 0);
        assert!(player.is_finished());
        assert!(player.sound().left.abs() < 1e-12);
    }

    #[test]
    fn overlapping_notes_are_normalized() {
        let song = song(vec![
            note(0.0, 4.0, 0.6, Waveform::Square),
            note(1.0, 2.0, 0.8, Waveform::Square),
        ]);
        let mut player = Player::new(&song).unwrap();
        let mut overlap_ticks = 0;
        while player.advance(DT).is_ok() && !player.is_finished() {
            let now = player.now().time;
            let sound = player.sound();
            assert!(sound.left.abs() <= 1.0 && sound.right.abs() <= 1.0);
            if now > Time::new(0.55) && now < Time::new(1.45) {
                assert_eq!(player.active_count(), 2);
                assert!(player.normalization() >= 1.4 - 1e-12);
                overlap_ticks += 1;
            }
        }
        assert!(overlap_ticks > 900);
    }

    #[test]
    fn mix_stays_bounded() {
        let notes = (0..8)
            .map(|i| {
                let waveform = [Waveform::Sine, Waveform::Saw, Waveform::Square][i % 3];
                note(i as f64 * 0.25, 2.0, 1.0, waveform)
            })
            .collect();
        let mut player = Player::new(&song(notes)).unwrap();
        for _ in 0..2048 {
            player.advance(DT).unwrap();
            let sound = player.sound();
            assert!(sound.left.abs() <= 1.0 + 1e-12);
            assert!(sound.right.abs() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn accent_scales_gain() {
        let quiet = Note::new(
            PitchEnvelope::constant(Tone::ZERO),
            VolumeEnvelope::simple(0.8, 0.8),
            Waveform::Square,
            Hit::new(Beat::ZERO, Beat::new(4.0)).with_accent(0.5),
        );
        let mut player = Player::new(&song(vec![quiet])).unwrap();
        player.advance(Time::new(1.0)).unwrap();
        assert!((player.normalization() - 0.4).abs() < 1e-12);
        assert!((player.sound().left.abs() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn separate_notes_never_overlap() {
        let notes = (0..4)
            .map(|i| note(i as f64, 0.9, 0.7, Waveform::Saw))
            .collect();
        let mut player = Player::new(&song(notes)).unwrap();
        let mut played = Vec::new();
        for _ in 0..2048 {
            player.advance(DT).unwrap();
            assert!(player.active_count() <= 1);
            for instruction in player.active() {
                if played.last() != Some(&instruction.note_index()) {
                    played.push(instruction.note_index());
                }
            }
        }
        assert_eq!(played, vec![0, 1, 2, 3]);
    }

    #[test]
    fn simultaneous_notes_keep_insertion_order() {
        let song = song(vec![
            note(1.0, 1.0, 0.1, Waveform::Sine),
            note(0.0, 3.0, 0.1, Waveform::Sine),
            note(1.0, 2.0, 0.1, Waveform::Sine),
        ]);
        let mut player = Player::new(&song).unwrap();
        player.advance(Time::new(0.75)).unwrap();
        let order: Vec<_> = player.active().map(|i| i.note_index()).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn short_notes_between_ticks_are_skipped() {
        let song = song(vec![note(1.0, 0.01, 0.5, Waveform::Sine)]);
        let mut player = Player::new(&song).unwrap();
        player.advance(Time::new(0.25)).unwrap();
        player.advance(Time::new(0.5)).unwrap();
        assert_eq!(player.active_count(), 0);
        assert!(player.is_finished());
    }

    #[test]
    fn end_of_song_flushes() {
        let song = song(vec![note(0.0, 4.0, 0.5, Waveform::Sine)]);
        let mut player = Player::new(&song).unwrap();
        player.advance(Time::new(1.0)).unwrap();
        assert_eq!(
            player.advance(Time::new(1.5)),
            Err(TimingError::EndOfSong {
                overshoot: Time::new(0.5)
            })
        );
        assert!(player.is_finished());
        assert_eq!(player.sound(), Stereo::mono(0.0));
        assert_eq!(player.now().time, Time::new(2.0));
    }

    #[test]
    fn notes_past_the_end_are_rejected() {
        let song = song(vec![
            note(0.0, 1.0, 0.5, Waveform::Sine),
            note(3.0, 2.0, 0.5, Waveform::Sine),
        ]);
        let err = Player::new(&song).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::UnresolvableNote {
                index: 1,
                source: TimingError::InvalidBeat {
                    beat: Beat::new(5.0),
                    reason: InvalidBeatReason::PastEnd,
                },
            }
        );
        assert_eq!(
            err.to_string(),
            "Cannot schedule note #1: Invalid beat 5 beats: beat past end of song"
        );
    }

    #[test]
    fn bounds_follow_the_tempo() {
        let mut song = Song::new();
        song.add_segment(TimingSegment::constant(Beat::new(2.0), Tempo::new(1.0)));
        song.add_segment(TimingSegment::linear(
            Beat::new(8.0),
            Tempo::new(1.0),
            Tempo::new(3.0),
        ));
        song.add_note(note(1.0, 4.0, 0.5, Waveform::Sine));
        let mut player = Player::new(&song).unwrap();
        player.advance(Time::new(1.5)).unwrap();
        let instruction = player.active().next().unwrap();
        assert_eq!(instruction.start(), Time::new(1.0));
        assert_eq!(instruction.end(), Time::new(4.0));
        assert_eq!(player.length(), Time::new(6.0));
    }

    #[test]
    fn max_overlap_counts_touching_bounds() {
        let config = PlayerConfig::default();
        let n = note(0.0, 1.0, 0.5, Waveform::Sine);
        let at = |start: f64, end: f64| {
            let bounds = Period::new(
                TimePoint::fixed(Time::new(start), Beat::ZERO),
                TimePoint::fixed(Time::new(end), Beat::ZERO),
            );
            Instruction::new(0, &n, bounds, &config)
        };
        assert_eq!(max_overlap(&[]), 0);
        assert_eq!(max_overlap(&[at(0.0, 1.0), at(2.0, 3.0)]), 1);
        assert_eq!(max_overlap(&[at(0.0, 1.0), at(1.0, 2.0)]), 2);
        assert_eq!(max_overlap(&[at(0.0, 3.0), at(1.0, 2.0), at(1.5, 1.5)]), 3);
    }

    #[test]
    #[should_panic(expected = "without timing segments")]
    fn empty_song_panics() {
        let _ = Player::new(&Song::new());
    }

    #[test]
    #[should_panic(expected = "negative time")]
    fn nan_dt_panics() {
        let mut player = Player::new(&song(vec![note(0.0, 4.0, 0.5, Waveform::Sine)])).unwrap();
        let _ = player.advance(Time::new(f64::NAN));
    }
}
