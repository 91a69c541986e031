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

//! The score: notes positioned in beats, plus the timing segments of the song.

use crate::generator::oscillator::Waveform;
use crate::timing::TimingSegment;
use crate::units::{Beat, Tone};
use crate::wave::Stereo;

/// How the pitch of a note evolves while it sounds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PitchEnvelope {
    /// A single tone for the whole note.
    Constant { tone: Tone },
    /// Glide from one tone to another, linearly in beats.
    Slide { from: Tone, to: Tone },
}

impl PitchEnvelope {
    pub fn constant(tone: Tone) -> PitchEnvelope {
        PitchEnvelope::Constant { tone }
    }

    pub fn slide(from: Tone, to: Tone) -> PitchEnvelope {
        PitchEnvelope::Slide { from, to }
    }
}

/// How loud a note is on the left and right channel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VolumeEnvelope {
    /// A fixed gain per channel.
    Simple { gain: Stereo<f64> },
    /// Gains moving linearly in beats from `from` to `to`.
    Fade { from: Stereo<f64>, to: Stereo<f64> },
}

fn check_gain(gain: Stereo<f64>) {
    for &channel in [gain.left, gain.right].iter() {
        assert!(
            channel.is_finite() && channel >= 0.0,
            "gain must be finite and non-negative, got {}",
            channel
        );
    }
}

impl VolumeEnvelope {
    /// # Panics
    ///
    /// If a gain is negative or not finite.
    pub fn simple(left: f64, right: f64) -> VolumeEnvelope {
        let gain = Stereo::new(left, right);
        check_gain(gain);
        VolumeEnvelope::Simple { gain }
    }

    /// # Panics
    ///
    /// If a gain is negative or not finite.
    pub fn fade(from: Stereo<f64>, to: Stereo<f64>) -> VolumeEnvelope {
        check_gain(from);
        check_gain(to);
        VolumeEnvelope::Fade { from, to }
    }
}

impl Default for VolumeEnvelope {
    fn default() -> Self {
        VolumeEnvelope::simple(0.7, 0.7)
    }
}

/// When a note is played and how hard.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hit {
    /// Beat at which the note starts.
    pub start: Beat,
    /// Number of beats the note lasts.
    pub duration: Beat,
    /// Emphasis of the note in `[0, 1]`, scaling its volume.
    pub accent: f64,
}

impl Hit {
    /// A hit with full accent.
    pub fn new(start: Beat, duration: Beat) -> Hit {
        Hit {
            start,
            duration,
            accent: 1.0,
        }
    }

    pub fn with_accent(self, accent: f64) -> Hit {
        Hit { accent, ..self }
    }

    pub fn end(&self) -> Beat {
        self.start + self.duration
    }
}

/// A single note of the score. Immutable once constructed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Note {
    pitch: PitchEnvelope,
    volume: VolumeEnvelope,
    waveform: Waveform,
    hit: Hit,
}

impl Note {
    /// # Panics
    ///
    /// - If the note starts before the song or has a negative duration.
    /// - If the accent is not in the inclusive interval [0, 1].
    ///
    /// # Examples
    ///
    /// ```
    /// use syn_roll::generator::oscillator::Waveform;
    /// use syn_roll::notation::*;
    /// use syn_roll::units::*;
    ///
    /// let note = Note::new(
    ///     PitchEnvelope::constant(Tone::new(3.0)),
    ///     VolumeEnvelope::default(),
    ///     Waveform::Sine,
    ///     Hit::new(Beat::new(1.0), Beat::new(0.5)),
    /// );
    /// assert_eq!(note.end(), Beat::new(1.5));
    /// assert_eq!(note.accent(), 1.0);
    /// ```
    pub fn new(pitch: PitchEnvelope, volume: VolumeEnvelope, waveform: Waveform, hit: Hit) -> Note {
        assert!(
            hit.start.value().is_finite() && hit.start >= Beat::ZERO,
            "note must not start before the song, got start {}",
            hit.start
        );
        assert!(
            hit.duration.value().is_finite() && hit.duration >= Beat::ZERO,
            "note duration must not be negative, got {}",
            hit.duration
        );
        assert!(
            (0.0..=1.0).contains(&hit.accent),
            "accent must be in [0, 1], got {}",
            hit.accent
        );
        Note {
            pitch,
            volume,
            waveform,
            hit,
        }
    }

    pub fn pitch(&self) -> PitchEnvelope {
        self.pitch
    }

    pub fn volume(&self) -> VolumeEnvelope {
        self.volume
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn hit(&self) -> Hit {
        self.hit
    }

    pub fn start(&self) -> Beat {
        self.hit.start
    }

    pub fn duration(&self) -> Beat {
        self.hit.duration
    }

    pub fn end(&self) -> Beat {
        self.hit.end()
    }

    pub fn accent(&self) -> f64 {
        self.hit.accent
    }

    /// Whether the note sounds at `beat`, i.e. `beat` is in `[start, end)`.
    pub fn is_active_at(&self, beat: Beat) -> bool {
        self.start() <= beat && beat < self.end()
    }

    fn delayed(&self, offset: Beat) -> Note {
        Note {
            hit: Hit {
                start: self.hit.start + offset,
                ..self.hit
            },
            ..*self
        }
    }
}

/// Reports a modification of a [`Song`] while it is being built.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SongEvent {
    SegmentAdded { index: usize, duration: Beat },
    NoteAdded { index: usize, start: Beat, end: Beat },
}

/// A complete score, ready to be handed to a [`Player`](crate::player::Player).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Song {
    segments: Vec<TimingSegment>,
    notes: Vec<Note>,
    /// Sum of the durations of all segments.
    beat_length: Beat,
}

impl Song {
    pub fn new() -> Song {
        Song::default()
    }

    /// Extend the song by another timing segment.
    pub fn add_segment(&mut self, segment: TimingSegment) -> SongEvent {
        self.segments.push(segment);
        self.beat_length += segment.duration();
        SongEvent::SegmentAdded {
            index: self.segments.len() - 1,
            duration: segment.duration(),
        }
    }

    /// Add a note. Notes may be added in any order.
    pub fn add_note(&mut self, note: Note) -> SongEvent {
        self.notes.push(note);
        SongEvent::NoteAdded {
            index: self.notes.len() - 1,
            start: note.start(),
            end: note.end(),
        }
    }

    /// Play `other` after the end of this song.
    ///
    /// The notes of `other` are delayed by the length of this song as it was before
    /// the call. Returns the events of every segment and note that was added.
    pub fn append(&mut self, other: &Song) -> Vec<SongEvent> {
        let offset = self.beat_length;
        let mut events = Vec::with_capacity(other.segments.len() + other.notes.len());
        for segment in other.segments.iter() {
            events.push(self.add_segment(*segment));
        }
        for note in other.notes.iter() {
            events.push(self.add_note(note.delayed(offset)));
        }
        events
    }

    /// All notes sounding at `beat`.
    pub fn active_notes(&self, beat: Beat) -> impl Iterator<Item = &Note> {
        self.notes
            .iter()
            .filter(move |note| note.is_active_at(beat))
    }

    pub fn segments(&self) -> &[TimingSegment] {
        &self.segments
    }

    /// The notes in the order they were added.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn beat_length(&self) -> Beat {
        self.beat_length
    }
}
