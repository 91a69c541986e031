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

//! A short piece that speeds up and slows down again, to hear the tempo ramps.

use std::io;

use syn_roll::generator::Waveform;
use syn_roll::notation::*;
use syn_roll::play;
use syn_roll::timing::TimingSegment;
use syn_roll::units::*;
use syn_roll::wave::Stereo;

/// Semitones above A4 of an A minor arpeggio.
const ARPEGGIO: [f64; 4] = [0.0, 3.0, 7.0, 12.0];

fn note(tone: f64, hit: Hit, waveform: Waveform) -> Note {
    Note::new(
        PitchEnvelope::constant(Tone::new(tone)),
        VolumeEnvelope::default(),
        waveform,
        hit,
    )
}

/// Eighth notes walking up and down the arpeggio, with a bass note on every bar.
fn arpeggios(segment: TimingSegment, waveform: Waveform) -> Song {
    let mut phrase = Song::new();
    phrase.add_segment(segment);
    let eighths = (segment.duration().value() * 2.0) as usize;
    for i in 0..eighths {
        let step = if (i / 4) % 2 == 0 { i % 4 } else { 3 - i % 4 };
        let accent = if i % 2 == 0 { 1.0 } else { 0.6 };
        let hit = Hit::new(Beat::new(i as f64 * 0.5), Beat::new(0.45)).with_accent(accent);
        phrase.add_note(note(ARPEGGIO[step], hit, waveform));
    }
    for bar in 0..(eighths / 8) {
        phrase.add_note(Note::new(
            PitchEnvelope::constant(Tone::ZERO - Interval::octaves(2, 0.0)),
            VolumeEnvelope::simple(0.5, 0.3),
            Waveform::Square,
            Hit::new(Beat::new(bar as f64 * 4.0), Beat::new(3.5)).with_accent(0.5),
        ));
    }
    phrase
}

/// A bass slide under a chord fading from left to right.
fn coda() -> Song {
    let mut phrase = Song::new();
    phrase.add_segment(TimingSegment::constant(Beat::new(4.0), Tempo::from_bpm(90.0)));
    phrase.add_note(Note::new(
        PitchEnvelope::slide(Tone::new(-17.0), Tone::new(-24.0)),
        VolumeEnvelope::simple(0.6, 0.6),
        Waveform::Saw,
        Hit::new(Beat::ZERO, Beat::new(4.0)),
    ));
    for &tone in ARPEGGIO.iter() {
        phrase.add_note(Note::new(
            PitchEnvelope::constant(Tone::new(tone)),
            VolumeEnvelope::fade(Stereo::new(0.6, 0.1), Stereo::new(0.1, 0.6)),
            Waveform::Sine,
            Hit::new(Beat::ZERO, Beat::new(4.0)),
        ));
    }
    phrase
}

fn main() -> io::Result<()> {
    play::song_main(|| {
        let mut song = arpeggios(
            TimingSegment::constant(Beat::new(8.0), Tempo::from_bpm(120.0)),
            Waveform::Sine,
        );
        song.append(&arpeggios(
            TimingSegment::linear(Beat::new(16.0), Tempo::from_bpm(120.0), Tempo::from_bpm(220.0)),
            Waveform::Saw,
        ));
        song.append(&arpeggios(
            TimingSegment::linear(Beat::new(16.0), Tempo::from_bpm(220.0), Tempo::from_bpm(90.0)),
            Waveform::Sine,
        ));
        song.append(&coda());
        Ok(song)
    })
}
