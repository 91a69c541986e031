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

//! Per-note state machines evaluated on every tick.
//!
//! Each family is a closed set of variants taken from the note's envelopes.
//! The generators only look at the bounds of their note and the current
//! position of the song, so they never need access to the player.

pub mod oscillator;
pub mod pitch;
pub mod volume;

pub use oscillator::{Oscillator, Phase, Waveform};
pub use pitch::PitchGenerator;
pub use volume::{decrackle, VolumeGenerator, FALLOFF};
