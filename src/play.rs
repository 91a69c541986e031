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

//! Command line driver playing a song through sox.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use structopt::StructOpt;

use crate::notation::Song;
use crate::output::{SoxSink, SoxTarget};
use crate::player::{Player, PlayerConfig};
use crate::units::Time;
use crate::util;
use crate::wave::AudioBuffer;

#[derive(Debug, StructOpt)]
#[structopt(name = "syn-roll", about = "Playing scores with changing tempo")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Output gain in dB.
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    gain: f64,

    /// Sample rate in Hz.
    #[structopt(long, default_value = "44100")]
    rate: u32,

    /// Number of samples rendered at once.
    #[structopt(long, default_value = "441")]
    buffer: usize,

    /// Length of the fade at both ends of every note, in milliseconds.
    #[structopt(long, default_value = "20")]
    falloff: f64,

    /// Output file (any sox-supported format). Music is played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Dump the description of the song before playing it.
    #[structopt(long)]
    #[allow(clippy::option_option)]
    dump_description: Option<Option<PathBuf>>,
}

/// How a song is rendered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaySettings {
    pub sample_rate: u32,
    /// Samples per buffer handed to the sink.
    pub buffer_size: usize,
    /// Linear factor applied to every output sample.
    pub gain: f64,
    pub player: PlayerConfig,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            // 10 ms at 44100 Hz
            buffer_size: 441,
            gain: 1.0,
            player: PlayerConfig::default(),
        }
    }
}

/// Entry point for programs composing a song: parse the command line, set up
/// logging, compose the song and play it.
pub fn song_main<F: FnOnce() -> io::Result<Song>>(compose: F) -> io::Result<()> {
    let opt: Opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    let dump_out = opt
        .dump_description
        .map(|path| path.unwrap_or_else(|| "/dev/stdout".into()));
    let song = compose()?;
    if let Some(dump_out_path) = dump_out {
        use std::io::Write;
        let mut f = std::fs::File::create(dump_out_path)?;
        writeln!(f, "{:#?}", song)?;
    }

    let settings = PlaySettings {
        sample_rate: opt.rate,
        buffer_size: opt.buffer.max(1),
        gain: util::from_decibels(opt.gain),
        player: PlayerConfig {
            falloff: Time::millis(opt.falloff.max(0.0)),
        },
    };
    play(&song, &settings, opt.output.as_deref())
}

/// Play a song on the default speakers, or write it to `outfile`.
pub fn play(song: &Song, settings: &PlaySettings, outfile: Option<&Path>) -> io::Result<()> {
    let mut player = Player::with_config(song, settings.player)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let dt = Time::new(1.0 / f64::from(settings.sample_rate));

    info!(
        "playing {:.2} beats in {:.2} at {} Hz",
        song.beat_length().value(),
        player.length(),
        settings.sample_rate
    );

    let target = match outfile {
        None => SoxTarget::Play,
        Some(path) => SoxTarget::File(path),
    };
    let sink = SoxSink::new(settings.sample_rate, target)?;
    let mut buffer = AudioBuffer::new(settings.buffer_size);

    let samples_total = stream(&mut player, dt, settings.gain, &mut buffer, sink)?;

    info!(
        "rendered {} samples ({:.2} seconds)",
        samples_total,
        samples_total as f64 / f64::from(settings.sample_rate)
    );
    Ok(())
}

/// Render the rest of the song into `sink` and return the number of samples written.
///
/// The sink is finished on every path, so the sox process is always waited for.
fn stream(
    player: &mut Player,
    dt: Time,
    gain: f64,
    buffer: &mut AudioBuffer,
    mut sink: SoxSink,
) -> io::Result<usize> {
    let mut samples_total = 0;
    loop {
        let done = render_buffer(player, dt, gain, buffer);
        if let Err(err) = sink.write(buffer) {
            error!("Failed to write audio to sox stream: {}", err);
            if let Err(finish_err) = sink.finish() {
                warn!("sox did not shut down cleanly: {}", finish_err);
            }
            return Err(err);
        }
        samples_total += buffer.len();
        if done {
            break;
        }
    }
    sink.finish()?;
    Ok(samples_total)
}

/// Fill `buffer` with one sample per tick of length `dt`, scaled by `gain`.
///
/// Returns `true` once the song is over. The part of the buffer after the end of
/// the song is silent.
pub fn render_buffer(player: &mut Player, dt: Time, gain: f64, buffer: &mut AudioBuffer) -> bool {
    buffer.fill_zero();
    for sample in buffer.samples_mut().iter_mut() {
        match player.advance(dt) {
            Ok(()) => *sample = player.sound() * gain,
            Err(err) => {
                debug!("playback stopped: {}", err);
                return true;
            }
        }
    }
    player.cursor().is_exhausted()
}
