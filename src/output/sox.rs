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

//! Getting sound out of the process using a sox subprocess.
//!
//! The samples are streamed as interleaved little-endian `f64` stereo frames
//! into the standard input of `play` (speakers) or `sox` (files). Sox takes
//! care of clipping and converting to the output format.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use log::{debug, warn};

use crate::wave::AudioBuffer;

/// Where sox should send the audio.
#[derive(Debug, Copy, Clone)]
pub enum SoxTarget<'a> {
    /// The default audio device.
    Play,
    /// Any file format supported by sox, derived from the extension.
    File(&'a Path),
}

pub struct SoxSink {
    child: Child,
    audio_stream: ChildStdin,
    bytes: Vec<u8>,
}

impl SoxSink {
    pub fn new(sample_rate: u32, target: SoxTarget) -> io::Result<Self> {
        let sample_rate_str = format!("{}", sample_rate);
        let input_args = &[
            "-R", // make the output reproducible
            "--channels",
            "2",
            "--rate",
            &sample_rate_str,
            "--type",
            "f64",
            "/dev/stdin",
        ];

        let command = match target {
            SoxTarget::Play => {
                let mut command = Command::new("play");
                command
                    .args(input_args)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
                command
            }
            SoxTarget::File(outfile) => {
                let mut command = Command::new("sox");
                command.args(input_args).arg(outfile);
                command
            }
        };
        let sink = Self::spawn(command)?;
        debug!("started sox for {:?} at {} Hz", target, sample_rate);
        Ok(sink)
    }

    /// Start `command` with its standard input connected to the sink.
    pub(crate) fn spawn(mut command: Command) -> io::Result<Self> {
        let mut child = command.stdin(Stdio::piped()).spawn()?;
        let audio_stream = child.stdin.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "sox has no standard input")
        })?;

        Ok(Self {
            child,
            audio_stream,
            bytes: Vec::new(),
        })
    }

    /// Process id of the sox subprocess.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Send all samples of `buffer` to sox.
    pub fn write(&mut self, buffer: &AudioBuffer) -> io::Result<()> {
        if self.bytes.len() != buffer.byte_len() {
            self.bytes.resize(buffer.byte_len(), 0);
        }
        let copied = buffer.copy_bytes_to(&mut self.bytes);
        debug_assert_eq!(copied, buffer.len());
        self.audio_stream.write_all(&self.bytes)
    }

    /// Close the stream and wait for sox to finish playing or writing.
    pub fn finish(self) -> io::Result<()> {
        let SoxSink {
            mut child,
            mut audio_stream,
            ..
        } = self;
        let flushed = audio_stream.flush();
        // sox exits once its input is closed
        drop(audio_stream);
        let status = child.wait()?;
        if !status.success() {
            warn!("sox exited with {}", status);
        }
        flushed
    }
}
