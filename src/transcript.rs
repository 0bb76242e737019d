/*
 * @file transcript.rs
 * @brief Chat transcript display collaborator
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Chat transcript display.

use std::fmt;
use std::io::{self, Write};

use tracing::warn;

/// Who produced a transcript line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenderRole {
    User,
    Bot,
}

impl SenderRole {
    /// Label shown in front of the line.
    pub fn label(self) -> &'static str {
        match self {
            SenderRole::User => "You",
            SenderRole::Bot => "Tahreez",
        }
    }
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display collaborator that receives transcript lines in call order.
pub trait Transcript {
    /// Appends one chat line.
    fn append(&mut self, role: SenderRole, text: &str);

    /// Shows a non-fatal notice outside the chat flow.
    fn notice(&mut self, text: &str);
}

/// Writes the transcript to a terminal or any other [`Write`] sink.
///
/// # Details
/// Write failures are logged and swallowed; losing a display line must never
/// interrupt answering.
pub struct ConsoleTranscript<W: Write> {
    out: W,
}

impl ConsoleTranscript<io::Stdout> {
    /// Transcript on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleTranscript<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the transcript and returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) {
        let written = self
            .out
            .write_fmt(line)
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush());
        if let Err(err) = written {
            warn!(error = %err, "Transcript write error");
        }
    }
}

impl<W: Write> Transcript for ConsoleTranscript<W> {
    fn append(&mut self, role: SenderRole, text: &str) {
        self.write_line(format_args!("{}: {}", role, text));
    }

    fn notice(&mut self, text: &str) {
        self.write_line(format_args!("* {}", text));
    }
}
