/*
 * @file avatar.rs
 * @brief Avatar talking and microphone-level indicators
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

//! Cosmetic avatar state driven by speech and microphone activity.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Number of cells in the rendered microphone meter.
const LEVEL_BARS: u8 = 5;

/// RMS (16-bit PCM scale) represented by one meter cell.
const LEVEL_PER_BAR: f32 = 600.0;

/// Shortest polling period for the indicator task.
const MIN_INDICATOR_PERIOD: Duration = Duration::from_millis(10);

/// Shared avatar indicators.
///
/// # Details
/// Clones share the same state, so the speech worker, the media stream and
/// the chat loop can all hold one. The talking flag is raised between the
/// start and end of each utterance; the level is the latest microphone RMS
/// and only shown while a microphone stream is listening.
#[derive(Clone, Debug, Default)]
pub struct Avatar {
    talking: Arc<AtomicBool>,
    listening: Arc<AtomicBool>,
    level: Arc<AtomicU32>,
}

impl Avatar {
    /// Creates an idle avatar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of vocalization.
    pub fn start_talking(&self) {
        if !self.talking.swap(true, Ordering::SeqCst) {
            debug!("Avatar talking");
        }
    }

    /// Marks the end of vocalization.
    pub fn stop_talking(&self) {
        if self.talking.swap(false, Ordering::SeqCst) {
            debug!("Avatar idle");
        }
    }

    /// Returns `true` while an utterance is being spoken.
    pub fn is_talking(&self) -> bool {
        self.talking.load(Ordering::SeqCst)
    }

    /// Publishes the latest microphone level.
    pub fn set_level(&self, rms: f32) {
        self.level.store(rms.max(0.0).to_bits(), Ordering::Relaxed);
    }

    /// Latest microphone level; `0.0` until a stream reports one.
    pub fn level(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }

    /// Records whether a microphone stream is feeding the level.
    pub fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::SeqCst);
    }

    /// Returns `true` while a microphone stream is live.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Snapshot of what the avatar currently shows.
    pub fn frame(&self) -> AvatarFrame {
        let level_bars = self
            .is_listening()
            .then(|| ((self.level() / LEVEL_PER_BAR) as u8).min(LEVEL_BARS));
        AvatarFrame {
            talking: self.is_talking(),
            level_bars,
        }
    }
}

/// Displayable avatar state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AvatarFrame {
    pub talking: bool,
    /// Filled meter cells, or `None` when the microphone is off.
    pub level_bars: Option<u8>,
}

impl AvatarFrame {
    /// One-line rendering, e.g. `Avatar: talking | mic [##---]`.
    pub fn render(&self) -> String {
        let mut line = String::from(if self.talking {
            "Avatar: talking"
        } else {
            "Avatar: idle"
        });
        if let Some(bars) = self.level_bars {
            let filled = "#".repeat(bars as usize);
            let empty = "-".repeat((LEVEL_BARS - bars) as usize);
            line.push_str(&format!(" | mic [{}{}]", filled, empty));
        }
        line
    }
}

/// Reports avatar frames only when they change.
pub struct AvatarIndicator {
    avatar: Avatar,
    last: AvatarFrame,
}

impl AvatarIndicator {
    /// Starts from the avatar's current frame, so nothing is reported until
    /// it changes.
    pub fn new(avatar: Avatar) -> Self {
        let last = avatar.frame();
        Self { avatar, last }
    }

    /// Returns the rendered frame when it differs from the last one reported.
    pub fn poll(&mut self) -> Option<String> {
        let frame = self.avatar.frame();
        if frame == self.last {
            return None;
        }
        self.last = frame;
        Some(frame.render())
    }
}

/// Spawns a task that writes each avatar change to `out` as a status line.
///
/// # Details
/// The avatar is sampled every `period`. Write failures are logged and the
/// task keeps running; abort the returned handle to stop it.
pub fn spawn_indicator<W>(avatar: Avatar, mut out: W, period: Duration) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        let mut indicator = AvatarIndicator::new(avatar);
        let mut ticker = tokio::time::interval(period.max(MIN_INDICATOR_PERIOD));
        loop {
            ticker.tick().await;
            if let Some(line) = indicator.poll() {
                let written = out
                    .write_all(format!("* {}\n", line).as_bytes())
                    .and_then(|_| out.flush());
                if let Err(err) = written {
                    warn!(error = %err, "Avatar indicator write error");
                }
            }
        }
    })
}

/// Raises the talking flag for as long as the guard lives.
pub struct TalkingGuard {
    avatar: Avatar,
}

impl TalkingGuard {
    /// Starts talking on `avatar`; the flag drops again with the guard.
    pub fn new(avatar: &Avatar) -> Self {
        avatar.start_talking();
        Self {
            avatar: avatar.clone(),
        }
    }
}

impl Drop for TalkingGuard {
    fn drop(&mut self) {
        self.avatar.stop_talking();
    }
}
