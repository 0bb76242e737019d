/*
 * @file media.rs
 * @brief Microphone capture helpers for the avatar level
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

//! Microphone capture for the avatar level effect.
//!
//! This module opens the default input device with CPAL on explicit user
//! request and turns the live signal into an RMS level on the [`Avatar`].
//! Captured audio is never stored or transcribed.

use std::time::Duration;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig, StreamError};
use tracing::{info, warn};

use crate::avatar::Avatar;

/// Media collaborator started by an explicit user action.
pub trait MediaCapture {
    /// Requests device access and starts streaming.
    ///
    /// # Errors
    /// Returns an error when no device is available or access is denied.
    fn start(&mut self) -> Result<()>;

    /// Returns `true` while a stream is running.
    fn is_live(&self) -> bool;
}

/// Live microphone stream feeding the avatar level.
pub struct MicrophoneCapture {
    avatar: Avatar,
    window: Duration,
    stream: Option<Stream>,
}

impl MicrophoneCapture {
    /// Creates an idle capture that will publish levels averaged over `window`.
    pub fn new(avatar: Avatar, window: Duration) -> Self {
        Self {
            avatar,
            window,
            stream: None,
        }
    }
}

impl MediaCapture for MicrophoneCapture {
    /// Opens the default input device and starts metering.
    ///
    /// # Details
    /// Calling this again while a stream is live is a no-op.
    ///
    /// # Returns
    /// `Ok(())` once the stream is playing.
    ///
    /// # Errors
    /// Returns an error if:
    /// - No input device is available
    /// - The device refuses its default configuration
    /// - The stream cannot be built or started
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let device = default_input_device()?;
        let config = input_config(&device)?;
        let meter = LevelMeter::new(self.avatar.clone(), window_len(&config, self.window));
        let stream = build_input_stream(&device, &config, meter)?;
        stream.play().context("Failed to start microphone stream")?;
        info!(
            channels = config.channels,
            sample_rate = config.sample_rate.0,
            "Microphone stream started"
        );
        self.stream = Some(stream);
        self.avatar.set_listening(true);
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.stream.is_some()
    }
}

/// Accumulates PCM samples and publishes one RMS value per window.
struct LevelMeter {
    avatar: Avatar,
    buffer: Vec<i16>,
    window_len: usize,
}

impl LevelMeter {
    fn new(avatar: Avatar, window_len: usize) -> Self {
        let window_len = window_len.max(1);
        Self {
            avatar,
            buffer: Vec::with_capacity(window_len),
            window_len,
        }
    }

    /// Converts floating-point frames into 16-bit PCM and meters them.
    ///
    /// # Parameters
    /// * `data` - The latest interleaved floating-point frames from CPAL.
    fn push(&mut self, data: &[f32]) {
        for &sample in data {
            self.buffer.push(to_pcm(sample));
            if self.buffer.len() >= self.window_len {
                self.avatar.set_level(rms(&self.buffer));
                self.buffer.clear();
            }
        }
    }
}

/// Root mean square of PCM samples; `0.0` for an empty slice.
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy = samples
        .iter()
        .map(|sample| (*sample as f32).powi(2))
        .sum::<f32>()
        / samples.len() as f32;
    energy.sqrt()
}

fn to_pcm(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Number of interleaved samples covering `window` at the stream's rate.
fn window_len(config: &StreamConfig, window: Duration) -> usize {
    let per_second = config.sample_rate.0 as f64 * config.channels as f64;
    (per_second * window.as_secs_f64()).round() as usize
}

/// Locates the system default input device.
///
/// # Errors
/// Returns an error when the user has no available microphone.
fn default_input_device() -> Result<Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| anyhow::anyhow!("No input device"))
}

/// Asks the device for its preferred stream configuration.
fn input_config(device: &Device) -> Result<StreamConfig> {
    let supported = device
        .default_input_config()
        .context("Microphone refused its default configuration")?;
    Ok(StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    })
}

/// Builds the CPAL input stream that drives `meter`.
///
/// # Errors
/// Returns any stream-construction issues wrapped in [`anyhow::Error`].
fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    mut meter: LevelMeter,
) -> Result<Stream> {
    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &_| meter.push(data),
            log_stream_error,
            None,
        )
        .map_err(|err| anyhow::anyhow!(err))
}

/// Logs recoverable stream errors emitted by CPAL.
fn log_stream_error(error: StreamError) {
    warn!(error = %error, "Audio stream error");
}
