/*
 * @file config.rs
 * @brief Runtime configuration for the Tahreez assistant
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

//! Runtime configuration loaded from `config.json` and the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::language::Language;

/// Path to the JSON configuration file that holds runtime defaults.
pub const CONFIG_PATH: &str = "config.json";

/// Environment variable naming a knowledge file to load instead of the built-in table.
pub const KNOWLEDGE_ENV: &str = "TAHREEZ_KNOWLEDGE";

/// Environment variable that turns speech output on or off.
pub const SPEECH_ENV: &str = "TAHREEZ_SPEECH";

/// Default English voice for the macOS `say` command.
const FALLBACK_EN_VOICE: &str = "Samantha";

/// Default Arabic voice for the macOS `say` command.
const FALLBACK_AR_VOICE: &str = "Majed";

/// Default window over which the microphone level is averaged.
const FALLBACK_LEVEL_WINDOW_MS: u64 = 250;

/// Voice names used for each answer language.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct VoiceConfig {
    #[serde(default = "fallback_en_voice")]
    pub en: String,
    #[serde(default = "fallback_ar_voice")]
    pub ar: String,
}

impl VoiceConfig {
    /// Voice name for `language`.
    pub fn voice_for(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Ar => &self.ar,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            en: fallback_en_voice(),
            ar: fallback_ar_voice(),
        }
    }
}

/// Strongly typed representation of `config.json`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Knowledge file to load; the built-in table is used when absent.
    #[serde(default)]
    pub knowledge_path: Option<PathBuf>,
    /// Whether answers are spoken aloud.
    #[serde(default = "fallback_speech_enabled")]
    pub speech_enabled: bool,
    /// Voice per answer language.
    #[serde(default)]
    pub voices: VoiceConfig,
    /// Window, in milliseconds, used for the live microphone level.
    #[serde(default = "fallback_level_window_ms")]
    pub media_level_window_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            knowledge_path: None,
            speech_enabled: fallback_speech_enabled(),
            voices: VoiceConfig::default(),
            media_level_window_ms: fallback_level_window_ms(),
        }
    }
}

impl AppConfig {
    /// Microphone level window as a [`Duration`].
    pub fn media_level_window(&self) -> Duration {
        Duration::from_millis(self.media_level_window_ms)
    }

    /// Applies `TAHREEZ_KNOWLEDGE` and `TAHREEZ_SPEECH` when they are set.
    ///
    /// # Details
    /// Unparseable speech values are logged and ignored so a typo in the
    /// environment never blocks startup.
    pub fn apply_env(mut self) -> Self {
        if let Ok(path) = env::var(KNOWLEDGE_ENV) {
            if !path.trim().is_empty() {
                self.knowledge_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(raw) = env::var(SPEECH_ENV) {
            match parse_switch(&raw) {
                Some(enabled) => self.speech_enabled = enabled,
                None => warn!(value = %raw, "Ignoring unrecognized {}", SPEECH_ENV),
            }
        }
        self
    }
}

/// Loads configuration from `path`, falling back to baked defaults.
///
/// # Details
/// A missing file is normal and yields defaults silently. A file that exists
/// but cannot be read or parsed is logged and also yields defaults.
///
/// # Arguments
/// * `path` - Location of the JSON configuration file.
///
/// # Returns
/// * `AppConfig` - The loaded or default configuration.
pub fn load_app_config(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Config parse error");
                AppConfig::default()
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Config load error");
            AppConfig::default()
        }
    }
}

/// Interprets common on/off spellings.
pub fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn fallback_en_voice() -> String {
    FALLBACK_EN_VOICE.to_string()
}

fn fallback_ar_voice() -> String {
    FALLBACK_AR_VOICE.to_string()
}

fn fallback_speech_enabled() -> bool {
    true
}

fn fallback_level_window_ms() -> u64 {
    FALLBACK_LEVEL_WINDOW_MS
}
