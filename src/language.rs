/*
 * @file language.rs
 * @brief Language codes and Arabic-script detection
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

//! Supported answer languages and script-based language detection.

use std::fmt;
use std::ops::RangeInclusive;

/// Unicode block treated as Arabic script (U+0600 through U+06FF).
const ARABIC_BLOCK: RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

/// A locale the assistant can answer in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    /// English (`en`).
    En,
    /// Arabic (`ar`).
    Ar,
}

impl Language {
    /// Every supported language, in table order.
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    /// Detects the language of a query.
    ///
    /// # Details
    /// A single character from the Arabic block anywhere in the text selects
    /// Arabic, even when the rest of the text is Latin script. Everything
    /// else, including the empty string, is English.
    ///
    /// # Arguments
    /// * `text` - Raw user query.
    ///
    /// # Returns
    /// * `Language` - `Ar` when any Arabic character is present, `En` otherwise.
    pub fn detect(text: &str) -> Language {
        if contains_arabic(text) {
            Language::Ar
        } else {
            Language::En
        }
    }

    /// Parses a two-letter language code as used in knowledge files.
    pub fn from_code(code: &str) -> Option<Language> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    /// Two-letter code for this language.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Returns `true` when `text` holds at least one Arabic-block character.
pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(|c| ARABIC_BLOCK.contains(&c))
}
