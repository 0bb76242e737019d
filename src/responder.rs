/*
 * @file responder.rs
 * @brief Pattern-matching responder with language selection
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

//! Maps a raw query to a localized answer from the knowledge base.

use std::sync::Arc;

use crate::knowledge::KnowledgeBase;
use crate::language::Language;

/// Outcome of answering one query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    /// Language detected from the query; the answer is in this language.
    pub language: Language,
    /// Answer text, never empty.
    pub text: String,
    /// Index of the matching record, or `None` when the fallback was used.
    pub record: Option<usize>,
}

impl Reply {
    /// Returns `true` when the reply is the fallback answer.
    pub fn is_fallback(&self) -> bool {
        self.record.is_none()
    }
}

/// Stateless responder over a shared, immutable [`KnowledgeBase`].
///
/// # Details
/// Cloning is cheap and every method takes `&self`, so one responder can be
/// shared across tasks and threads without locking.
#[derive(Clone, Debug)]
pub struct Responder {
    knowledge: Arc<KnowledgeBase>,
}

impl Responder {
    /// Creates a responder over `knowledge`.
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self {
            knowledge: Arc::new(knowledge),
        }
    }

    /// Answers `query` in the language it was written in.
    ///
    /// # Details
    /// Total over all strings: an empty or unrecognized query yields the
    /// fallback for its detected language.
    ///
    /// # Arguments
    /// * `query` - Raw user input.
    ///
    /// # Returns
    /// * `String` - Non-empty localized answer.
    pub fn answer(&self, query: &str) -> String {
        self.reply(query).text
    }

    /// Answers `query` and reports the detected language and matched record.
    ///
    /// # Details
    /// The language is detected on the raw query. Matching runs on the
    /// lowercased query, record by record and pattern by pattern in table
    /// order; the first pattern that matches anywhere in the string wins.
    ///
    /// # Arguments
    /// * `query` - Raw user input.
    ///
    /// # Returns
    /// * `Reply` - Language, answer text and matched record index.
    pub fn reply(&self, query: &str) -> Reply {
        let language = Language::detect(query);
        let normalized = query.to_lowercase();
        let matched = self
            .knowledge
            .records()
            .iter()
            .position(|record| record.matches(&normalized));
        let text = match matched {
            Some(index) => self.knowledge.records()[index].answer(language),
            None => self.knowledge.fallback(language),
        };
        Reply {
            language,
            text: text.to_string(),
            record: matched,
        }
    }
}
