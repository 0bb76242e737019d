/*
 * @file lib.rs
 * @brief Tahreez assistant library root
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

//! Tahreez assistant - a bilingual scripted Q&A chat.
//!
//! This library answers free-text questions about Tahreez from a fixed table
//! of regular-expression patterns, in English or Arabic depending on the
//! script of the question:
//! - [`knowledge`] holds the validated, immutable topic table
//! - [`responder`] detects the language and picks the first matching answer
//! - [`assistant`] runs the terminal chat and routes answers to the
//!   transcript, speech and media collaborators
//!
//! # Example
//! ```
//! use tahreez::knowledge::KnowledgeBase;
//! use tahreez::responder::Responder;
//!
//! let responder = Responder::new(KnowledgeBase::builtin().expect("builtin table"));
//! assert_eq!(
//!     responder.answer("Who is the managing director?"),
//!     "Our Managing Director is Francesco Fidicaro."
//! );
//! ```

pub mod assistant;
pub mod avatar;
pub mod config;
pub mod knowledge;
pub mod language;
pub mod media;
pub mod responder;
pub mod speech;
pub mod transcript;
