/*
 * @file assistant.rs
 * @brief Implementation of the Tahreez chat assistant runtime
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

//! Chat assistant orchestration module.

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::avatar::{spawn_indicator, Avatar};
use crate::config::AppConfig;
use crate::knowledge::KnowledgeBase;
use crate::media::{MediaCapture, MicrophoneCapture};
use crate::responder::Responder;
use crate::speech::{MutedSpeaker, SaySpeaker, Speaker, SpeechQueue};
use crate::transcript::{ConsoleTranscript, SenderRole, Transcript};

/// Shown once when the chat starts.
const GREETING: &str = "Ask about Tahreez in English or Arabic. Type /help for commands.";

/// Listed by `/help`.
const HELP_TEXT: &str = "Commands: /media (or /start) starts the microphone for the avatar, \
    /quit (or /exit, quit, exit, bye, goodbye) ends the chat, /help shows this list.";

/// Notice after the microphone opens.
const MEDIA_STARTED: &str =
    "Microphone started. (Audio is only used for the avatar level and is never recorded.)";

/// Notice when the microphone is already open.
const MEDIA_ALREADY_LIVE: &str = "Microphone is already running.";

/// Notice when the microphone cannot be opened.
const MEDIA_DENIED: &str = "Unable to access the microphone. Please allow permissions.";

/// Runs the interactive chat on standard input until the user quits.
///
/// The loop reads one line at a time, answers it from the knowledge base,
/// prints both sides of the exchange and queues the answer for speech. Avatar
/// changes (talking, microphone level) are printed as status lines. Queued
/// speech is awaited before returning, even when reading input fails.
///
/// # Arguments
/// * `config` - Effective runtime configuration.
///
/// # Returns
/// `Ok(())` when the user quits or input ends.
///
/// # Errors
/// Returns an error if the knowledge base is invalid or standard input fails.
pub async fn run_chat_assistant(config: AppConfig) -> Result<()> {
    let responder = Responder::new(load_knowledge(&config)?);
    let avatar = Avatar::new();
    let speech = SpeechQueue::spawn(build_speaker(&config), avatar.clone());
    let indicator = spawn_indicator(avatar.clone(), io::stdout(), config.media_level_window());
    let media = MicrophoneCapture::new(avatar, config.media_level_window());
    let mut runtime = ChatRuntime::new(responder, ConsoleTranscript::stdout(), speech, media);
    runtime.greet();
    let outcome = runtime
        .run_loop(BufReader::new(tokio::io::stdin()))
        .await;
    runtime.shutdown().await;
    indicator.abort();
    outcome
}

/// Answers a single query on standard output, speaking it when enabled.
///
/// # Errors
/// Returns an error if the knowledge base is invalid.
pub async fn answer_once(config: AppConfig, query: &str) -> Result<()> {
    let responder = Responder::new(load_knowledge(&config)?);
    let reply = responder.reply(query.trim());
    println!("{}", reply.text);
    let speech = SpeechQueue::spawn(build_speaker(&config), Avatar::new());
    speech.say(&reply.text, reply.language);
    speech.finish().await;
    Ok(())
}

/// Builds the knowledge base named by `config`, or the built-in one.
///
/// # Details
/// An explicitly configured knowledge file must be valid; there is no silent
/// fallback to the built-in table.
///
/// # Errors
/// Returns the validation or IO error with the offending path attached.
pub fn load_knowledge(config: &AppConfig) -> Result<KnowledgeBase> {
    match &config.knowledge_path {
        Some(path) => KnowledgeBase::load(path)
            .with_context(|| format!("Invalid knowledge file {}", path.display())),
        None => {
            info!("Using built-in knowledge table");
            KnowledgeBase::builtin().context("Built-in knowledge table is invalid")
        }
    }
}

fn build_speaker(config: &AppConfig) -> Arc<dyn Speaker> {
    if config.speech_enabled {
        Arc::new(SaySpeaker::new(config.voices.clone()))
    } else {
        info!("Speech output disabled");
        Arc::new(MutedSpeaker)
    }
}

/// Slash commands and exit words understood by the chat loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChatCommand {
    Quit,
    Media,
    Help,
}

impl ChatCommand {
    /// Recognizes a command when it is the whole (trimmed) line.
    ///
    /// # Details
    /// Exit words only count on their own, so a question such as
    /// "how do I exit the building" is still answered.
    fn parse(input: &str) -> Option<ChatCommand> {
        match input.trim().to_lowercase().as_str() {
            "/quit" | "/exit" | "quit" | "exit" | "bye" | "goodbye" => Some(ChatCommand::Quit),
            "/media" | "/start" => Some(ChatCommand::Media),
            "/help" => Some(ChatCommand::Help),
            _ => None,
        }
    }
}

/// Runtime container that owns the responder and its collaborators.
///
/// # Details
/// The responder only ever sees plain strings; display, speech and media
/// are injected here so each can be swapped independently.
pub struct ChatRuntime<T: Transcript, M: MediaCapture> {
    responder: Responder,
    transcript: T,
    speech: SpeechQueue,
    media: M,
}

impl<T: Transcript, M: MediaCapture> ChatRuntime<T, M> {
    pub fn new(responder: Responder, transcript: T, speech: SpeechQueue, media: M) -> Self {
        Self {
            responder,
            transcript,
            speech,
            media,
        }
    }

    /// Prints the opening notice.
    pub fn greet(&mut self) {
        self.transcript.notice(GREETING);
    }

    /// Reads lines from `reader` until a quit command or end of input.
    ///
    /// # Details
    /// Lines are decoded leniently: invalid UTF-8 is replaced rather than
    /// ending the chat.
    ///
    /// # Errors
    /// Returns an error only if reading from `reader` fails.
    pub async fn run_loop<R: AsyncBufRead + Unpin>(&mut self, mut reader: R) -> Result<()> {
        let mut raw = Vec::new();
        loop {
            raw.clear();
            let read = reader
                .read_until(b'\n', &mut raw)
                .await
                .context("Failed to read input")?;
            if read == 0 {
                info!("Input closed");
                return Ok(());
            }
            let line = String::from_utf8_lossy(&raw);
            if let Cow::Owned(_) = line {
                warn!("Input line was not valid UTF-8; invalid bytes replaced");
            }
            if !self.handle_line(&line) {
                info!("Chat ended by user");
                return Ok(());
            }
        }
    }

    /// Handles one raw input line.
    ///
    /// # Returns
    /// * `true` to keep reading, `false` to end the chat.
    pub fn handle_line(&mut self, raw: &str) -> bool {
        let input = raw.trim();
        if input.is_empty() {
            return true;
        }
        match ChatCommand::parse(input) {
            Some(ChatCommand::Quit) => return false,
            Some(ChatCommand::Media) => self.start_media(),
            Some(ChatCommand::Help) => self.transcript.notice(HELP_TEXT),
            None => self.handle_query(input),
        }
        true
    }

    /// Answers a query, displays both sides and queues the answer for speech.
    fn handle_query(&mut self, query: &str) {
        self.transcript.append(SenderRole::User, query);
        let reply = self.responder.reply(query);
        debug!(
            language = %reply.language,
            record = ?reply.record,
            "Answered query"
        );
        self.transcript.append(SenderRole::Bot, &reply.text);
        self.speech.say(&reply.text, reply.language);
    }

    /// Starts the media collaborator, reporting the outcome as a notice.
    fn start_media(&mut self) {
        if self.media.is_live() {
            self.transcript.notice(MEDIA_ALREADY_LIVE);
            return;
        }
        match self.media.start() {
            Ok(()) => self.transcript.notice(MEDIA_STARTED),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Media access error");
                self.transcript.notice(MEDIA_DENIED);
            }
        }
    }

    /// Waits for queued speech and hands back the transcript.
    pub async fn shutdown(self) -> T {
        self.speech.finish().await;
        self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{FALLBACK_AR, FALLBACK_EN};
    use crate::language::Language;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const MD_ANSWER: &str = "Our Managing Director is Francesco Fidicaro.";

    #[derive(Default)]
    struct RecordingTranscript {
        lines: Vec<(Option<SenderRole>, String)>,
    }

    impl Transcript for RecordingTranscript {
        fn append(&mut self, role: SenderRole, text: &str) {
            self.lines.push((Some(role), text.to_string()));
        }

        fn notice(&mut self, text: &str) {
            self.lines.push((None, text.to_string()));
        }
    }

    #[derive(Default)]
    struct FakeMedia {
        deny: bool,
        live: bool,
        starts: usize,
    }

    impl MediaCapture for FakeMedia {
        fn start(&mut self) -> Result<()> {
            self.starts += 1;
            if self.deny {
                anyhow::bail!("permission denied");
            }
            self.live = true;
            Ok(())
        }

        fn is_live(&self) -> bool {
            self.live
        }
    }

    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<(String, Language)>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str, language: Language) -> Result<()> {
            self.spoken.lock().unwrap().push((text.to_string(), language));
            Ok(())
        }
    }

    /// Speaker that behaves as if speech synthesis were missing.
    struct UnavailableSpeaker;

    impl Speaker for UnavailableSpeaker {
        fn speak(&self, _text: &str, _language: Language) -> Result<()> {
            anyhow::bail!("speech synthesis not supported")
        }
    }

    fn runtime_with(
        speaker: Arc<dyn Speaker>,
        media: FakeMedia,
    ) -> ChatRuntime<RecordingTranscript, FakeMedia> {
        let responder = Responder::new(KnowledgeBase::builtin().expect("builtin table"));
        let speech = SpeechQueue::spawn(speaker, Avatar::new());
        ChatRuntime::new(responder, RecordingTranscript::default(), speech, media)
    }

    #[test]
    fn commands_require_the_whole_line() {
        assert_eq!(ChatCommand::parse("Quit"), Some(ChatCommand::Quit));
        assert_eq!(ChatCommand::parse(" /MEDIA "), Some(ChatCommand::Media));
        assert_eq!(ChatCommand::parse("/help"), Some(ChatCommand::Help));
        assert_eq!(ChatCommand::parse("how do I exit the building"), None);
    }

    #[test]
    fn explicit_knowledge_file_must_be_valid() {
        let config = AppConfig {
            knowledge_path: Some(PathBuf::from("missing/knowledge.json")),
            ..AppConfig::default()
        };
        let err = load_knowledge(&config).unwrap_err();
        assert!(format!("{err:#}").contains("missing/knowledge.json"));
    }

    #[test]
    fn builtin_knowledge_is_default() {
        let knowledge = load_knowledge(&AppConfig::default()).expect("builtin");
        assert_eq!(knowledge.len(), 6);
    }

    #[tokio::test]
    async fn query_is_displayed_then_answered_and_spoken() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let mut runtime = runtime_with(speaker.clone(), FakeMedia::default());
        assert!(runtime.handle_line("  Who is the managing director?  "));
        let transcript = runtime.shutdown().await;

        assert_eq!(
            transcript.lines,
            vec![
                (
                    Some(SenderRole::User),
                    "Who is the managing director?".to_string()
                ),
                (Some(SenderRole::Bot), MD_ANSWER.to_string()),
            ]
        );
        assert_eq!(
            *speaker.spoken.lock().unwrap(),
            vec![(MD_ANSWER.to_string(), Language::En)]
        );
    }

    #[tokio::test]
    async fn arabic_query_is_spoken_in_arabic() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let mut runtime = runtime_with(speaker.clone(), FakeMedia::default());
        runtime.handle_line("موز");
        runtime.shutdown().await;
        assert_eq!(
            *speaker.spoken.lock().unwrap(),
            vec![(FALLBACK_AR.to_string(), Language::Ar)]
        );
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let mut runtime = runtime_with(speaker.clone(), FakeMedia::default());
        assert!(runtime.handle_line("   "));
        assert!(runtime.handle_line(""));
        let transcript = runtime.shutdown().await;
        assert!(transcript.lines.is_empty());
        assert!(speaker.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_speech_does_not_block_answers() {
        let mut runtime = runtime_with(Arc::new(UnavailableSpeaker), FakeMedia::default());
        runtime.handle_line("banana");
        runtime.handle_line("what is your mission");
        let transcript = runtime.shutdown().await;
        assert_eq!(transcript.lines.len(), 4);
        assert_eq!(transcript.lines[1].1, FALLBACK_EN);
        assert!(transcript.lines[3].1.starts_with("Our mission"));
    }

    #[tokio::test]
    async fn denied_media_is_a_notice_and_chat_continues() {
        let media = FakeMedia {
            deny: true,
            ..FakeMedia::default()
        };
        let mut runtime = runtime_with(Arc::new(MutedSpeaker), media);
        assert!(runtime.handle_line("/media"));
        assert!(runtime.handle_line("who is the managing director"));
        let transcript = runtime.shutdown().await;
        assert_eq!(transcript.lines[0], (None, MEDIA_DENIED.to_string()));
        assert_eq!(
            transcript.lines[2],
            (Some(SenderRole::Bot), MD_ANSWER.to_string())
        );
    }

    #[tokio::test]
    async fn media_starts_once() {
        let mut runtime = runtime_with(Arc::new(MutedSpeaker), FakeMedia::default());
        runtime.handle_line("/media");
        runtime.handle_line("/media");
        assert_eq!(runtime.media.starts, 1);
        let transcript = runtime.shutdown().await;
        assert_eq!(
            transcript.lines,
            vec![
                (None, MEDIA_STARTED.to_string()),
                (None, MEDIA_ALREADY_LIVE.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn loop_stops_at_quit_and_skips_the_rest() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let mut runtime = runtime_with(speaker.clone(), FakeMedia::default());
        let input: &[u8] = b"what is tahreez\n\nquit\nwho is the managing director\n";
        runtime.run_loop(input).await.expect("loop");
        let transcript = runtime.shutdown().await;
        assert_eq!(transcript.lines.len(), 2);
        assert_eq!(speaker.spoken.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_end_the_chat() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let mut runtime = runtime_with(speaker.clone(), FakeMedia::default());
        let input: &[u8] = b"caf\xe9\nwho is the managing director\n";
        runtime.run_loop(input).await.expect("loop");
        let transcript = runtime.shutdown().await;

        assert_eq!(transcript.lines.len(), 4);
        assert_eq!(
            transcript.lines[0],
            (Some(SenderRole::User), "caf\u{FFFD}".to_string())
        );
        assert_eq!(
            transcript.lines[1],
            (Some(SenderRole::Bot), FALLBACK_EN.to_string())
        );
        assert_eq!(
            transcript.lines[3],
            (Some(SenderRole::Bot), MD_ANSWER.to_string())
        );
        assert_eq!(speaker.spoken.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn crlf_line_endings_are_trimmed() {
        let mut runtime = runtime_with(Arc::new(MutedSpeaker), FakeMedia::default());
        let input: &[u8] = b"who is the managing director\r\n";
        runtime.run_loop(input).await.expect("loop");
        let transcript = runtime.shutdown().await;
        assert_eq!(
            transcript.lines[0],
            (
                Some(SenderRole::User),
                "who is the managing director".to_string()
            )
        );
    }

    #[test]
    fn help_lists_every_command_alias() {
        for alias in ["/media", "/start", "/quit", "/exit", "quit", "exit", "bye", "goodbye", "/help"] {
            assert!(HELP_TEXT.contains(alias), "help is missing {alias}");
            assert!(ChatCommand::parse(alias).is_some());
        }
    }

    #[tokio::test]
    async fn loop_ends_with_input() {
        let mut runtime = runtime_with(Arc::new(MutedSpeaker), FakeMedia::default());
        let input: &[u8] = b"/help\nmission";
        runtime.run_loop(input).await.expect("loop");
        let transcript = runtime.shutdown().await;
        assert_eq!(transcript.lines[0], (None, HELP_TEXT.to_string()));
        assert_eq!(transcript.lines.len(), 3);
    }
}
