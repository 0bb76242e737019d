//! Text-to-speech functionality module.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::avatar::{Avatar, TalkingGuard};
use crate::config::VoiceConfig;
use crate::language::Language;

/// Something that can vocalize an answer.
///
/// Implementations block until the utterance has been spoken.
pub trait Speaker: Send + Sync {
    /// Speaks `text` in `language`.
    ///
    /// # Errors
    /// Returns an error when speech is unavailable or synthesis fails.
    fn speak(&self, text: &str, language: Language) -> Result<()>;
}

/// Speaks using the macOS `say` command with one voice per language.
#[derive(Clone, Debug)]
pub struct SaySpeaker {
    voices: VoiceConfig,
}

impl SaySpeaker {
    pub fn new(voices: VoiceConfig) -> Self {
        Self { voices }
    }
}

impl Speaker for SaySpeaker {
    /// Speaks the given text using macOS `say` command.
    ///
    /// # Parameters
    /// * `text` - The utterance to synthesize.
    /// * `language` - Selects the configured voice.
    ///
    /// # Returns
    /// `Ok(())` when the `say` command completes successfully.
    ///
    /// # Errors
    /// Returns an error if the text is blank, or if the `say` command fails to
    /// spawn or exits unexpectedly.
    fn speak(&self, text: &str, language: Language) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot speak empty text");
        }
        run_say(text, self.voices.voice_for(language))
    }
}

/// Speaker used when speech output is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct MutedSpeaker;

impl Speaker for MutedSpeaker {
    fn speak(&self, _text: &str, _language: Language) -> Result<()> {
        Ok(())
    }
}

fn run_say(text: &str, voice: &str) -> Result<()> {
    if cfg!(test) {
        if *FORCE_ERROR.lock().unwrap() {
            anyhow::bail!("Forced failure for testing");
        }
        return Ok(());
    }

    let output = std::process::Command::new("say")
        .arg("-v")
        .arg(voice)
        .arg(text)
        .output()
        .context("Speech synthesis unavailable: failed to run `say`")?;
    if !output.status.success() {
        anyhow::bail!(
            "`say` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg_attr(not(test), allow(dead_code))]
static FORCE_ERROR: Mutex<bool> = Mutex::new(false);

/// Utterances allowed to wait behind the one being spoken.
const SPEECH_QUEUE_CAPACITY: usize = 4;

/// One queued piece of speech.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Utterance {
    text: String,
    language: Language,
}

/// Background speech worker fed through a channel.
///
/// # Details
/// Utterances are spoken one at a time, in submission order, on a blocking
/// thread, so the chat loop never waits on synthesis. The avatar is flagged
/// as talking while each utterance plays. Failures are logged and the next
/// utterance is still spoken. The queue is bounded: when speech falls behind,
/// new utterances are dropped rather than spoken long after they were shown.
pub struct SpeechQueue {
    sender: mpsc::Sender<Utterance>,
    worker: JoinHandle<()>,
}

impl SpeechQueue {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(speaker: Arc<dyn Speaker>, avatar: Avatar) -> Self {
        Self::with_capacity(speaker, avatar, SPEECH_QUEUE_CAPACITY)
    }

    /// Spawns the worker with room for `capacity` waiting utterances.
    pub fn with_capacity(speaker: Arc<dyn Speaker>, avatar: Avatar, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(receiver, speaker, avatar));
        Self { sender, worker }
    }

    /// Queues `text` for speech without waiting for it.
    ///
    /// # Returns
    /// * `true` when queued, `false` when dropped because the queue is full
    ///   or the worker has stopped.
    pub fn say(&self, text: &str, language: Language) -> bool {
        let utterance = Utterance {
            text: text.to_string(),
            language,
        };
        match self.sender.try_send(utterance) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Speech queue full; dropping utterance");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Speech worker stopped; dropping utterance");
                false
            }
        }
    }

    /// Closes the queue and waits for queued speech to finish.
    pub async fn finish(self) {
        drop(self.sender);
        if let Err(err) = self.worker.await {
            warn!(error = %err, "Speech worker ended abnormally");
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<Utterance>,
    speaker: Arc<dyn Speaker>,
    avatar: Avatar,
) {
    while let Some(utterance) = receiver.recv().await {
        let speaker = speaker.clone();
        let avatar = avatar.clone();
        let language = utterance.language;
        let spoken = tokio::task::spawn_blocking(move || {
            let _talking = TalkingGuard::new(&avatar);
            speaker.speak(&utterance.text, utterance.language)
        })
        .await;
        match spoken {
            Ok(Ok(())) => debug!(%language, "Utterance spoken"),
            Ok(Err(err)) => warn!(error = %err, "TTS error"),
            Err(err) => warn!(error = %err, "TTS task failed"),
        }
    }
}
