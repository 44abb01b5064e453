use crate::error::PetError;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceParams {
    pub pitch: f32,
    pub rate: f32,
}

/// Bloop repeats everything in a squeaky alien voice.
pub const ALIEN_VOICE: VoiceParams = VoiceParams {
    pitch: 2.0,
    rate: 1.2,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Speech {
    pub text: String,
    pub params: VoiceParams,
}

/// One listening session. Yields at most one recognized utterance; a closed channel without
/// one means the recognizer gave up.
pub type Utterance = Receiver<String>;

pub trait VoiceBackend {
    fn is_available(&self) -> bool;
    fn begin_listening(&mut self) -> Result<Utterance, PetError>;
    fn speak(&mut self, text: &str, params: VoiceParams);
}

/// For platforms with no recognizer at all.
#[derive(Debug, Default)]
pub struct UnavailableVoice;

impl VoiceBackend for UnavailableVoice {
    fn is_available(&self) -> bool {
        false
    }

    fn begin_listening(&mut self) -> Result<Utterance, PetError> {
        Err(PetError::VoiceUnsupported)
    }

    fn speak(&mut self, _text: &str, _params: VoiceParams) {}
}

/// Terminal stand-in for a speech recognizer: whatever the user types into the talk prompt
/// is the recognized utterance. Playback is a log line; the session keeps the text for the
/// speech bubble.
pub struct KeyboardVoice {
    open: Arc<Mutex<Option<Sender<String>>>>,
}

/// The typing end of a [`KeyboardVoice`].
#[derive(Clone)]
pub struct Microphone {
    open: Arc<Mutex<Option<Sender<String>>>>,
}

impl KeyboardVoice {
    pub fn new() -> (Self, Microphone) {
        let open = Arc::new(Mutex::new(None));
        (
            Self {
                open: Arc::clone(&open),
            },
            Microphone { open },
        )
    }
}

impl Microphone {
    /// Delivers `text` to the pending listen request. Returns false if nobody is listening.
    pub fn submit(&self, text: &str) -> bool {
        let Ok(mut slot) = self.open.lock() else {
            return false;
        };
        match slot.take() {
            Some(tx) => tx.send(text.to_string()).is_ok(),
            None => false,
        }
    }

    /// Gives up on the pending request without an utterance.
    pub fn hang_up(&self) {
        if let Ok(mut slot) = self.open.lock() {
            slot.take();
        }
    }
}

impl VoiceBackend for KeyboardVoice {
    fn is_available(&self) -> bool {
        true
    }

    fn begin_listening(&mut self) -> Result<Utterance, PetError> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut slot) = self.open.lock() {
            *slot = Some(tx);
        }
        Ok(rx)
    }

    fn speak(&mut self, text: &str, params: VoiceParams) {
        info!(pitch = params.pitch, rate = params.rate, text, "speak");
    }
}
