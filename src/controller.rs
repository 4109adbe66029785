//! The decoder runs on the bus receive path while commands come from the UI,
//! possibly on another task or thread. [`MediaController`] owns the session
//! state and makes the two paths take turns.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::{
    command::CommandDocument,
    config::Addressing,
    decode::{self, DecodeError},
    encode::{self, EncodeError, Frames},
    state::SessionState,
    status::StatusDocument,
};

pub struct MediaController {
    state: Mutex<CriticalSectionRawMutex, RefCell<SessionState>>,
}

impl Default for MediaController {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaController {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SessionState::new())),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    /// Decode one reassembled status payload.
    pub fn decode(&self, payload: &[u8]) -> Result<Option<StatusDocument>, DecodeError> {
        self.with_state(|state| decode::decode(payload, state))
    }

    /// Encode a command document into addressed frames, in send order.
    pub fn encode(&self, doc: &CommandDocument, addressing: Addressing) -> Result<Frames, EncodeError> {
        let fragments = self.with_state(|state| encode::encode(doc, state))?;
        Ok(encode::to_frames(&fragments, addressing))
    }

    /// Like [`MediaController::encode`], reading the document from JSON.
    pub fn encode_value(
        &self,
        value: &serde_json::Value,
        addressing: Addressing,
    ) -> Result<Frames, EncodeError> {
        let fragments = self.with_state(|state| encode::encode_value(value, state))?;
        Ok(encode::to_frames(&fragments, addressing))
    }

    /// A copy of the current session state.
    pub fn snapshot(&self) -> SessionState {
        self.with_state(|state| state.clone())
    }
}
