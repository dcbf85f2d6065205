//! Encoding lifecycle.
//!
//! ```text
//!   queued ──claim──→ assigned
//!     │                  │
//!     └─────encode───────┴──→ encoding ──success──→ success
//!                                 │
//!                                 └──────fail─────→ error
//! ```
//!
//! `success` and `error` are terminal. Every legal move is listed in
//! [`EncodingStatus::on`]; anything else is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStatus {
    #[default]
    Queued,
    Assigned,
    Encoding,
    Success,
    Error,
}

/// Events that drive an encoding between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Claim,
    Encode,
    Success,
    Fail,
}

/// Side effects bound to a transition, in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Fetch the source video into the workspace. Runs before the claim is committed.
    DownloadVideo,
    /// Compute geometry and invoke the transcoder, then settle with `success` or `fail`.
    EncodeVideo,
    /// Push the produced output to the destination store. Runs before success is committed.
    UploadEncoding,
    /// Remove both temp files. Runs once the encode attempt has settled.
    Cleanup,
}

impl Effect {
    /// Whether the effect must complete before the new state is persisted.
    pub fn runs_before_commit(&self) -> bool {
        matches!(self, Effect::DownloadVideo | Effect::UploadEncoding)
    }
}

/// A legal move, with the effects the orchestrator has to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: EncodingStatus,
    pub to: EncodingStatus,
    pub event: Event,
    pub effects: &'static [Effect],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {event} an encoding in state {from}")]
    InvalidTransition { from: EncodingStatus, event: Event },
}

impl EncodingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingStatus::Queued => "queued",
            EncodingStatus::Assigned => "assigned",
            EncodingStatus::Encoding => "encoding",
            EncodingStatus::Success => "success",
            EncodingStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EncodingStatus::Success | EncodingStatus::Error)
    }

    /// Resolve `event` against the current state.
    pub fn on(self, event: Event) -> Result<Transition, TransitionError> {
        let (to, effects): (EncodingStatus, &'static [Effect]) = match (self, event) {
            (Self::Queued, Event::Claim) => (Self::Assigned, &[Effect::DownloadVideo]),
            (Self::Queued | Self::Assigned, Event::Encode) => {
                (Self::Encoding, &[Effect::EncodeVideo, Effect::Cleanup])
            }
            (Self::Encoding, Event::Success) => (Self::Success, &[Effect::UploadEncoding]),
            (Self::Encoding, Event::Fail) => (Self::Error, &[]),
            (from, event) => return Err(TransitionError::InvalidTransition { from, event }),
        };

        Ok(Transition {
            from: self,
            to,
            event,
            effects,
        })
    }

    pub fn can(self, event: Event) -> bool {
        self.on(event).is_ok()
    }
}

impl fmt::Display for EncodingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(EncodingStatus::Queued),
            "assigned" => Ok(EncodingStatus::Assigned),
            "encoding" => Ok(EncodingStatus::Encoding),
            "success" => Ok(EncodingStatus::Success),
            "error" => Ok(EncodingStatus::Error),
            other => Err(format!("unknown encoding status: {}", other)),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::Claim => "claim",
            Event::Encode => "encode",
            Event::Success => "success",
            Event::Fail => "fail",
        };
        f.write_str(name)
    }
}
