//! Window manager error types

use thiserror::Error;

use crate::wm::container::{DisplayId, TokenId};
use crate::wm::draw_state::DrawState;
use crate::wm::window::WindowId;
use crate::wm::window_flags::WindowType;

/// Errors surfaced to callers of the window core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WmError {
    #[error("Unknown window: {0}")]
    UnknownWindow(WindowId),

    #[error("Unknown window token: {0:?}")]
    UnknownToken(TokenId),

    #[error("Unknown display: {0:?}")]
    UnknownDisplay(DisplayId),

    #[error("Window {0} already has an input channel")]
    InputChannelAlreadyOpen(WindowId),

    #[error("Invalid draw state transition for window {window}: {from:?} -> {to:?}")]
    InvalidDrawTransition {
        window: WindowId,
        from: DrawState,
        to: DrawState,
    },

    #[error("Sub-window of type {window_type:?} needs a parent window")]
    MissingParent { window_type: WindowType },

    #[error("Window of type {window_type:?} cannot be attached to a parent")]
    UnexpectedParent { window_type: WindowType },
}

/// Failures reported by the remote client transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Client process is gone")]
    DeadObject,

    #[error("Client rejected the call: {0}")]
    Rejected(String),
}

/// Result type for window core operations
pub type Result<T> = std::result::Result<T, WmError>;
