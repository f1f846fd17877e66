//! Replacement Module
//!
//! Relaunch handshake: the old window keeps its surface and geometry until
//! the window that replaces it reports its first draw.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::wm::window::{Window, WindowId};
use crate::wm::window_flags::{PrivateFlags, WindowType};

/// Replacement bookkeeping for one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementState {
    /// A relaunch will add a window to replace this one
    pub will_replace: bool,
    /// The window that will take over, once it has been added
    pub replacing_window: Option<WindowId>,
    /// Removal was requested while waiting for the replacement
    pub remove_requested: bool,
    /// Animate the swap to the replacing window
    pub animate: bool,
}

impl ReplacementState {
    /// Layout and state updates must not touch a window that is about to be
    /// replaced and is either exiting or not yet acknowledged for removal.
    pub fn suppresses_layout(&self, exiting: bool) -> bool {
        self.will_replace && (exiting || !self.remove_requested)
    }

    /// Waiting for a replacement that has not been added yet
    pub fn awaiting_replacement(&self) -> bool {
        self.will_replace && self.replacing_window.is_none()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Window {
    /// Mark this window as about to be replaced by a relaunch.
    ///
    /// Starting windows and windows that opted out are never replaced.
    /// Returns whether the window was marked.
    pub fn set_replacing(&mut self, animate: bool) -> bool {
        if self
            .attrs
            .private_flags
            .contains(PrivateFlags::WILL_NOT_REPLACE_ON_RELAUNCH)
            || self.attrs.window_type == WindowType::ApplicationStarting
        {
            debug!("{} is not replaceable", self.id);
            return false;
        }

        self.replacement.will_replace = true;
        self.replacement.replacing_window = None;
        self.replacement.animate = animate;
        debug!("{} will be replaced (animate: {})", self.id, animate);
        true
    }

    /// Called on the old window once `replacement` has drawn.
    ///
    /// Returns true when the old window was already exiting and its removal
    /// should now be finalized.
    pub fn release_to_replacement(&mut self, replacement: WindowId) -> bool {
        if !self.replacement.will_replace || self.replacement.replacing_window != Some(replacement) {
            return false;
        }
        self.replacement.reset();
        debug!("{} released to its replacement {}", self.id, replacement);
        self.exiting
    }
}
