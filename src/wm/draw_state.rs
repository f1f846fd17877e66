//! Draw State Module
//!
//! Lifecycle of a window surface as the client draws into it. States only
//! move forward one step at a time; destroying (or saving) the surface drops
//! back to `NoSurface` from anywhere.

use serde::{Deserialize, Serialize};

/// Surface draw progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DrawState {
    /// No surface exists
    #[default]
    NoSurface,
    /// Surface created, waiting for the client's first draw
    DrawPending,
    /// Client finished drawing, waiting for the next transaction to commit it
    CommitDrawPending,
    /// Committed, can be shown on the next animation pass
    ReadyToShow,
    /// Surface has been shown
    HasDrawn,
}

impl DrawState {
    /// The state that follows this one, if any
    pub fn next(self) -> Option<DrawState> {
        match self {
            Self::NoSurface => Some(Self::DrawPending),
            Self::DrawPending => Some(Self::CommitDrawPending),
            Self::CommitDrawPending => Some(Self::ReadyToShow),
            Self::ReadyToShow => Some(Self::HasDrawn),
            Self::HasDrawn => None,
        }
    }

    /// Whether moving to `to` is a legal single step
    pub fn can_transition_to(self, to: DrawState) -> bool {
        to == Self::NoSurface || self.next() == Some(to)
    }

    /// Client has finished drawing a complete frame
    pub fn is_draw_finished(self) -> bool {
        matches!(self, Self::CommitDrawPending | Self::ReadyToShow | Self::HasDrawn)
    }

    /// The drawn frame is committed
    pub fn is_drawn(self) -> bool {
        matches!(self, Self::ReadyToShow | Self::HasDrawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DrawState; 5] = [
        DrawState::NoSurface,
        DrawState::DrawPending,
        DrawState::CommitDrawPending,
        DrawState::ReadyToShow,
        DrawState::HasDrawn,
    ];

    #[test]
    fn test_drawn_implies_draw_finished() {
        for state in ALL {
            if state.is_drawn() {
                assert!(state.is_draw_finished(), "{state:?}");
            }
        }
    }

    #[test]
    fn test_only_single_forward_steps() {
        assert!(DrawState::NoSurface.can_transition_to(DrawState::DrawPending));
        assert!(!DrawState::NoSurface.can_transition_to(DrawState::ReadyToShow));
        assert!(!DrawState::HasDrawn.can_transition_to(DrawState::ReadyToShow));
        assert!(DrawState::DrawPending.can_transition_to(DrawState::CommitDrawPending));
    }

    #[test]
    fn test_any_state_can_drop_to_no_surface() {
        for state in ALL {
            assert!(state.can_transition_to(DrawState::NoSurface));
        }
    }

    #[test]
    fn test_forward_order_is_monotonic() {
        let mut state = DrawState::NoSurface;
        while let Some(next) = state.next() {
            assert!(next > state);
            state = next;
        }
        assert_eq!(state, DrawState::HasDrawn);
    }
}
