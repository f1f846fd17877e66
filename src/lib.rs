//! Area Window
//!
//! Per-window geometry and visibility core: frame and inset resolution,
//! visibility predicates, child stacking, the draw-state machine, window
//! replacement, and the client/input boundaries around them.

pub mod config;
pub mod shared;
pub mod wm;
