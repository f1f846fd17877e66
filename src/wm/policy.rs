//! Policy Module
//!
//! The window manager only consumes two answers from policy: which z-layer a
//! window type lives in, and where a sub-window sits relative to its parent.

use crate::wm::window_flags::WindowType;

/// Room reserved for the windows sharing one type layer
pub const TYPE_LAYER_MULTIPLIER: i32 = 10000;

/// Offset so a window can be animated above its siblings in the same layer
pub const TYPE_LAYER_OFFSET: i32 = 1000;

/// Layer decisions supplied by the window manager policy
pub trait WindowPolicy: Send {
    /// Z-layer for a (non sub-window) type
    fn window_type_to_layer(&self, window_type: WindowType) -> i32;

    /// Sub-layer of a sub-window type relative to its parent.
    /// Negative values place it below the parent surface.
    fn sub_window_type_to_layer(&self, window_type: WindowType) -> i32;
}

/// Phone-style layering
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

const APPLICATION_MEDIA_SUBLAYER: i32 = -2;
const APPLICATION_MEDIA_OVERLAY_SUBLAYER: i32 = -1;
const APPLICATION_PANEL_SUBLAYER: i32 = 1;
const APPLICATION_SUB_PANEL_SUBLAYER: i32 = 2;
const APPLICATION_ABOVE_SUB_PANEL_SUBLAYER: i32 = 3;

impl WindowPolicy for DefaultPolicy {
    fn window_type_to_layer(&self, window_type: WindowType) -> i32 {
        match window_type {
            WindowType::Wallpaper => 1,
            WindowType::DockDivider => 3,
            WindowType::Keyguard => 13,
            WindowType::Toast => 8,
            WindowType::SystemAlert => 11,
            WindowType::InputMethod => 15,
            WindowType::InputMethodDialog => 16,
            WindowType::StatusBar => 17,
            WindowType::NavigationBar => 19,
            // Applications and anything attached to them
            _ => 2,
        }
    }

    fn sub_window_type_to_layer(&self, window_type: WindowType) -> i32 {
        match window_type {
            WindowType::ApplicationPanel | WindowType::ApplicationAttachedDialog => {
                APPLICATION_PANEL_SUBLAYER
            }
            WindowType::ApplicationMedia => APPLICATION_MEDIA_SUBLAYER,
            WindowType::ApplicationMediaOverlay => APPLICATION_MEDIA_OVERLAY_SUBLAYER,
            WindowType::ApplicationSubPanel => APPLICATION_SUB_PANEL_SUBLAYER,
            WindowType::ApplicationAboveSubPanel => APPLICATION_ABOVE_SUB_PANEL_SUBLAYER,
            _ => 0,
        }
    }
}

/// Base layer for a window whose layering type is `layer_type`
pub fn base_layer_for(policy: &dyn WindowPolicy, layer_type: WindowType) -> i32 {
    policy.window_type_to_layer(layer_type) * TYPE_LAYER_MULTIPLIER + TYPE_LAYER_OFFSET
}
