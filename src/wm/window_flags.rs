//! Window Flags
//!
//! Window types, attribute flags and the layout attributes a client supplies
//! when it adds or relayouts a window.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::wm::gravity::Gravity;

bitflags! {
    /// Client-visible attribute flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AttrFlags: u32 {
        /// Surface is scaled to the requested size instead of resized
        const SCALED              = 1 << 0;
        const NOT_FOCUSABLE       = 1 << 1;
    }
}

bitflags! {
    /// Flags only the window manager itself may set
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PrivateFlags: u32 {
        /// Client runs under the size-compatibility scale
        const COMPATIBLE_WINDOW                  = 1 << 0;
        /// Child window uses its parent's frame as containing frame
        const LAYOUT_CHILD_WINDOW_IN_PARENT_FRAME = 1 << 1;
        /// Relaunching the app must not mark this window for replacement
        const WILL_NOT_REPLACE_ON_RELAUNCH       = 1 << 2;
    }
}

/// Window type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    // Application windows
    BaseApplication,
    Application,
    ApplicationStarting,

    // Sub-windows, always attached to a parent
    ApplicationPanel,
    ApplicationMedia,
    ApplicationSubPanel,
    ApplicationAttachedDialog,
    ApplicationMediaOverlay,
    ApplicationAboveSubPanel,

    // System windows
    StatusBar,
    NavigationBar,
    SystemAlert,
    Toast,
    InputMethod,
    InputMethodDialog,
    Wallpaper,
    DockDivider,
    Keyguard,
}

impl WindowType {
    pub fn is_sub_window(self) -> bool {
        matches!(
            self,
            Self::ApplicationPanel
                | Self::ApplicationMedia
                | Self::ApplicationSubPanel
                | Self::ApplicationAttachedDialog
                | Self::ApplicationMediaOverlay
                | Self::ApplicationAboveSubPanel
        )
    }

    pub fn is_input_method(self) -> bool {
        matches!(self, Self::InputMethod | Self::InputMethodDialog)
    }
}

/// Requested width or height
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutDimension {
    #[default]
    MatchParent,
    WrapContent,
    Exact(i32),
}

/// Client view visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewVisibility {
    #[default]
    Visible,
    Invisible,
    Gone,
}

/// Surface pixel format, only opacity matters here
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Opaque,
    #[default]
    Translucent,
}

/// Layout attributes requested by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAttrs {
    pub window_type: WindowType,
    pub flags: AttrFlags,
    pub private_flags: PrivateFlags,
    pub width: LayoutDimension,
    pub height: LayoutDimension,
    pub x: i32,
    pub y: i32,
    /// Fraction of the containing frame width added to `x`
    pub horizontal_margin: f32,
    /// Fraction of the containing frame height added to `y`
    pub vertical_margin: f32,
    pub gravity: Gravity,
    pub format: PixelFormat,
    pub title: String,
}

impl WindowAttrs {
    pub fn new(window_type: WindowType) -> Self {
        Self {
            window_type,
            flags: AttrFlags::default(),
            private_flags: PrivateFlags::default(),
            width: LayoutDimension::MatchParent,
            height: LayoutDimension::MatchParent,
            x: 0,
            y: 0,
            horizontal_margin: 0.0,
            vertical_margin: 0.0,
            gravity: Gravity::default(),
            format: PixelFormat::default(),
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: LayoutDimension, height: LayoutDimension) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
