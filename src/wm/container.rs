//! Container Module
//!
//! State owned by the task/stack/display collaborators that the window core
//! reads during layout and visibility checks. Windows refer to these by id.

use serde::{Deserialize, Serialize};

use crate::shared::Rect;

/// Task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u32);

/// Window token identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

/// Display identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayId(pub u32);

impl DisplayId {
    pub const DEFAULT: DisplayId = DisplayId(0);
}

/// How a task is laid out on its display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskMode {
    #[default]
    Fullscreen,
    Freeform,
    Docked,
}

/// Task bounds and mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub bounds: Rect,
    /// Bounds substituted for insets while the docked stack is resized
    pub temp_inset_bounds: Option<Rect>,
    pub mode: TaskMode,
    pub drag_resizing: bool,
}

impl Task {
    pub fn new(bounds: Rect, mode: TaskMode) -> Self {
        Self {
            bounds,
            temp_inset_bounds: None,
            mode,
            drag_resizing: false,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.mode == TaskMode::Fullscreen
    }

    pub fn is_freeform(&self) -> bool {
        self.mode == TaskMode::Freeform
    }
}

/// Visibility state of a window token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub hidden: bool,
    /// Waiting for a pending app transition before showing
    pub waiting_to_show: bool,
}

/// App-level state attached to an application token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppWindowToken {
    pub task: Option<TaskId>,
    pub hidden_requested: bool,
    pub hidden: bool,
    /// An app transition animation is running
    pub animating: bool,
    pub windows_focusable: bool,
    pub client_hidden: bool,
    pub app_died: bool,
    pub first_window_drawn: bool,
    /// Bounds frozen while the task repositions, most recent last
    pub frozen_bounds: Vec<Rect>,
}

impl Default for AppWindowToken {
    fn default() -> Self {
        Self {
            task: None,
            hidden_requested: false,
            hidden: false,
            animating: false,
            windows_focusable: true,
            client_hidden: false,
            app_died: false,
            first_window_drawn: false,
            frozen_bounds: Vec::new(),
        }
    }
}

impl AppWindowToken {
    pub fn for_task(task: TaskId) -> Self {
        Self {
            task: Some(task),
            ..Self::default()
        }
    }

    pub fn top_frozen_bounds(&self) -> Option<Rect> {
        self.frozen_bounds.last().copied()
    }
}

/// Token grouping the windows of one client surface tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowToken {
    pub state: TokenState,
    pub app: Option<AppWindowToken>,
}

impl WindowToken {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn app(app: AppWindowToken) -> Self {
        Self {
            state: TokenState::default(),
            app: Some(app),
        }
    }
}

/// Physical properties of a display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub logical_width: i32,
    pub logical_height: i32,
    /// Scale from density-independent to device pixels (1.0 at 160 dpi)
    pub density: f32,
}

impl DisplayInfo {
    pub fn dip_to_px(&self, dip: i32) -> i32 {
        (dip as f32 * self.density) as i32
    }

    pub fn logical_rect(&self) -> Rect {
        Rect::new(0, 0, self.logical_width, self.logical_height)
    }
}

/// Docked divider controller state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividerController {
    pub resizing: bool,
    /// Authoritative divider position, when known
    pub position: Option<Rect>,
}

impl DividerController {
    pub fn position_divider(&self, frame: &mut Rect) {
        if let Some(position) = self.position {
            *frame = position;
        }
    }
}

/// Display a window lives on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayContent {
    pub info: DisplayInfo,
    pub divider: DividerController,
    pub layout_needed: bool,
    /// Wallpaper offsets must be recomputed for the new wallpaper size
    pub wallpaper_offset_stale: bool,
}

impl DisplayContent {
    pub fn new(info: DisplayInfo) -> Self {
        Self {
            info,
            divider: DividerController::default(),
            layout_needed: false,
            wallpaper_offset_stale: false,
        }
    }
}
