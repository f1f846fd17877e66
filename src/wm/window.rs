//! Window Module
//!
//! The window entity: identity, hierarchy handles, reference frames and the
//! insets derived from them, scale state, and the flags the visibility
//! predicates read. Collaborators (tokens, tasks, displays) are referred to
//! by id and looked up in the owning [`WindowManager`](crate::wm::WindowManager).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shared::{Insets, Rect};
use crate::wm::client::Configuration;
use crate::wm::container::{DisplayId, TokenId};
use crate::wm::draw_state::DrawState;
use crate::wm::errors::{Result, WmError};
use crate::wm::input::InputChannel;
use crate::wm::moveresize::DragResizeMode;
use crate::wm::policy::{base_layer_for, WindowPolicy};
use crate::wm::replacement::ReplacementState;
use crate::wm::stacking::ChildWindows;
use crate::wm::window_flags::{AttrFlags, LayoutDimension, PrivateFlags, ViewVisibility, WindowAttrs, WindowType};

/// Window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Window#{}", self.0)
    }
}

bitflags! {
    /// Insets that changed since they were last reported to the client
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InsetsChanged: u8 {
        const OVERSCAN = 1 << 0;
        const CONTENT  = 1 << 1;
        const VISIBLE  = 1 << 2;
        const STABLE   = 1 << 3;
        const OUTSETS  = 1 << 4;
    }
}

/// The inset set reported to a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInsets {
    pub overscan: Insets,
    /// May be negative when the frame extends past the content area
    pub content: Insets,
    /// May be negative when the frame extends past the visible area
    pub visible: Insets,
    pub stable: Insets,
    pub outsets: Insets,
}

impl WindowInsets {
    fn changes_from(&self, last: &WindowInsets) -> InsetsChanged {
        let mut changed = InsetsChanged::empty();
        changed.set(InsetsChanged::OVERSCAN, self.overscan != last.overscan);
        changed.set(InsetsChanged::CONTENT, self.content != last.content);
        changed.set(InsetsChanged::VISIBLE, self.visible != last.visible);
        changed.set(InsetsChanged::STABLE, self.stable != last.stable);
        changed.set(InsetsChanged::OUTSETS, self.outsets != last.outsets);
        changed
    }
}

/// What the client supplies when adding a window
#[derive(Debug, Clone)]
pub struct WindowParams {
    pub owner_uid: u32,
    pub attrs: WindowAttrs,
    pub token: TokenId,
    pub display: DisplayId,
    pub parent: Option<WindowId>,
    pub view_visibility: ViewVisibility,
}

impl WindowParams {
    pub fn new(attrs: WindowAttrs, token: TokenId) -> Self {
        Self {
            owner_uid: 0,
            attrs,
            token,
            display: DisplayId::DEFAULT,
            parent: None,
            view_visibility: ViewVisibility::Visible,
        }
    }

    pub fn with_parent(mut self, parent: WindowId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn on_display(mut self, display: DisplayId) -> Self {
        self.display = display;
        self
    }

    pub fn owned_by(mut self, uid: u32) -> Self {
        self.owner_uid = uid;
        self
    }
}

/// A managed window
#[derive(Debug)]
pub struct Window {
    pub id: WindowId,
    pub owner_uid: u32,
    pub attrs: WindowAttrs,
    pub token: TokenId,
    pub display: DisplayId,

    // Stacking
    pub base_layer: i32,
    pub sub_layer: i32,
    pub parent: Option<WindowId>,
    pub children: ChildWindows,
    pub is_im_window: bool,
    pub is_wallpaper: bool,
    pub is_floating_layer: bool,
    /// Sub-window placed relative to its parent
    pub layout_attached: bool,

    // Frames
    pub frame: Rect,
    pub last_frame: Rect,
    /// Frame in the client's own coordinate space
    pub compat_frame: Rect,
    pub containing_frame: Rect,
    pub parent_frame: Rect,
    pub display_frame: Rect,
    pub overscan_frame: Rect,
    pub content_frame: Rect,
    pub visible_frame: Rect,
    pub decor_frame: Rect,
    pub stable_frame: Rect,
    pub outset_frame: Rect,
    /// Inset-override bounds, empty when not overridden
    pub inset_frame: Rect,
    pub content_changed: bool,
    pub moved_by_resize: bool,
    pub have_frame: bool,
    pub layout_needed: bool,

    // Insets
    pub insets: WindowInsets,
    pub last_insets: WindowInsets,
    pub insets_changed: InsetsChanged,

    // Size and scale
    pub requested_width: i32,
    pub requested_height: i32,
    pub last_requested_width: i32,
    pub last_requested_height: i32,
    pub enforce_size_compat: bool,
    pub global_scale: f32,
    pub inv_global_scale: f32,
    pub h_scale: f32,
    pub v_scale: f32,

    // Visibility
    pub policy_visible: bool,
    pub policy_visible_after_anim: bool,
    pub app_op_visible: bool,
    pub attached_hidden: bool,
    pub exiting: bool,
    pub destroying: bool,
    pub removed: bool,
    pub has_surface: bool,
    pub wallpaper_visible: bool,
    pub relayout_called: bool,
    pub view_visibility: ViewVisibility,
    /// An animation is running on this window
    pub animating: bool,
    /// The surface was hidden on the last animation pass
    pub last_hidden: bool,

    // Surface
    pub draw_state: DrawState,
    pub surface_saved: bool,

    // Resize
    pub drag_resizing: bool,
    pub resize_mode: DragResizeMode,

    pub replacement: ReplacementState,
    pub input_channel: Option<InputChannel>,
    /// Configuration last sent to the client
    pub last_config: Option<Configuration>,
}

impl Window {
    /// Create a window. `parent_type` is the parent's type for sub-windows,
    /// which decides the layer the window lives in.
    pub fn new(id: WindowId, params: WindowParams, parent_type: Option<WindowType>, policy: &dyn WindowPolicy) -> Self {
        let window_type = params.attrs.window_type;
        let (base_layer, sub_layer, is_im_window, is_wallpaper, is_floating_layer, layout_attached) =
            match parent_type {
                Some(parent_type) => (
                    base_layer_for(policy, parent_type),
                    policy.sub_window_type_to_layer(window_type),
                    false,
                    parent_type == WindowType::Wallpaper,
                    parent_type.is_input_method() || parent_type == WindowType::Wallpaper,
                    window_type != WindowType::ApplicationAttachedDialog,
                ),
                None => {
                    let im = window_type.is_input_method();
                    let wallpaper = window_type == WindowType::Wallpaper;
                    (base_layer_for(policy, window_type), 0, im, wallpaper, im || wallpaper, false)
                }
            };

        debug!(
            "New {} type={:?} layer={} sub_layer={}",
            id, window_type, base_layer, sub_layer
        );

        Self {
            id,
            owner_uid: params.owner_uid,
            enforce_size_compat: params.attrs.private_flags.contains(PrivateFlags::COMPATIBLE_WINDOW),
            attrs: params.attrs,
            token: params.token,
            display: params.display,
            base_layer,
            sub_layer,
            parent: params.parent,
            children: ChildWindows::new(),
            is_im_window,
            is_wallpaper,
            is_floating_layer,
            layout_attached,
            frame: Rect::EMPTY,
            last_frame: Rect::EMPTY,
            compat_frame: Rect::EMPTY,
            containing_frame: Rect::EMPTY,
            parent_frame: Rect::EMPTY,
            display_frame: Rect::EMPTY,
            overscan_frame: Rect::EMPTY,
            content_frame: Rect::EMPTY,
            visible_frame: Rect::EMPTY,
            decor_frame: Rect::EMPTY,
            stable_frame: Rect::EMPTY,
            outset_frame: Rect::EMPTY,
            inset_frame: Rect::EMPTY,
            content_changed: false,
            moved_by_resize: false,
            have_frame: false,
            layout_needed: false,
            insets: WindowInsets::default(),
            last_insets: WindowInsets::default(),
            insets_changed: InsetsChanged::empty(),
            requested_width: 0,
            requested_height: 0,
            last_requested_width: 0,
            last_requested_height: 0,
            global_scale: 1.0,
            inv_global_scale: 1.0,
            h_scale: 1.0,
            v_scale: 1.0,
            policy_visible: true,
            policy_visible_after_anim: true,
            app_op_visible: true,
            attached_hidden: false,
            exiting: false,
            destroying: false,
            removed: false,
            has_surface: false,
            wallpaper_visible: false,
            relayout_called: false,
            view_visibility: params.view_visibility,
            animating: false,
            last_hidden: false,
            draw_state: DrawState::NoSurface,
            surface_saved: false,
            drag_resizing: false,
            resize_mode: DragResizeMode::Freeform,
            replacement: ReplacementState::default(),
            input_channel: None,
            last_config: None,
        }
    }

    pub fn window_type(&self) -> WindowType {
        self.attrs.window_type
    }

    pub fn is_child_window(&self) -> bool {
        self.parent.is_some()
    }

    /// Pick up the compatibility scale for the coming layout pass
    pub fn prelayout(&mut self, compat_screen_scale: f32) {
        if self.enforce_size_compat {
            self.global_scale = compat_screen_scale;
            self.inv_global_scale = 1.0 / compat_screen_scale;
        } else {
            self.global_scale = 1.0;
            self.inv_global_scale = 1.0;
        }
    }

    pub fn set_requested_size(&mut self, width: i32, height: i32) {
        if self.requested_width != width || self.requested_height != height {
            self.layout_needed = true;
            self.requested_width = width;
            self.requested_height = height;
        }
    }

    /// Derive the surface scale of a `SCALED` window: the on-screen size is
    /// the attribute size, the surface has the requested size.
    pub fn set_window_scale(&mut self, requested_width: i32, requested_height: i32) {
        if !self.attrs.flags.contains(AttrFlags::SCALED) {
            self.h_scale = 1.0;
            self.v_scale = 1.0;
            return;
        }
        self.h_scale = axis_scale(self.attrs.width, requested_width);
        self.v_scale = axis_scale(self.attrs.height, requested_height);
    }

    /// Map a screen-space rectangle into surface space
    pub fn transform_from_screen_to_surface_space(&self, rect: &mut Rect) {
        if self.h_scale > 0.0 {
            rect.left = (rect.left as f32 / self.h_scale) as i32;
            rect.right = (rect.right as f32 / self.h_scale) as i32;
        }
        if self.v_scale > 0.0 {
            rect.top = (rect.top as f32 / self.v_scale) as i32;
            rect.bottom = (rect.bottom as f32 / self.v_scale) as i32;
        }
    }

    /// Accumulate changed flags from current vs. last insets.
    ///
    /// Returns whether anything the client must be told about changed
    /// (stable insets alone do not count).
    pub fn set_insets_changed(&mut self) -> bool {
        self.insets_changed |= self.insets.changes_from(&self.last_insets);
        self.insets_changed.intersects(
            InsetsChanged::OVERSCAN | InsetsChanged::CONTENT | InsetsChanged::VISIBLE | InsetsChanged::OUTSETS,
        )
    }

    pub fn snapshot_last_insets(&mut self) {
        self.last_insets = self.insets;
    }

    /// Record the resolved frame as the last one laid out
    pub fn snapshot_last_frame(&mut self) {
        self.last_frame = self.frame;
        self.content_changed = false;
        self.moved_by_resize = false;
    }

    /// Move the draw state one step forward (or back to `NoSurface`)
    pub fn set_draw_state(&mut self, to: DrawState) -> Result<()> {
        if !self.draw_state.can_transition_to(to) {
            return Err(WmError::InvalidDrawTransition {
                window: self.id,
                from: self.draw_state,
                to,
            });
        }
        self.draw_state = to;
        Ok(())
    }

    /// A fresh surface was created and waits for the client to draw
    pub fn create_surface(&mut self) -> Result<()> {
        self.set_draw_state(DrawState::DrawPending)?;
        self.has_surface = true;
        self.surface_saved = false;
        Ok(())
    }

    pub fn destroy_surface(&mut self) {
        self.draw_state = DrawState::NoSurface;
        self.has_surface = false;
        self.surface_saved = false;
    }

    /// Keep the surface for later reuse; geometry is left untouched
    pub fn save_surface(&mut self) {
        self.surface_saved = true;
        self.draw_state = DrawState::NoSurface;
        self.has_surface = false;
        debug!("Saved surface of {}", self.id);
    }

    pub fn restore_saved_surface(&mut self) {
        self.surface_saved = false;
        self.has_surface = true;
        self.draw_state = DrawState::ReadyToShow;
        debug!("Restored surface of {}", self.id);
    }

    /// Make the window policy-visible. Returns false when nothing changed or
    /// app ops keep it hidden.
    pub fn show(&mut self, do_animation: bool) -> bool {
        if !self.app_op_visible {
            return false;
        }
        if self.policy_visible && self.policy_visible_after_anim {
            return false;
        }
        self.policy_visible = true;
        self.policy_visible_after_anim = true;
        debug!("Policy visibility true: {} (animate: {})", self.id, do_animation);
        true
    }

    /// Hide the window. An animated hide only takes effect once the
    /// animation ends, see [`Window::check_policy_visibility_change`].
    pub fn hide(&mut self, do_animation: bool) -> bool {
        let current = if do_animation {
            self.policy_visible_after_anim
        } else {
            self.policy_visible
        };
        if !current {
            return false;
        }
        self.policy_visible_after_anim = false;
        if !do_animation {
            self.policy_visible = false;
            debug!("Policy visibility false: {}", self.id);
        }
        true
    }

    /// Settle policy visibility after an animation; returns whether it flipped
    pub fn check_policy_visibility_change(&mut self) -> bool {
        if self.policy_visible == self.policy_visible_after_anim {
            return false;
        }
        debug!(
            "Policy visibility changing after anim in {}: {}",
            self.id, self.policy_visible_after_anim
        );
        self.policy_visible = self.policy_visible_after_anim;
        true
    }

    pub fn set_app_op_visibility(&mut self, visible: bool) {
        if self.app_op_visible == visible {
            return;
        }
        self.app_op_visible = visible;
        if visible {
            self.show(true);
        } else {
            self.hide(true);
        }
    }
}

fn axis_scale(attr: LayoutDimension, requested: i32) -> f32 {
    match attr {
        LayoutDimension::Exact(size) if size != requested && requested != 0 => size as f32 / requested as f32,
        _ => 1.0,
    }
}
