//! Frame Resolution
//!
//! Turns the reference rectangles handed over by the layout driver into the
//! window's final frame and the insets reported to the client.
//!
//! Order matters: the containing frame is chosen first, gravity sizes and
//! places the frame, outsets are taken before a freeform frame is shrunk,
//! and insets are measured against the inset-override bounds when a docked
//! resize has frozen them.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::shared::{Insets, Rect};
use crate::wm::container::{DividerController, Task};
use crate::wm::window::Window;
use crate::wm::window_flags::{AttrFlags, LayoutDimension, PrivateFlags, WindowType};

/// Reference rectangles supplied once per layout pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutFrames {
    pub parent: Rect,
    pub display: Rect,
    pub overscan: Rect,
    pub content: Rect,
    pub visible: Rect,
    pub decor: Rect,
    pub stable: Rect,
    pub outset: Option<Rect>,
}

impl LayoutFrames {
    /// Every reference rectangle set to `rect`
    pub fn uniform(rect: Rect) -> Self {
        Self {
            parent: rect,
            display: rect,
            overscan: rect,
            content: rect,
            visible: rect,
            decor: rect,
            stable: rect,
            outset: None,
        }
    }
}

/// Collaborator state consulted while resolving a frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub task: Option<&'a Task>,
    /// Most recent frozen bounds of the owning app
    pub frozen_bounds: Option<Rect>,
    /// The input method is showing and this window is its target
    pub ime_obscuring: bool,
    pub divider: &'a DividerController,
    /// Visible or animating, consulted for the docked divider only
    pub visible_or_animating: bool,
    /// Freeform minimum visible size, in device pixels
    pub min_visible_width: i32,
    pub min_visible_height: i32,
}

/// Result of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Window is waiting for its replacement, nothing was touched
    Skipped,
    Resolved {
        /// Wallpaper changed size, its offsets need recomputing
        wallpaper_offset_stale: bool,
    },
}

impl Window {
    pub fn compute_frame(&mut self, frames: &LayoutFrames, cx: &FrameContext<'_>) -> FrameOutcome {
        if self.replacement.suppresses_layout(self.exiting) {
            trace!("{} waiting for replacement, frame kept at {}", self.id, self.frame);
            return FrameOutcome::Skipped;
        }
        self.have_frame = true;

        let freeform = cx.task.is_some_and(Task::is_freeform);
        let in_parent_frame = self.is_child_window()
            && self
                .attrs
                .private_flags
                .contains(PrivateFlags::LAYOUT_CHILD_WINDOW_IN_PARENT_FRAME);

        match cx.task.filter(|task| !task.is_fullscreen() && !in_parent_frame) {
            None => {
                self.containing_frame = frames.parent;
                self.display_frame = frames.display;
                self.inset_frame.set_empty();
            }
            Some(task) => {
                let mut containing = task.bounds;
                self.inset_frame = task.temp_inset_bounds.unwrap_or(Rect::EMPTY);
                if let Some(frozen) = cx.frozen_bounds {
                    // Frozen size, free translation
                    containing.right = containing.left + frozen.width();
                    containing.bottom = containing.top + frozen.height();
                }
                if cx.ime_obscuring && containing.bottom > frames.content.bottom {
                    // Move the whole task above the IME, its size is kept
                    let overlap = containing.bottom - frames.content.bottom;
                    containing.offset(0, -overlap);
                }
                if freeform && containing.is_empty() {
                    containing = frames.content;
                }
                self.containing_frame = containing;
                self.display_frame = containing;
            }
        }

        if self.parent_frame != frames.parent {
            self.parent_frame = frames.parent;
            self.content_changed = true;
        }
        if self.requested_width != self.last_requested_width || self.requested_height != self.last_requested_height {
            self.last_requested_width = self.requested_width;
            self.last_requested_height = self.requested_height;
            self.content_changed = true;
        }

        self.overscan_frame = frames.overscan;
        self.content_frame = frames.content;
        self.visible_frame = frames.visible;
        self.decor_frame = frames.decor;
        self.stable_frame = frames.stable;
        if let Some(outset) = frames.outset {
            self.outset_frame = outset;
        }

        let (old_width, old_height) = (self.frame.width(), self.frame.height());

        self.apply_gravity_and_update_frame(cx.task);

        // Before the content frame is shrunk to the window frame
        self.insets.outsets = match frames.outset {
            Some(outset) => self.content_frame.insets_within(&outset).clamped(),
            None => Insets::ZERO,
        };

        // Frame the insets are measured against
        let reference = if self.inset_frame.is_empty() {
            self.frame
        } else {
            self.inset_frame
        };

        let is_divider = self.window_type() == WindowType::DockDivider;
        if freeform && !self.frame.is_empty() {
            self.constrain_freeform_frame(cx.min_visible_width, cx.min_visible_height);
        } else if is_divider {
            if cx.visible_or_animating {
                cx.divider.position_divider(&mut self.frame);
                self.content_frame = self.frame;
                if self.frame != self.last_frame {
                    self.moved_by_resize = true;
                }
            }
        } else {
            self.content_frame = self.content_frame.clamp_within(&reference);
            self.visible_frame = self.visible_frame.clamp_within(&reference);
            self.stable_frame = self.stable_frame.clamp_within(&reference);
        }

        self.insets.overscan = self.overscan_frame.insets_within(&reference).clamped();

        if is_divider {
            // Snap positions are computed like for a fullscreen window
            self.insets.stable = self.stable_frame.insets_within(&self.display_frame).clamped();
            self.insets.content = Insets::ZERO;
            self.insets.visible = Insets::ZERO;
        } else {
            self.insets.content = self.content_frame.insets_within(&reference);
            self.insets.visible = self.visible_frame.insets_within(&reference);
            self.insets.stable = self.stable_frame.insets_within(&reference).clamped();
        }

        if !self.inset_frame.is_empty() {
            self.content_frame = self.frame.inset_by(&self.insets.content);
            self.visible_frame = self.frame.inset_by(&self.insets.visible);
            self.stable_frame = self.frame.inset_by(&self.insets.stable);
        }

        self.compat_frame = self.frame;
        if self.enforce_size_compat {
            let inv = self.inv_global_scale;
            self.insets.overscan.scale(inv);
            self.insets.content.scale(inv);
            self.insets.visible.scale(inv);
            self.insets.stable.scale(inv);
            self.insets.outsets.scale(inv);
            self.compat_frame.scale(inv);
        }

        let wallpaper_offset_stale =
            self.is_wallpaper && (old_width != self.frame.width() || old_height != self.frame.height());

        trace!(
            "Resolving {} (requested {}x{}) in {}: frame={} ci={} vi={} si={} of={}",
            self.id,
            self.requested_width,
            self.requested_height,
            self.containing_frame,
            self.frame,
            self.insets.content,
            self.insets.visible,
            self.insets.stable,
            self.insets.outsets
        );

        FrameOutcome::Resolved { wallpaper_offset_stale }
    }

    /// Size the frame from the layout attributes and place it with gravity
    /// inside the containing frame, then keep it on the display.
    pub fn apply_gravity_and_update_frame(&mut self, task: Option<&Task>) {
        let pw = self.containing_frame.width();
        let ph = self.containing_frame.height();

        let mut w = self.resolve_dimension(self.attrs.width, self.requested_width, pw);
        let mut h = self.resolve_dimension(self.attrs.height, self.requested_height, ph);

        let (x, y) = if self.enforce_size_compat {
            (self.attrs.x as f32 * self.global_scale, self.attrs.y as f32 * self.global_scale)
        } else {
            (self.attrs.x as f32, self.attrs.y as f32)
        };

        if task.is_some_and(|t| !t.is_fullscreen()) {
            w = w.min(pw);
            h = h.min(ph);
        }

        self.frame = self.attrs.gravity.apply(
            w,
            h,
            &self.containing_frame,
            (x + self.attrs.horizontal_margin * pw as f32) as i32,
            (y + self.attrs.vertical_margin * ph as f32) as i32,
        );
        self.attrs.gravity.apply_display(&self.display_frame, &mut self.frame);
    }

    fn resolve_dimension(&self, dimension: LayoutDimension, requested: i32, parent: i32) -> i32 {
        let size = if self.attrs.flags.contains(AttrFlags::SCALED) {
            match dimension {
                LayoutDimension::Exact(px) if px >= 0 => px,
                _ => return parent,
            }
        } else {
            match dimension {
                LayoutDimension::MatchParent => return parent,
                _ => requested,
            }
        };
        if self.enforce_size_compat {
            (size as f32 * self.global_scale + 0.5) as i32
        } else {
            size
        }
    }

    /// Keep a freeform frame inside the content area with at least the
    /// minimum visible size reachable, then make it the content frame.
    fn constrain_freeform_frame(&mut self, min_visible_width: i32, min_visible_height: i32) {
        let content = self.content_frame;
        let height = self.frame.height().min(content.height());
        let width = content.width().min(self.frame.width());
        let top = content
            .top
            .max(self.frame.top.min(content.bottom - min_visible_height));
        let left = (content.left + min_visible_width - width)
            .max(self.frame.left.min(content.right - min_visible_width));

        self.frame = Rect::from_xywh(left, top, width, height);
        self.content_frame = self.frame;
        self.visible_frame = self.frame;
        self.stable_frame = self.frame;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::container::TaskMode;
    use crate::wm::gravity::Gravity;
    use crate::wm::test_support::app_window;
    use pretty_assertions::assert_eq;

    const SCREEN: Rect = Rect::new(0, 0, 1080, 1920);

    fn context<'a>(task: Option<&'a Task>, divider: &'a DividerController) -> FrameContext<'a> {
        FrameContext {
            task,
            frozen_bounds: None,
            ime_obscuring: false,
            divider,
            visible_or_animating: false,
            min_visible_width: 48,
            min_visible_height: 32,
        }
    }

    fn assert_clamped_insets_non_negative(win: &Window) {
        for insets in [win.insets.overscan, win.insets.stable, win.insets.outsets] {
            assert!(insets.left >= 0 && insets.top >= 0 && insets.right >= 0 && insets.bottom >= 0, "{insets}");
        }
    }

    #[test]
    fn test_fullscreen_window_fills_containing_frame() {
        let divider = DividerController::default();
        let mut win = app_window(1, WindowType::Application);
        win.set_requested_size(1080, 1920);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.content = Rect::new(0, 75, 1080, 1776);
        frames.visible = Rect::new(0, 75, 1080, 1776);
        frames.stable = Rect::new(0, 75, 1080, 1776);

        let outcome = win.compute_frame(&frames, &context(None, &divider));

        assert_eq!(outcome, FrameOutcome::Resolved { wallpaper_offset_stale: false });
        assert_eq!(win.containing_frame, SCREEN);
        assert_eq!(win.frame, SCREEN);
        assert_eq!(win.compat_frame, SCREEN);
        assert_eq!(win.insets.overscan, Insets::ZERO);
        assert_eq!(win.insets.content, Insets::new(0, 75, 0, 144));
        assert_eq!(win.insets.visible, Insets::new(0, 75, 0, 144));
        assert_eq!(win.insets.stable, Insets::new(0, 75, 0, 144));
        assert_eq!(win.insets.outsets, Insets::ZERO);
        assert!(win.content_changed);
    }

    #[test]
    fn test_overscan_and_outsets() {
        let divider = DividerController::default();
        let mut win = app_window(1, WindowType::Application);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.overscan = Rect::new(10, 20, 1070, 1900);
        frames.outset = Some(Rect::new(-5, 0, 1090, 1930));
        win.compute_frame(&frames, &context(None, &divider));

        assert_eq!(win.insets.overscan, Insets::new(10, 20, 10, 20));
        assert_eq!(win.insets.outsets, Insets::new(5, 0, 10, 10));
        assert_clamped_insets_non_negative(&win);
    }

    #[test]
    fn test_inset_override_replay() {
        let divider = DividerController::default();
        let mut task = Task::new(Rect::new(0, 0, 500, 500), TaskMode::Docked);
        task.temp_inset_bounds = Some(Rect::new(0, 0, 600, 600));
        let mut win = app_window(1, WindowType::Application);
        win.attrs.width = LayoutDimension::Exact(500);
        win.attrs.height = LayoutDimension::Exact(500);
        win.set_requested_size(500, 500);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.content = Rect::new(0, 0, 550, 550);
        frames.visible = frames.content;
        win.compute_frame(&frames, &context(Some(&task), &divider));

        // Insets are taken against the override bounds, then replayed on the frame
        assert_eq!(win.frame, Rect::new(0, 0, 500, 500));
        assert_eq!(win.insets.content, Insets::new(0, 0, 50, 50));
        assert_eq!(win.content_frame, Rect::new(0, 0, 450, 450));
        assert_eq!(win.visible_frame, Rect::new(0, 0, 450, 450));
        assert_clamped_insets_non_negative(&win);
    }

    #[test]
    fn test_content_insets_may_go_negative() {
        let divider = DividerController::default();
        let mut task = Task::new(Rect::new(0, 0, 500, 500), TaskMode::Freeform);
        task.temp_inset_bounds = Some(Rect::new(100, 100, 400, 400));
        let mut win = app_window(1, WindowType::Application);
        win.attrs.width = LayoutDimension::Exact(500);
        win.attrs.height = LayoutDimension::Exact(500);
        win.set_requested_size(500, 500);

        win.compute_frame(&LayoutFrames::uniform(SCREEN), &context(Some(&task), &divider));

        // The frame reaches past the override bounds on every side
        assert_eq!(win.frame, Rect::new(0, 0, 500, 500));
        assert_eq!(win.insets.content, Insets::new(-100, -100, -100, -100));
        assert_eq!(win.insets.visible, Insets::new(-100, -100, -100, -100));
        assert_eq!(win.insets.stable, Insets::ZERO);
        assert_eq!(win.content_frame, Rect::new(-100, -100, 600, 600));
        assert_clamped_insets_non_negative(&win);
    }

    #[test]
    fn test_freeform_frame_keeps_minimum_visible() {
        let divider = DividerController::default();
        let task = Task::new(Rect::new(2000, 100, 2300, 400), TaskMode::Freeform);
        let mut win = app_window(1, WindowType::Application);
        win.set_requested_size(300, 300);
        win.attrs.width = LayoutDimension::Exact(300);
        win.attrs.height = LayoutDimension::Exact(300);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.content = Rect::new(0, 0, 400, 1920);

        let mut cx = context(Some(&task), &divider);
        // 48dp at 1.5x density
        cx.min_visible_width = 72;
        cx.min_visible_height = 48;
        win.compute_frame(&frames, &cx);

        let visible_width = win.frame.right.min(frames.content.right) - win.frame.left.max(frames.content.left);
        assert!(visible_width >= 72, "frame {}", win.frame);
        assert_eq!(win.frame, Rect::new(328, 100, 628, 400));
        assert_eq!(win.content_frame, win.frame);
        assert_eq!(win.visible_frame, win.frame);
        assert_eq!(win.stable_frame, win.frame);
    }

    #[test]
    fn test_freeform_frame_left_of_content() {
        let divider = DividerController::default();
        let task = Task::new(Rect::new(-900, 0, -600, 300), TaskMode::Freeform);
        let mut win = app_window(1, WindowType::Application);
        win.attrs.width = LayoutDimension::Exact(300);
        win.attrs.height = LayoutDimension::Exact(300);
        win.set_requested_size(300, 300);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.content = Rect::new(0, 0, 400, 1920);
        let mut cx = context(Some(&task), &divider);
        cx.min_visible_width = 72;
        win.compute_frame(&frames, &cx);

        assert_eq!(win.frame.left, 72 - 300);
        assert_eq!(win.frame.right, 72);
    }

    #[test]
    fn test_freeform_task_without_bounds_uses_content_frame() {
        let divider = DividerController::default();
        let task = Task::new(Rect::EMPTY, TaskMode::Freeform);
        let mut win = app_window(1, WindowType::Application);
        win.set_requested_size(1080, 1920);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.content = Rect::new(0, 75, 1080, 1800);
        win.compute_frame(&frames, &context(Some(&task), &divider));

        assert_eq!(win.containing_frame, frames.content);
        assert_eq!(win.display_frame, frames.content);
        assert_eq!(win.frame, Rect::new(0, 75, 1080, 1800));
        assert_eq!(win.content_frame, win.frame);
    }

    #[test]
    fn test_gravity_and_margins() {
        let divider = DividerController::default();
        let mut win = app_window(1, WindowType::Toast);
        win.attrs.width = LayoutDimension::WrapContent;
        win.attrs.height = LayoutDimension::WrapContent;
        win.attrs.gravity = Gravity::BOTTOM | Gravity::CENTER_HORIZONTAL;
        win.attrs.y = 100;
        win.attrs.vertical_margin = 0.1;
        win.set_requested_size(400, 100);

        win.compute_frame(&LayoutFrames::uniform(SCREEN), &context(None, &divider));

        // 100 + 0.1 * 1920 = 292 up from the bottom
        assert_eq!(win.frame, Rect::new(340, 1528, 740, 1628));
    }

    #[test]
    fn test_non_fullscreen_task_clamps_size() {
        let divider = DividerController::default();
        let task = Task::new(Rect::new(0, 0, 540, 960), TaskMode::Docked);
        let mut win = app_window(1, WindowType::Application);
        win.attrs.width = LayoutDimension::Exact(1000);
        win.attrs.height = LayoutDimension::Exact(1000);
        win.set_requested_size(1000, 1000);

        win.compute_frame(&LayoutFrames::uniform(SCREEN), &context(Some(&task), &divider));
        assert_eq!(win.frame, Rect::new(0, 0, 540, 960));
    }

    #[test]
    fn test_frozen_bounds_keep_size_and_translate() {
        let divider = DividerController::default();
        let task = Task::new(Rect::new(100, 200, 700, 1000), TaskMode::Docked);
        let mut win = app_window(1, WindowType::Application);

        let mut cx = context(Some(&task), &divider);
        cx.frozen_bounds = Some(Rect::new(0, 0, 400, 500));
        win.compute_frame(&LayoutFrames::uniform(SCREEN), &cx);

        assert_eq!(win.containing_frame, Rect::new(100, 200, 500, 700));
        assert_eq!(win.frame, Rect::new(100, 200, 500, 700));
    }

    #[test]
    fn test_ime_obscuring_shifts_containing_frame() {
        let divider = DividerController::default();
        let task = Task::new(Rect::new(0, 1000, 1080, 1800), TaskMode::Docked);
        let mut win = app_window(1, WindowType::Application);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.content = Rect::new(0, 0, 1080, 1200);
        let mut cx = context(Some(&task), &divider);
        cx.ime_obscuring = true;
        win.compute_frame(&frames, &cx);

        assert_eq!(win.containing_frame, Rect::new(0, 400, 1080, 1200));
    }

    #[test]
    fn test_child_in_parent_frame_ignores_task() {
        let divider = DividerController::default();
        let task = Task::new(Rect::new(0, 0, 540, 960), TaskMode::Docked);
        let mut win = app_window(2, WindowType::Application);
        win.parent = Some(crate::wm::window::WindowId(1));
        win.attrs.private_flags |= PrivateFlags::LAYOUT_CHILD_WINDOW_IN_PARENT_FRAME;

        let parent = Rect::new(0, 0, 300, 300);
        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.parent = parent;
        win.compute_frame(&frames, &context(Some(&task), &divider));

        assert_eq!(win.containing_frame, parent);
    }

    #[test]
    fn test_divider_takes_controller_position() {
        let divider = DividerController {
            resizing: false,
            position: Some(Rect::new(0, 940, 1080, 980)),
        };
        let mut win = app_window(1, WindowType::DockDivider);
        win.last_frame = Rect::new(0, 900, 1080, 940);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.stable = Rect::new(0, 75, 1080, 1920);
        let mut cx = context(None, &divider);
        cx.visible_or_animating = true;
        win.compute_frame(&frames, &cx);

        assert_eq!(win.frame, Rect::new(0, 940, 1080, 980));
        assert!(win.moved_by_resize);
        assert_eq!(win.insets.content, Insets::ZERO);
        assert_eq!(win.insets.visible, Insets::ZERO);
        assert_eq!(win.insets.stable, Insets::new(0, 75, 0, 0));
    }

    #[test]
    fn test_compat_scale_round_trip() {
        let divider = DividerController::default();
        let mut win = app_window(1, WindowType::Application);
        win.enforce_size_compat = true;
        win.prelayout(1.5);

        let mut frames = LayoutFrames::uniform(SCREEN);
        frames.content = Rect::new(0, 75, 1080, 1776);
        frames.visible = frames.content;
        frames.stable = frames.content;
        win.compute_frame(&frames, &context(None, &divider));

        let on_screen = Insets::new(0, 75, 0, 144);
        assert_eq!(win.insets.content, Insets::new(0, 50, 0, 96));
        let back = win.insets.content.scaled(win.global_scale);
        for (got, want) in [(back.top, on_screen.top), (back.bottom, on_screen.bottom)] {
            assert!((got - want).abs() <= 1, "{got} vs {want}");
        }
        assert_eq!(win.compat_frame, Rect::new(0, 0, 720, 1280));
        assert_eq!(win.frame, SCREEN);
    }

    #[test]
    fn test_compat_scale_and_surface_scale_are_independent() {
        let divider = DividerController::default();
        let mut win = app_window(1, WindowType::Application);
        win.enforce_size_compat = true;
        win.attrs.flags |= AttrFlags::SCALED;
        win.attrs.width = LayoutDimension::Exact(400);
        win.attrs.height = LayoutDimension::Exact(400);
        win.prelayout(2.0);
        win.set_window_scale(200, 400);

        win.compute_frame(&LayoutFrames::uniform(SCREEN), &context(None, &divider));

        // Compat scale sizes the frame, the surface scale is left alone
        assert_eq!(win.frame, Rect::new(0, 0, 800, 800));
        assert_eq!(win.compat_frame, Rect::new(0, 0, 400, 400));
        assert_eq!((win.h_scale, win.v_scale), (2.0, 1.0));
    }

    #[test]
    fn test_replacement_suppresses_resolution() {
        let divider = DividerController::default();
        let mut win = app_window(1, WindowType::Application);
        win.compute_frame(&LayoutFrames::uniform(SCREEN), &context(None, &divider));
        win.snapshot_last_frame();
        win.snapshot_last_insets();

        win.set_replacing(false);
        win.exiting = true;
        let (frame, insets, last_frame, last_insets) = (win.frame, win.insets, win.last_frame, win.last_insets);

        let mut frames = LayoutFrames::uniform(Rect::new(0, 0, 500, 500));
        frames.content = Rect::new(0, 50, 500, 450);
        let outcome = win.compute_frame(&frames, &context(None, &divider));

        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(win.frame, frame);
        assert_eq!(win.insets, insets);
        assert_eq!(win.last_frame, last_frame);
        assert_eq!(win.last_insets, last_insets);
    }

    #[test]
    fn test_wallpaper_resize_flags_offsets() {
        let divider = DividerController::default();
        let mut win = app_window(1, WindowType::Wallpaper);

        let outcome = win.compute_frame(&LayoutFrames::uniform(SCREEN), &context(None, &divider));
        assert_eq!(outcome, FrameOutcome::Resolved { wallpaper_offset_stale: true });

        let outcome = win.compute_frame(&LayoutFrames::uniform(SCREEN), &context(None, &divider));
        assert_eq!(outcome, FrameOutcome::Resolved { wallpaper_offset_stale: false });
    }
}
