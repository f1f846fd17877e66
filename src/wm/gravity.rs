//! Gravity Module
//!
//! Anchors a sized rectangle inside a container and keeps it on the display.
//! Bits follow the classic axis encoding: each axis has SPECIFIED, PULL_BEFORE,
//! PULL_AFTER and CLIP bits, with the vertical axis shifted by four.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::shared::Rect;

const AXIS_SPECIFIED: u32 = 0x0001;
const AXIS_PULL_BEFORE: u32 = 0x0002;
const AXIS_PULL_AFTER: u32 = 0x0004;
const AXIS_CLIP: u32 = 0x0008;
const AXIS_X_SHIFT: u32 = 0;
const AXIS_Y_SHIFT: u32 = 4;

bitflags! {
    /// Window gravity
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Gravity: u32 {
        const CENTER_HORIZONTAL   = AXIS_SPECIFIED << AXIS_X_SHIFT;
        const LEFT                = (AXIS_PULL_BEFORE | AXIS_SPECIFIED) << AXIS_X_SHIFT;
        const RIGHT               = (AXIS_PULL_AFTER | AXIS_SPECIFIED) << AXIS_X_SHIFT;
        const FILL_HORIZONTAL     = Self::LEFT.bits() | Self::RIGHT.bits();
        const CLIP_HORIZONTAL     = AXIS_CLIP << AXIS_X_SHIFT;

        const CENTER_VERTICAL     = AXIS_SPECIFIED << AXIS_Y_SHIFT;
        const TOP                 = (AXIS_PULL_BEFORE | AXIS_SPECIFIED) << AXIS_Y_SHIFT;
        const BOTTOM              = (AXIS_PULL_AFTER | AXIS_SPECIFIED) << AXIS_Y_SHIFT;
        const FILL_VERTICAL       = Self::TOP.bits() | Self::BOTTOM.bits();
        const CLIP_VERTICAL       = AXIS_CLIP << AXIS_Y_SHIFT;

        const CENTER              = Self::CENTER_HORIZONTAL.bits() | Self::CENTER_VERTICAL.bits();
        const FILL                = Self::FILL_HORIZONTAL.bits() | Self::FILL_VERTICAL.bits();

        /// Clamp to the display instead of shifting back onto it
        const DISPLAY_CLIP_HORIZONTAL = 0x0100_0000;
        const DISPLAY_CLIP_VERTICAL   = 0x1000_0000;
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::TOP | Self::LEFT
    }
}

/// Where a span sits along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisPull {
    Center,
    Before,
    After,
    Fill,
}

impl Gravity {
    fn axis_pull(self, shift: u32) -> AxisPull {
        match (self.bits() >> shift) & (AXIS_PULL_BEFORE | AXIS_PULL_AFTER) {
            0 => AxisPull::Center,
            AXIS_PULL_BEFORE => AxisPull::Before,
            AXIS_PULL_AFTER => AxisPull::After,
            _ => AxisPull::Fill,
        }
    }

    fn axis_clips(self, shift: u32) -> bool {
        (self.bits() >> shift) & AXIS_CLIP == AXIS_CLIP
    }

    /// Place a `w`×`h` rectangle inside `container`.
    ///
    /// `x_adj`/`y_adj` push the rectangle away from the anchored edge (and
    /// shift a centered rectangle).
    pub fn apply(self, w: i32, h: i32, container: &Rect, x_adj: i32, y_adj: i32) -> Rect {
        let (left, right) = place_axis(
            self.axis_pull(AXIS_X_SHIFT),
            self.axis_clips(AXIS_X_SHIFT),
            w,
            container.left,
            container.right,
            x_adj,
        );
        let (top, bottom) = place_axis(
            self.axis_pull(AXIS_Y_SHIFT),
            self.axis_clips(AXIS_Y_SHIFT),
            h,
            container.top,
            container.bottom,
            y_adj,
        );
        Rect::new(left, top, right, bottom)
    }

    /// Keep `rect` from leaving `display`.
    ///
    /// A rectangle hanging off one edge is shifted back; one larger than the
    /// display is clamped to it. With the DISPLAY_CLIP bits set the edges are
    /// clamped directly.
    pub fn apply_display(self, display: &Rect, rect: &mut Rect) {
        (rect.top, rect.bottom) = fit_axis(
            self.contains(Self::DISPLAY_CLIP_VERTICAL),
            rect.top,
            rect.bottom,
            display.top,
            display.bottom,
        );
        (rect.left, rect.right) = fit_axis(
            self.contains(Self::DISPLAY_CLIP_HORIZONTAL),
            rect.left,
            rect.right,
            display.left,
            display.right,
        );
    }
}

fn place_axis(pull: AxisPull, clip: bool, size: i32, start: i32, end: i32, adj: i32) -> (i32, i32) {
    match pull {
        AxisPull::Center => {
            let mut lo = start + (end - start - size) / 2 + adj;
            let mut hi = lo + size;
            if clip {
                lo = lo.max(start);
                hi = hi.min(end);
            }
            (lo, hi)
        }
        AxisPull::Before => {
            let lo = start + adj;
            let mut hi = lo + size;
            if clip {
                hi = hi.min(end);
            }
            (lo, hi)
        }
        AxisPull::After => {
            let hi = end - adj;
            let mut lo = hi - size;
            if clip {
                lo = lo.max(start);
            }
            (lo, hi)
        }
        AxisPull::Fill => (start + adj, end + adj),
    }
}

fn fit_axis(clip: bool, lo: i32, hi: i32, start: i32, end: i32) -> (i32, i32) {
    if clip {
        return (lo.max(start), hi.min(end));
    }

    let off = if lo < start {
        start - lo
    } else if hi > end {
        end - hi
    } else {
        0
    };

    if off == 0 {
        (lo, hi)
    } else if hi - lo > end - start {
        (start, end)
    } else {
        (lo + off, hi + off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DISPLAY: Rect = Rect::new(0, 0, 1080, 1920);

    #[test]
    fn test_top_left_with_offsets() {
        let r = Gravity::default().apply(200, 100, &DISPLAY, 10, 20);
        assert_eq!(r, Rect::new(10, 20, 210, 120));
    }

    #[test]
    fn test_bottom_right_pulls_from_far_edges() {
        let r = (Gravity::BOTTOM | Gravity::RIGHT).apply(200, 100, &DISPLAY, 10, 20);
        assert_eq!(r, Rect::new(870, 1800, 1070, 1900));
    }

    #[test]
    fn test_center_and_fill() {
        let r = Gravity::CENTER.apply(80, 20, &Rect::new(0, 0, 100, 100), 0, 0);
        assert_eq!(r, Rect::new(10, 40, 90, 60));

        let r = Gravity::FILL.apply(5, 5, &Rect::new(0, 0, 100, 100), 3, 0);
        assert_eq!(r, Rect::new(3, 0, 103, 100));
    }

    #[test]
    fn test_axis_clip_limits_to_container() {
        let g = Gravity::LEFT | Gravity::TOP | Gravity::CLIP_HORIZONTAL;
        let r = g.apply(300, 50, &Rect::new(0, 0, 100, 100), 0, 0);
        assert_eq!(r, Rect::new(0, 0, 100, 50));
    }

    #[test]
    fn test_apply_display_shifts_back_on_screen() {
        let mut r = Rect::new(1000, -30, 1200, 70);
        Gravity::default().apply_display(&DISPLAY, &mut r);
        assert_eq!(r, Rect::new(880, 0, 1080, 100));
    }

    #[test]
    fn test_apply_display_clamps_oversized_and_clip_flags() {
        let mut r = Rect::new(-10, 0, 2000, 100);
        Gravity::default().apply_display(&DISPLAY, &mut r);
        assert_eq!(r, Rect::new(0, 0, 1080, 100));

        let mut r = Rect::new(1000, 0, 1200, 100);
        (Gravity::default() | Gravity::DISPLAY_CLIP_HORIZONTAL).apply_display(&DISPLAY, &mut r);
        assert_eq!(r, Rect::new(1000, 0, 1080, 100));
    }
}
