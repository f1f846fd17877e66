//! Move/Resize Module
//!
//! Tracks whether a window is being drag-resized, either by the user resizing
//! a freeform task or by the docked divider being moved.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::wm::container::Task;
use crate::wm::window::Window;

/// What is driving a drag resize
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragResizeMode {
    #[default]
    Freeform,
    DockedDivider,
}

/// Whether a window in `task` should be treated as drag-resizing.
///
/// Frozen bounds mean the app's layout size and the clip bounds can differ,
/// so the resize is simulated until they match again.
pub fn compute_drag_resizing(task: Option<&Task>, divider_resizing: bool, has_frozen_bounds: bool) -> bool {
    let Some(task) = task else {
        return false;
    };
    if task.drag_resizing {
        return true;
    }
    (divider_resizing || has_frozen_bounds) && !task.is_freeform() && !task.is_fullscreen()
}

pub fn resize_mode(drag_resizing: bool, divider_resizing: bool) -> DragResizeMode {
    if drag_resizing && divider_resizing {
        DragResizeMode::DockedDivider
    } else {
        DragResizeMode::Freeform
    }
}

impl Window {
    /// Recompute drag-resize state, returns whether it changed
    pub fn update_drag_resizing(&mut self, task: Option<&Task>, divider_resizing: bool, has_frozen_bounds: bool) -> bool {
        let resizing = compute_drag_resizing(task, divider_resizing, has_frozen_bounds);
        let changed = resizing != self.drag_resizing;
        self.drag_resizing = resizing;
        self.resize_mode = resize_mode(resizing, divider_resizing);
        if changed {
            debug!("{} drag resizing: {} ({:?})", self.id, resizing, self.resize_mode);
        }
        changed
    }

    /// Whether the next recompute would flip the drag-resize state
    pub fn is_drag_resize_changed(&self, task: Option<&Task>, divider_resizing: bool, has_frozen_bounds: bool) -> bool {
        self.drag_resizing != compute_drag_resizing(task, divider_resizing, has_frozen_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Rect;
    use crate::wm::container::TaskMode;

    fn task(mode: TaskMode) -> Task {
        Task::new(Rect::new(0, 0, 500, 800), mode)
    }

    #[test]
    fn test_no_task_never_resizes() {
        assert!(!compute_drag_resizing(None, true, true));
    }

    #[test]
    fn test_task_drag_resizing_wins() {
        let mut t = task(TaskMode::Fullscreen);
        t.drag_resizing = true;
        assert!(compute_drag_resizing(Some(&t), false, false));
    }

    #[test]
    fn test_divider_only_affects_docked_tasks() {
        assert!(compute_drag_resizing(Some(&task(TaskMode::Docked)), true, false));
        assert!(compute_drag_resizing(Some(&task(TaskMode::Docked)), false, true));
        assert!(!compute_drag_resizing(Some(&task(TaskMode::Freeform)), true, false));
        assert!(!compute_drag_resizing(Some(&task(TaskMode::Fullscreen)), true, true));
    }

    #[test]
    fn test_mode_follows_divider() {
        assert_eq!(resize_mode(true, true), DragResizeMode::DockedDivider);
        assert_eq!(resize_mode(true, false), DragResizeMode::Freeform);
        assert_eq!(resize_mode(false, true), DragResizeMode::Freeform);
    }
}
