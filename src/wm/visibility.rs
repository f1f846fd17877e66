//! Visibility Module
//!
//! Read-only predicates answering "is this window showing?" for focus, input,
//! layout, animation and power management. Each caller tolerates a slightly
//! different set of in-transition states, so the predicates overlap on
//! purpose and must not be merged. Nothing here is cached.

use crate::wm::container::{AppWindowToken, TokenState};
use crate::wm::window::Window;
use crate::wm::window_flags::{AttrFlags, PixelFormat, ViewVisibility, WindowType};

/// Collaborator state the predicates consult
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityContext<'a> {
    /// App token owning the window, if it is an application window
    pub app: Option<&'a AppWindowToken>,
    /// State of the root token of the window's hierarchy
    pub root: TokenState,
    /// An app transition has been prepared and not yet started
    pub transition_set: bool,
}

/// Visibility queries for one window
#[derive(Debug, Clone, Copy)]
pub struct VisibilityOracle<'a> {
    window: &'a Window,
    cx: VisibilityContext<'a>,
}

impl<'a> VisibilityOracle<'a> {
    pub fn new(window: &'a Window, cx: VisibilityContext<'a>) -> Self {
        Self { window, cx }
    }

    fn app_hidden_requested(&self) -> bool {
        self.cx.app.is_some_and(|app| app.hidden_requested)
    }

    fn app_animating(&self) -> bool {
        self.cx.app.is_some_and(|app| app.animating)
    }

    fn view_visible(&self) -> bool {
        self.window.view_visibility == ViewVisibility::Visible
    }

    fn waiting_for_transition(&self) -> bool {
        self.cx.root.waiting_to_show && self.cx.transition_set
    }

    /// Minimal check without the app token
    pub fn is_visible_unchecked(&self) -> bool {
        let w = self.window;
        w.has_surface
            && w.policy_visible
            && !w.attached_hidden
            && !w.exiting
            && !w.destroying
            && (!w.is_wallpaper || w.wallpaper_visible)
    }

    pub fn is_visible(&self) -> bool {
        !self.app_hidden_requested() && self.is_visible_unchecked()
    }

    /// Like [`Self::is_visible`], but also counts a window hidden behind the keyguard
    pub fn is_visible_or_behind_keyguard(&self) -> bool {
        if self.waiting_for_transition() {
            return false;
        }
        let w = self.window;
        let requested = match self.cx.app {
            None => w.policy_visible,
            Some(app) => !app.hidden_requested,
        };
        w.has_surface
            && !w.destroying
            && !w.exiting
            && requested
            && ((!w.attached_hidden && self.view_visible() && !self.cx.root.hidden)
                || w.animating
                || self.app_animating())
    }

    /// Visible ignoring a hidden-requested app token that is still animating
    pub fn is_win_visible(&self) -> bool {
        let app_ok = match self.cx.app {
            None => true,
            Some(app) => !app.hidden_requested || app.animating,
        };
        app_ok && self.is_visible_unchecked()
    }

    /// Follows the current hidden state of the token, not the requested one
    pub fn is_visible_now(&self) -> bool {
        (!self.cx.root.hidden || self.window.window_type() == WindowType::ApplicationStarting)
            && self.is_visible_unchecked()
    }

    /// Also visible between being added and the first relayout
    pub fn is_visible_or_adding(&self) -> bool {
        let w = self.window;
        (w.has_surface || (!w.relayout_called && self.view_visible()))
            && w.policy_visible
            && !w.attached_hidden
            && !self.app_hidden_requested()
            && !w.exiting
            && !w.destroying
    }

    pub fn is_on_screen(&self) -> bool {
        self.window.policy_visible && self.is_on_screen_ignoring_keyguard()
    }

    pub fn is_on_screen_ignoring_keyguard(&self) -> bool {
        let w = self.window;
        if !w.has_surface || w.destroying {
            return false;
        }
        match self.cx.app {
            None => !w.attached_hidden || w.animating,
            Some(app) => (!w.attached_hidden && !app.hidden_requested) || w.animating || app.animating,
        }
    }

    pub fn is_ready_for_display(&self) -> bool {
        if self.waiting_for_transition() {
            return false;
        }
        let w = self.window;
        w.has_surface
            && w.policy_visible
            && !w.destroying
            && ((!w.attached_hidden && self.view_visible() && !self.cx.root.hidden)
                || w.animating
                || self.app_animating())
    }

    pub fn is_displayed(&self) -> bool {
        let w = self.window;
        self.is_drawn()
            && w.policy_visible
            && ((!w.attached_hidden && !self.app_hidden_requested()) || w.animating || self.app_animating())
    }

    pub fn is_drawn(&self) -> bool {
        let w = self.window;
        w.has_surface && !w.destroying && w.draw_state.is_drawn()
    }

    pub fn is_draw_finished(&self) -> bool {
        let w = self.window;
        w.has_surface && !w.destroying && w.draw_state.is_draw_finished()
    }

    pub fn has_drawn(&self) -> bool {
        self.window.draw_state == crate::wm::draw_state::DrawState::HasDrawn
    }

    pub fn is_animating(&self) -> bool {
        self.window.animating || self.app_animating()
    }

    pub fn is_gone_for_layout(&self) -> bool {
        let w = self.window;
        let token_hidden = match self.cx.app {
            None => self.cx.root.hidden,
            Some(app) => app.hidden_requested || app.hidden,
        };
        w.view_visibility == ViewVisibility::Gone
            || !w.relayout_called
            || token_hidden
            || w.attached_hidden
            || (w.exiting && !self.is_animating())
            || w.destroying
    }

    /// Whether the window wants key events
    pub fn can_receive_keys(&self) -> bool {
        self.is_visible_or_adding()
            && self.view_visible()
            && !self.window.attrs.flags.contains(AttrFlags::NOT_FOCUSABLE)
            && self.cx.app.map_or(true, |app| app.windows_focusable)
    }

    /// Could this window take a drag and drop
    pub fn is_potential_drag_target(&self) -> bool {
        self.is_visible_now() && !self.window.removed && self.window.has_input_channel()
    }

    /// Opaque and fully drawn, so it may obscure what is behind it
    pub fn is_opaque_drawn(&self) -> bool {
        let w = self.window;
        (w.attrs.format == PixelFormat::Opaque || w.window_type() == WindowType::Wallpaper)
            && self.is_drawn()
            && !w.animating
            && !self.app_animating()
    }

    /// The frame origin moved in this layout pass.
    ///
    /// `parent_moved` is the same answer for the parent window; a child that
    /// only moved with its parent does not count.
    pub fn has_moved(&self, parent_moved: bool) -> bool {
        let w = self.window;
        w.has_surface
            && (w.content_changed || w.moved_by_resize)
            && !w.exiting
            && !w.last_hidden
            && (w.frame.top != w.last_frame.top || w.frame.left != w.last_frame.left)
            && !parent_moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Rect;
    use crate::wm::draw_state::DrawState;
    use crate::wm::test_support::app_window;

    fn shown_window() -> Window {
        let mut win = app_window(1, WindowType::Application);
        win.has_surface = true;
        win.relayout_called = true;
        win.draw_state = DrawState::HasDrawn;
        win
    }

    fn oracle<'a>(win: &'a Window, app: Option<&'a AppWindowToken>) -> VisibilityOracle<'a> {
        VisibilityOracle::new(
            win,
            VisibilityContext {
                app,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_shown_window_passes_every_predicate() {
        let win = shown_window();
        let app = AppWindowToken::default();
        let o = oracle(&win, Some(&app));

        assert!(o.is_visible());
        assert!(o.is_visible_or_behind_keyguard());
        assert!(o.is_visible_now());
        assert!(o.is_visible_or_adding());
        assert!(o.is_on_screen());
        assert!(o.is_ready_for_display());
        assert!(o.is_displayed());
        assert!(o.can_receive_keys());
        assert!(!o.is_gone_for_layout());
    }

    #[test]
    fn test_destroying_is_always_gone() {
        let mut win = shown_window();
        win.destroying = true;
        win.animating = true;
        let mut app = AppWindowToken::default();
        app.animating = true;

        for app in [None, Some(&app)] {
            let o = oracle(&win, app);
            assert!(o.is_gone_for_layout());
            assert!(!o.is_visible());
            assert!(!o.is_drawn());
            assert!(!o.is_on_screen_ignoring_keyguard());
        }
    }

    #[test]
    fn test_hidden_requested_app_hides_window() {
        let win = shown_window();
        let mut app = AppWindowToken::default();
        app.hidden_requested = true;
        let o = oracle(&win, Some(&app));

        assert!(!o.is_visible());
        assert!(!o.is_win_visible());
        assert!(o.is_visible_unchecked());
        assert!(o.is_gone_for_layout());

        app.animating = true;
        let o = oracle(&win, Some(&app));
        assert!(o.is_win_visible());
        assert!(o.is_on_screen_ignoring_keyguard());
    }

    #[test]
    fn test_wallpaper_needs_wallpaper_visibility() {
        let mut win = shown_window();
        win.is_wallpaper = true;
        assert!(!oracle(&win, None).is_visible_unchecked());
        win.wallpaper_visible = true;
        assert!(oracle(&win, None).is_visible_unchecked());
    }

    #[test]
    fn test_transition_guard() {
        let win = shown_window();
        let cx = VisibilityContext {
            app: None,
            root: TokenState {
                hidden: false,
                waiting_to_show: true,
            },
            transition_set: true,
        };
        let o = VisibilityOracle::new(&win, cx);
        assert!(!o.is_visible_or_behind_keyguard());
        assert!(!o.is_ready_for_display());
        assert!(o.is_visible());

        let o = VisibilityOracle::new(&win, VisibilityContext { transition_set: false, ..cx });
        assert!(o.is_ready_for_display());
    }

    #[test]
    fn test_starting_window_ignores_hidden_root() {
        let mut win = shown_window();
        let cx = VisibilityContext {
            app: None,
            root: TokenState {
                hidden: true,
                waiting_to_show: false,
            },
            transition_set: false,
        };
        assert!(!VisibilityOracle::new(&win, cx).is_visible_now());
        win.attrs.window_type = WindowType::ApplicationStarting;
        assert!(VisibilityOracle::new(&win, cx).is_visible_now());
    }

    #[test]
    fn test_adding_window_before_first_relayout() {
        let mut win = app_window(1, WindowType::Application);
        let o = oracle(&win, None);
        assert!(o.is_visible_or_adding());
        assert!(o.is_gone_for_layout());

        win.relayout_called = true;
        assert!(!oracle(&win, None).is_visible_or_adding());
    }

    #[test]
    fn test_exiting_window_gone_unless_animating() {
        let mut win = shown_window();
        win.exiting = true;
        assert!(oracle(&win, None).is_gone_for_layout());
        win.animating = true;
        assert!(!oracle(&win, None).is_gone_for_layout());
    }

    #[test]
    fn test_drawn_implies_draw_finished() {
        let mut win = shown_window();
        for state in [
            DrawState::NoSurface,
            DrawState::DrawPending,
            DrawState::CommitDrawPending,
            DrawState::ReadyToShow,
            DrawState::HasDrawn,
        ] {
            win.draw_state = state;
            let o = oracle(&win, None);
            assert!(!o.is_drawn() || o.is_draw_finished());
        }
    }

    #[test]
    fn test_keys_need_focusable_window_and_app() {
        let mut win = shown_window();
        let mut app = AppWindowToken::default();
        app.windows_focusable = false;
        assert!(!oracle(&win, Some(&app)).can_receive_keys());

        win.attrs.flags |= AttrFlags::NOT_FOCUSABLE;
        assert!(!oracle(&win, None).can_receive_keys());
    }

    #[test]
    fn test_opaque_drawn() {
        let mut win = shown_window();
        assert!(!oracle(&win, None).is_opaque_drawn());
        win.attrs.format = PixelFormat::Opaque;
        assert!(oracle(&win, None).is_opaque_drawn());
        win.animating = true;
        assert!(!oracle(&win, None).is_opaque_drawn());
    }

    #[test]
    fn test_has_moved() {
        let mut win = shown_window();
        win.last_frame = Rect::new(0, 0, 100, 100);
        win.frame = Rect::new(10, 0, 110, 100);
        assert!(!oracle(&win, None).has_moved(false));

        win.content_changed = true;
        assert!(oracle(&win, None).has_moved(false));
        assert!(!oracle(&win, None).has_moved(true));
    }
}
