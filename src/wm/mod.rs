//! Window Manager Module
//!
//! Owning registry of windows and of the collaborator state (tokens, tasks,
//! displays) they refer to by id. Every operation takes `&mut self`; callers
//! share the manager as a [`SharedWindowManager`] and hold its one lock for
//! layout, visibility queries and flag updates alike.

pub mod client;
pub mod container;
pub mod draw_state;
pub mod errors;
pub mod frame;
pub mod gravity;
pub mod input;
pub mod moveresize;
pub mod policy;
pub mod replacement;
pub mod stacking;
pub mod visibility;
pub mod window;
pub mod window_flags;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::shared::Rect;
use crate::wm::client::{ClientMessage, ClientQueue, Configuration, ResizeReport, WindowClient};
use crate::wm::container::{
    AppWindowToken, DisplayContent, DisplayId, DisplayInfo, DividerController, Task, TaskId, TokenId, WindowToken,
};
use crate::wm::draw_state::DrawState;
use crate::wm::errors::{Result, WmError};
use crate::wm::frame::{FrameContext, FrameOutcome, LayoutFrames};
use crate::wm::input::{ChannelId, InputDispatcher, InputRoutes};
use crate::wm::policy::{DefaultPolicy, WindowPolicy};
use crate::wm::visibility::{VisibilityContext, VisibilityOracle};
use crate::wm::window::{InsetsChanged, Window, WindowId, WindowParams};

/// The window manager behind its single lock
pub type SharedWindowManager = Arc<Mutex<WindowManager>>;

/// Collaborator state a window's layout depends on
struct LayoutInputs {
    task: Option<Task>,
    frozen_bounds: Option<Rect>,
    divider: DividerController,
    display: DisplayInfo,
}

pub struct WindowManager {
    windows: HashMap<WindowId, Window>,
    tokens: HashMap<TokenId, WindowToken>,
    tasks: HashMap<TaskId, Task>,
    displays: HashMap<DisplayId, DisplayContent>,
    clients: HashMap<WindowId, Arc<dyn WindowClient>>,
    policy: Box<dyn WindowPolicy>,
    input: Box<dyn InputDispatcher>,
    queue: ClientQueue,
    layout: LayoutConfig,
    /// Current input method window and the window it types into
    ime_window: Option<WindowId>,
    ime_target: Option<WindowId>,
    /// An app transition is prepared but has not started
    transition_set: bool,
    current_config: Configuration,
    /// Windows whose client went away, removed on the next pass
    pending_remove: Vec<WindowId>,
    /// A new layout pass was requested
    layout_needed: bool,
    next_window_id: u32,
}

impl WindowManager {
    /// Create a window manager with one default display
    pub fn new(layout: LayoutConfig, info: DisplayInfo) -> Self {
        let mut displays = HashMap::new();
        displays.insert(DisplayId::DEFAULT, DisplayContent::new(info));

        info!(
            "Window manager ready ({}x{} @ {}x density)",
            info.logical_width, info.logical_height, info.density
        );

        Self {
            windows: HashMap::new(),
            tokens: HashMap::new(),
            tasks: HashMap::new(),
            displays,
            clients: HashMap::new(),
            policy: Box::new(DefaultPolicy),
            input: Box::new(InputRoutes::new()),
            queue: ClientQueue::new(),
            layout,
            ime_window: None,
            ime_target: None,
            transition_set: false,
            current_config: Configuration {
                seq: 1,
                width: info.logical_width,
                height: info.logical_height,
                density_dpi: (info.density * 160.0) as u32,
            },
            pending_remove: Vec::new(),
            layout_needed: false,
            next_window_id: 1,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn WindowPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_input_dispatcher(mut self, input: Box<dyn InputDispatcher>) -> Self {
        self.input = input;
        self
    }

    pub fn into_shared(self) -> SharedWindowManager {
        Arc::new(Mutex::new(self))
    }

    pub(crate) fn client_queue_mut(&mut self) -> &mut ClientQueue {
        &mut self.queue
    }

    // Collaborator state

    pub fn add_display(&mut self, id: DisplayId, info: DisplayInfo) {
        self.displays.insert(id, DisplayContent::new(info));
    }

    pub fn display(&self, id: DisplayId) -> Result<&DisplayContent> {
        self.displays.get(&id).ok_or(WmError::UnknownDisplay(id))
    }

    pub fn display_mut(&mut self, id: DisplayId) -> Result<&mut DisplayContent> {
        self.displays.get_mut(&id).ok_or(WmError::UnknownDisplay(id))
    }

    pub fn add_task(&mut self, id: TaskId, task: Task) {
        self.tasks.insert(id, task);
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn add_token(&mut self, id: TokenId, token: WindowToken) {
        self.tokens.insert(id, token);
    }

    pub fn token(&self, id: TokenId) -> Result<&WindowToken> {
        self.tokens.get(&id).ok_or(WmError::UnknownToken(id))
    }

    pub fn token_mut(&mut self, id: TokenId) -> Result<&mut WindowToken> {
        self.tokens.get_mut(&id).ok_or(WmError::UnknownToken(id))
    }

    pub fn set_transition_set(&mut self, set: bool) {
        self.transition_set = set;
    }

    pub fn set_current_config(&mut self, config: Configuration) {
        self.current_config = config;
    }

    pub fn set_input_method(&mut self, window: Option<WindowId>, target: Option<WindowId>) {
        self.ime_window = window;
        self.ime_target = target;
    }

    /// Hide or show a token; windows attached to its windows follow
    pub fn set_token_hidden(&mut self, token: TokenId, hidden: bool) -> Result<()> {
        self.token_mut(token)?.state.hidden = hidden;
        let attached: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.token == token)
            .flat_map(|w| w.children.ids())
            .collect();
        for child in attached {
            if let Some(window) = self.windows.get_mut(&child) {
                window.attached_hidden = hidden;
            }
        }
        Ok(())
    }

    /// Consume the pending layout request
    pub fn take_layout_needed(&mut self) -> bool {
        std::mem::take(&mut self.layout_needed)
    }

    // Windows

    pub fn window(&self, id: WindowId) -> Result<&Window> {
        self.windows.get(&id).ok_or(WmError::UnknownWindow(id))
    }

    pub fn window_mut(&mut self, id: WindowId) -> Result<&mut Window> {
        self.windows.get_mut(&id).ok_or(WmError::UnknownWindow(id))
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub fn pending_removals(&self) -> &[WindowId] {
        &self.pending_remove
    }

    /// Add a window for `client`.
    ///
    /// Sub-window types need a parent and nothing else may have one. A
    /// window added to an app token replaces the oldest window on that
    /// token with the same title that is waiting for a replacement.
    pub fn add_window(&mut self, params: WindowParams, client: Arc<dyn WindowClient>) -> Result<WindowId> {
        let is_app = self.token(params.token)?.app.is_some();
        self.display(params.display)?;

        let window_type = params.attrs.window_type;
        let parent_type = match (window_type.is_sub_window(), params.parent) {
            (true, Some(parent)) => Some(self.window(parent)?.window_type()),
            (true, None) => return Err(WmError::MissingParent { window_type }),
            (false, Some(_)) => return Err(WmError::UnexpectedParent { window_type }),
            (false, None) => None,
        };

        let id = WindowId(self.next_window_id);
        self.next_window_id += 1;
        let window = Window::new(id, params, parent_type, self.policy.as_ref());

        if let Some(parent) = window.parent.and_then(|p| self.windows.get_mut(&p)) {
            parent.children.insert(id, window.sub_layer);
        }

        if is_app {
            if let Some(replaced) = self
                .windows
                .values_mut()
                .filter(|w| {
                    w.token == window.token
                        && w.attrs.title == window.attrs.title
                        && w.replacement.awaiting_replacement()
                })
                .min_by_key(|w| w.id)
            {
                replaced.replacement.replacing_window = Some(id);
                debug!("{} will replace {}", id, replaced.id);
            }
        }

        info!(
            "Added {} \"{}\" type={:?} token={:?}",
            id, window.attrs.title, window_type, window.token
        );
        self.windows.insert(id, window);
        self.clients.insert(id, client);
        Ok(id)
    }

    fn visibility_context(&self, window: &Window) -> VisibilityContext<'_> {
        let token = self.tokens.get(&window.token);
        VisibilityContext {
            app: token.and_then(|t| t.app.as_ref()),
            root: token.map(|t| t.state).unwrap_or_default(),
            transition_set: self.transition_set,
        }
    }

    /// Visibility predicates for a window
    pub fn visibility(&self, id: WindowId) -> Result<VisibilityOracle<'_>> {
        let window = self.window(id)?;
        Ok(VisibilityOracle::new(window, self.visibility_context(window)))
    }

    fn app_token_of(&self, window: &Window) -> Option<&AppWindowToken> {
        self.tokens.get(&window.token).and_then(|t| t.app.as_ref())
    }

    fn layout_inputs(&self, id: WindowId) -> Result<LayoutInputs> {
        let window = self.window(id)?;
        let app = self.app_token_of(window);
        let display = self.display(window.display)?;
        Ok(LayoutInputs {
            task: app.and_then(|a| a.task).and_then(|t| self.tasks.get(&t)).cloned(),
            frozen_bounds: app.and_then(AppWindowToken::top_frozen_bounds),
            divider: display.divider,
            display: display.info,
        })
    }

    /// Prepare a window's scale for the coming layout pass
    pub fn prelayout(&mut self, id: WindowId) -> Result<()> {
        let scale = self.layout.compat_screen_scale;
        self.window_mut(id)?.prelayout(scale);
        Ok(())
    }

    /// Resolve a window's frame and insets from this pass's reference frames
    pub fn compute_frame(&mut self, id: WindowId, frames: &LayoutFrames) -> Result<FrameOutcome> {
        let inputs = self.layout_inputs(id)?;
        let ime_obscuring = self.ime_target == Some(id)
            && self
                .ime_window
                .is_some_and(|ime| self.visibility(ime).is_ok_and(|o| o.is_visible_now()));
        let visible_or_animating = {
            let oracle = self.visibility(id)?;
            oracle.is_visible() || self.window(id)?.animating
        };

        let cx = FrameContext {
            task: inputs.task.as_ref(),
            frozen_bounds: inputs.frozen_bounds,
            ime_obscuring,
            divider: &inputs.divider,
            visible_or_animating,
            min_visible_width: inputs.display.dip_to_px(self.layout.min_visible_width_dp),
            min_visible_height: inputs.display.dip_to_px(self.layout.min_visible_height_dp),
        };

        let window = self.windows.get_mut(&id).ok_or(WmError::UnknownWindow(id))?;
        let outcome = window.compute_frame(frames, &cx);
        let display = window.display;

        if let FrameOutcome::Resolved {
            wallpaper_offset_stale: true,
        } = outcome
        {
            self.display_mut(display)?.wallpaper_offset_stale = true;
        }
        Ok(outcome)
    }

    /// Recompute drag-resize state, returns whether it changed
    pub fn update_drag_resizing(&mut self, id: WindowId) -> Result<bool> {
        let inputs = self.layout_inputs(id)?;
        let window = self.window_mut(id)?;
        Ok(window.update_drag_resizing(
            inputs.task.as_ref(),
            inputs.divider.resizing,
            inputs.frozen_bounds.is_some(),
        ))
    }

    /// Area that accepts touches; freeform windows get a resize margin
    pub fn touchable_region(&self, id: WindowId) -> Result<Rect> {
        let inputs = self.layout_inputs(id)?;
        let window = self.window(id)?;
        if inputs.task.as_ref().is_some_and(Task::is_freeform) {
            let delta = inputs.display.dip_to_px(self.layout.resize_handle_width_dp);
            Ok(Rect::new(
                window.frame.left - delta,
                window.frame.top - delta,
                window.frame.right + delta,
                window.frame.bottom + delta,
            ))
        } else {
            Ok(window.frame)
        }
    }

    /// Settle policy visibility after an animation
    pub fn check_policy_visibility_change(&mut self, id: WindowId) -> Result<bool> {
        let window = self.window_mut(id)?;
        let changed = window.check_policy_visibility_change();
        let display = window.display;
        if changed {
            self.display_mut(display)?.layout_needed = true;
        }
        Ok(changed)
    }

    // Surface and replacement lifecycle

    pub fn set_replacing(&mut self, id: WindowId, animate: bool) -> Result<bool> {
        Ok(self.window_mut(id)?.set_replacing(animate))
    }

    /// Advance a window's draw state. Reaching a drawn state for the first
    /// time completes any replacement handshake waiting on this window.
    pub fn set_draw_state(&mut self, id: WindowId, to: DrawState) -> Result<()> {
        let window = self.window_mut(id)?;
        let was_drawn = window.draw_state.is_drawn();
        window.set_draw_state(to)?;
        if to.is_drawn() && !was_drawn {
            self.on_window_drawn(id)?;
        }
        Ok(())
    }

    fn on_window_drawn(&mut self, id: WindowId) -> Result<()> {
        let token = self.window(id)?.token;
        if let Some(app) = self.tokens.get_mut(&token).and_then(|t| t.app.as_mut()) {
            app.first_window_drawn = true;
        }
        self.maybe_remove_replaced_window(id, token)
    }

    fn maybe_remove_replaced_window(&mut self, id: WindowId, token: TokenId) -> Result<()> {
        let exiting: Vec<WindowId> = self
            .windows
            .values_mut()
            .filter(|w| w.token == token && w.id != id)
            .filter_map(|w| w.release_to_replacement(id).then_some(w.id))
            .collect();
        for old in exiting {
            info!("Removing {} replaced by {}", old, id);
            self.finalize_removal(old)?;
        }
        Ok(())
    }

    /// Ask for a window to be removed. A window waiting for its replacement
    /// stays until the replacement has drawn.
    pub fn remove_window(&mut self, id: WindowId) -> Result<()> {
        let window = self.window_mut(id)?;
        if window.replacement.will_replace {
            window.replacement.remove_requested = true;
            window.exiting = true;
            debug!("Deferring removal of {} until its replacement draws", id);
            return Ok(());
        }
        self.finalize_removal(id)
    }

    /// Tear a window down: children first, then input, surface and the
    /// parent's child list.
    pub fn finalize_removal(&mut self, id: WindowId) -> Result<()> {
        let mut window = self.windows.remove(&id).ok_or(WmError::UnknownWindow(id))?;

        let children: Vec<WindowId> = window.children.ids().collect();
        for child in children {
            if self.windows.contains_key(&child) {
                self.finalize_removal(child)?;
            }
        }

        window.removed = true;
        window.destroying = true;
        window.dispose_input_channel(self.input.as_mut());
        window.destroy_surface();

        if let Some(parent) = window.parent.and_then(|p| self.windows.get_mut(&p)) {
            parent.children.remove(id);
        }
        for other in self.windows.values_mut() {
            if other.replacement.replacing_window == Some(id) {
                other.replacement.replacing_window = None;
            }
        }

        self.clients.remove(&id);
        self.pending_remove.retain(|w| *w != id);
        if self.ime_window == Some(id) {
            self.ime_window = None;
        }
        if self.ime_target == Some(id) {
            self.ime_target = None;
        }
        if let Some(display) = self.displays.get_mut(&window.display) {
            display.layout_needed = true;
        }

        info!("Removed {}", id);
        Ok(())
    }

    // Input

    pub fn open_input_channel(&mut self, id: WindowId, hand_to_client: bool) -> Result<Option<ChannelId>> {
        let window = self.windows.get_mut(&id).ok_or(WmError::UnknownWindow(id))?;
        window.open_input_channel(hand_to_client, self.input.as_mut())
    }

    pub fn dispose_input_channel(&mut self, id: WindowId) -> Result<()> {
        let window = self.windows.get_mut(&id).ok_or(WmError::UnknownWindow(id))?;
        window.dispose_input_channel(self.input.as_mut());
        Ok(())
    }

    // Client notifications

    /// Queue a resize report with the last reported insets
    pub fn report_resized(&mut self, id: WindowId) -> Result<()> {
        let inputs = self.layout_inputs(id)?;
        let current = self.current_config;
        let window = self.windows.get_mut(&id).ok_or(WmError::UnknownWindow(id))?;

        let config_changed = window.last_config != Some(current);
        if config_changed {
            window.last_config = Some(current);
        }

        // Fullscreen backdrop while a docked resize runs (and until it settles)
        let resizing = window.drag_resizing
            || window.is_drag_resize_changed(
                inputs.task.as_ref(),
                inputs.divider.resizing,
                inputs.frozen_bounds.is_some(),
            );
        let freeform = inputs.task.as_ref().is_some_and(Task::is_freeform);
        let backdrop_frame = if freeform || !resizing {
            window.compat_frame
        } else {
            inputs.display.logical_rect()
        };

        let report = ResizeReport {
            frame: window.compat_frame,
            overscan_insets: window.last_insets.overscan,
            content_insets: window.last_insets.content,
            visible_insets: window.last_insets.visible,
            stable_insets: window.last_insets.stable,
            outsets: window.last_insets.outsets,
            report_draw: window.draw_state == DrawState::DrawPending,
            new_config: config_changed.then_some(current),
            backdrop_frame,
        };
        window.insets_changed = InsetsChanged::empty();
        debug!("Reporting new frame to {}: {}", id, report.frame);

        match self.clients.get(&id) {
            Some(client) => self.queue.post(id, client.clone(), ClientMessage::Resized(report)),
            None => debug!("{} has no client to report to", id),
        }
        Ok(())
    }

    pub fn report_focus_changed(&mut self, id: WindowId, focused: bool, in_touch_mode: bool) -> Result<()> {
        self.window(id)?;
        if let Some(client) = self.clients.get(&id) {
            self.queue.post(
                id,
                client.clone(),
                ClientMessage::FocusChanged {
                    focused,
                    in_touch_mode,
                },
            );
        }
        Ok(())
    }

    /// The client of `id` could not be reached: remove the window on the
    /// next pass and ask for one.
    pub fn on_client_unreachable(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            return;
        }
        if !self.pending_remove.contains(&id) {
            warn!("Client of {} is unreachable, scheduling removal", id);
            self.pending_remove.push(id);
        }
        self.layout_needed = true;
    }

    /// Remove every window scheduled by [`Self::on_client_unreachable`]
    pub fn process_pending_removals(&mut self) -> Result<Vec<WindowId>> {
        let pending = std::mem::take(&mut self.pending_remove);
        let mut removed = Vec::with_capacity(pending.len());
        for id in pending {
            if self.windows.contains_key(&id) {
                self.finalize_removal(id)?;
                removed.push(id);
            }
        }
        Ok(removed)
    }

    /// Remove windows whose client process died
    pub fn reap_dead_clients(&mut self) -> Result<Vec<WindowId>> {
        let mut dead: Vec<WindowId> = self
            .clients
            .iter()
            .filter(|(_, client)| !client.is_alive())
            .map(|(id, _)| *id)
            .collect();
        dead.sort();

        let mut removed = Vec::with_capacity(dead.len());
        for id in dead {
            let Some(token) = self.windows.get(&id).map(|w| w.token) else {
                continue;
            };
            if let Some(app) = self.tokens.get_mut(&token).and_then(|t| t.app.as_mut()) {
                if !app.client_hidden {
                    app.app_died = true;
                }
            }
            info!("Client of {} died", id);
            self.finalize_removal(id)?;
            removed.push(id);
        }
        Ok(removed)
    }

    /// Snapshot of a window's state for debugging
    pub fn dump_window(&self, id: WindowId) -> Result<serde_json::Value> {
        let window = self.window(id)?;
        let oracle = self.visibility(id)?;
        Ok(serde_json::json!({
            "id": window.id.0,
            "title": window.attrs.title,
            "type": format!("{:?}", window.window_type()),
            "owner_uid": window.owner_uid,
            "layer": window.base_layer,
            "sub_layer": window.sub_layer,
            "parent": window.parent.map(|p| p.0),
            "children": window.children.ids().map(|c| c.0).collect::<Vec<_>>(),
            "frame": window.frame,
            "last_frame": window.last_frame,
            "compat_frame": window.compat_frame,
            "containing_frame": window.containing_frame,
            "content_frame": window.content_frame,
            "visible_frame": window.visible_frame,
            "insets": window.insets,
            "last_insets": window.last_insets,
            "draw_state": window.draw_state,
            "has_surface": window.has_surface,
            "policy_visible": window.policy_visible,
            "exiting": window.exiting,
            "destroying": window.destroying,
            "visible": oracle.is_visible(),
            "on_screen": oracle.is_on_screen(),
            "gone_for_layout": oracle.is_gone_for_layout(),
            "drag_resizing": window.drag_resizing,
            "resize_mode": window.resize_mode,
            "replacement": window.replacement,
            "global_scale": window.global_scale,
        }))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::wm::errors::ClientError;
    use crate::wm::window_flags::{WindowAttrs, WindowType};

    /// Top-level window with default attributes
    pub(crate) fn app_window(id: u32, window_type: WindowType) -> Window {
        let params = WindowParams::new(WindowAttrs::new(window_type), TokenId(1));
        Window::new(WindowId(id), params, None, &DefaultPolicy)
    }

    /// Client that records what it is sent
    #[derive(Default)]
    pub(crate) struct RecordingClient {
        pub messages: Mutex<Vec<ClientMessage>>,
        pub dead: AtomicBool,
        pub fail: bool,
    }

    impl RecordingClient {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn resizes(&self) -> Vec<ResizeReport> {
            self.messages
                .lock()
                .iter()
                .filter_map(|m| match m {
                    ClientMessage::Resized(r) => Some(r.clone()),
                    ClientMessage::FocusChanged { .. } => None,
                })
                .collect()
        }

        pub(crate) fn kill(&self) {
            self.dead.store(true, Ordering::SeqCst);
        }
    }

    impl WindowClient for RecordingClient {
        fn resized(&self, report: &ResizeReport) -> std::result::Result<(), ClientError> {
            if self.fail {
                return Err(ClientError::DeadObject);
            }
            self.messages.lock().push(ClientMessage::Resized(report.clone()));
            Ok(())
        }

        fn focus_changed(&self, focused: bool, in_touch_mode: bool) -> std::result::Result<(), ClientError> {
            if self.fail {
                return Err(ClientError::Rejected("focus".into()));
            }
            self.messages.lock().push(ClientMessage::FocusChanged {
                focused,
                in_touch_mode,
            });
            Ok(())
        }

        fn is_alive(&self) -> bool {
            !self.dead.load(Ordering::SeqCst)
        }
    }
}
