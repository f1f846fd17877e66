//! Client Module
//!
//! The remote end of a window: resize and focus notifications go out through
//! a single delivery task instead of being called inline under the window
//! manager lock, so a client that calls back into the window manager while
//! handling them cannot deadlock it. One worker drains the queue, which keeps
//! delivery per window in order.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::shared::{Insets, Rect};
use crate::wm::errors::ClientError;
use crate::wm::window::WindowId;
use crate::wm::WindowManager;

/// Display configuration a client lays itself out for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Bumped on every change
    pub seq: u32,
    pub width: i32,
    pub height: i32,
    pub density_dpi: u32,
}

/// Everything a client is told when its frame or insets change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeReport {
    pub frame: Rect,
    pub overscan_insets: Insets,
    pub content_insets: Insets,
    pub visible_insets: Insets,
    pub stable_insets: Insets,
    pub outsets: Insets,
    /// The client must redraw and report back
    pub report_draw: bool,
    pub new_config: Option<Configuration>,
    /// Area the client should fill behind its content while resizing
    pub backdrop_frame: Rect,
}

/// Transport to the process owning a window
pub trait WindowClient: Send + Sync {
    fn resized(&self, report: &ResizeReport) -> Result<(), ClientError>;

    fn focus_changed(&self, focused: bool, in_touch_mode: bool) -> Result<(), ClientError>;

    /// Whether the remote process is still there
    fn is_alive(&self) -> bool;
}

/// Notification queued for a client
#[derive(Debug, Clone)]
pub enum ClientMessage {
    Resized(ResizeReport),
    FocusChanged { focused: bool, in_touch_mode: bool },
}

struct Delivery {
    window: WindowId,
    client: Arc<dyn WindowClient>,
    message: ClientMessage,
}

/// Outbound queue of client notifications.
///
/// Messages are buffered until [`ClientQueue::start`] spawns the worker.
pub struct ClientQueue {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Option<mpsc::UnboundedReceiver<Delivery>>,
}

impl Default for ClientQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx: Some(rx) }
    }

    pub(crate) fn post(&self, window: WindowId, client: Arc<dyn WindowClient>, message: ClientMessage) {
        let delivery = Delivery {
            window,
            client,
            message,
        };
        if self.tx.send(delivery).is_err() {
            warn!("Client delivery task is gone, dropping message for {}", window);
        }
    }

    /// Spawn the delivery worker for `wm`. Only the first call starts one.
    ///
    /// The worker holds the manager weakly and stops once it is dropped.
    pub fn start(wm: &Arc<Mutex<WindowManager>>) -> Option<JoinHandle<()>> {
        let mut rx = wm.lock().client_queue_mut().rx.take()?;
        let weak = Arc::downgrade(wm);

        Some(tokio::spawn(async move {
            while let Some(delivery) = rx.recv().await {
                deliver(&weak, delivery);
            }
            debug!("Client delivery task ended");
        }))
    }
}

fn deliver(wm: &Weak<Mutex<WindowManager>>, delivery: Delivery) {
    let Delivery {
        window,
        client,
        message,
    } = delivery;

    match message {
        ClientMessage::Resized(report) => {
            if let Err(e) = client.resized(&report) {
                warn!("Failed to report 'resized' to the client of {}, removing it: {}", window, e);
                if let Some(wm) = wm.upgrade() {
                    wm.lock().on_client_unreachable(window);
                }
            }
        }
        ClientMessage::FocusChanged {
            focused,
            in_touch_mode,
        } => {
            // Dead clients are reaped through liveness checks
            if let Err(e) = client.focus_changed(focused, in_touch_mode) {
                debug!("Ignoring focus report failure for {}: {}", window, e);
            }
        }
    }
}
