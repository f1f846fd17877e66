//! Input Channel Module
//!
//! Bookkeeping for the channel pair a window receives input through. The
//! transport itself belongs to the input dispatcher; here we only track which
//! channels exist and keep registration in step with them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::wm::errors::{Result, WmError};
use crate::wm::window::{Window, WindowId};

static NEXT_CHANNEL: AtomicU64 = AtomicU64::new(1);

/// One end of an input channel pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl ChannelId {
    fn allocate() -> Self {
        Self(NEXT_CHANNEL.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chan#{}", self.0)
    }
}

/// Routes input to registered windows
pub trait InputDispatcher: Send {
    fn register(&mut self, window: WindowId, channel: ChannelId);
    fn unregister(&mut self, channel: ChannelId);
}

/// In-process dispatcher table
#[derive(Debug, Default)]
pub struct InputRoutes {
    routes: HashMap<ChannelId, WindowId>,
}

impl InputRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_for(&self, channel: ChannelId) -> Option<WindowId> {
        self.routes.get(&channel).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl InputDispatcher for InputRoutes {
    fn register(&mut self, window: WindowId, channel: ChannelId) {
        self.routes.insert(channel, window);
    }

    fn unregister(&mut self, channel: ChannelId) {
        self.routes.remove(&channel);
    }
}

/// Swallows input for a window whose client died while visible, so taps on
/// it still reach the input monitor and can relaunch the app.
#[derive(Debug)]
pub struct DeadWindowReceiver {
    channel: ChannelId,
    consumed: u64,
}

impl DeadWindowReceiver {
    fn new(channel: ChannelId) -> Self {
        Self { channel, consumed: 0 }
    }

    /// Every event is reported handled
    pub fn consume(&mut self) -> bool {
        self.consumed += 1;
        true
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}

/// Open channel pair of a window
#[derive(Debug)]
pub struct InputChannel {
    pub server: ChannelId,
    /// Client end while it is still held locally
    pub client: Option<ChannelId>,
    pub dead_receiver: Option<DeadWindowReceiver>,
}

impl Window {
    /// Open the window's channel pair and register the server end.
    ///
    /// With `hand_to_client` the client end is returned for transfer to the
    /// client; otherwise it stays here behind a [`DeadWindowReceiver`].
    pub fn open_input_channel(&mut self, hand_to_client: bool, dispatcher: &mut dyn InputDispatcher) -> Result<Option<ChannelId>> {
        if self.input_channel.is_some() {
            return Err(WmError::InputChannelAlreadyOpen(self.id));
        }

        let server = ChannelId::allocate();
        let client = ChannelId::allocate();
        let (kept, handed) = if hand_to_client {
            (None, Some(client))
        } else {
            (Some(client), None)
        };

        self.input_channel = Some(InputChannel {
            server,
            client: kept,
            dead_receiver: kept.map(DeadWindowReceiver::new),
        });
        dispatcher.register(self.id, server);
        info!("Opened input channel {} for {}", server, self.id);
        Ok(handed)
    }

    /// Unregister and drop the channel pair. Safe to call more than once.
    pub fn dispose_input_channel(&mut self, dispatcher: &mut dyn InputDispatcher) {
        let Some(mut channel) = self.input_channel.take() else {
            return;
        };
        channel.dead_receiver = None;
        // Server end must leave the dispatcher before it is dropped
        dispatcher.unregister(channel.server);
        debug!("Disposed input channel {} of {}", channel.server, self.id);
    }

    pub fn has_input_channel(&self) -> bool {
        self.input_channel.is_some()
    }
}
