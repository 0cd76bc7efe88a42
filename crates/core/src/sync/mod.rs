use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    cursor::CursorPosition,
    store::{Sample, SampleStore, CHANNEL_COUNT},
};

/// What the heat map shows for the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMode {
    /// Values of the sample under the head.
    #[default]
    Head,
    /// Per-channel mean over the visible slice.
    Average,
}

/// Notification delivered to every registered listener after the visible
/// range or the head changed.
#[derive(Debug, Clone)]
pub struct WindowUpdate {
    /// Visible samples. Shared between listeners and reused while the window
    /// stays put, so marker-only updates do not copy anything.
    pub slice: Arc<SampleStore>,
    pub head_offset: usize,
    /// `false` when only the head moved inside an unchanged window.
    pub window_shifted: bool,
    pub position: CursorPosition,
}

impl WindowUpdate {
    pub fn head_sample(&self) -> Option<&Sample> {
        self.slice.get(self.head_offset)
    }

    pub fn focus_values(&self, mode: HeatmapMode) -> Option<[f64; CHANNEL_COUNT]> {
        match mode {
            HeatmapMode::Head => self.head_sample().map(|sample| sample.values),
            HeatmapMode::Average => self.slice.channel_means(),
        }
    }
}

/// Consumer of [`WindowUpdate`]s, typically a chart or heat-map renderer.
pub trait WindowListener {
    fn on_window_update(&mut self, update: &WindowUpdate);
}

impl<F> WindowListener for F
where
    F: FnMut(&WindowUpdate),
{
    fn on_window_update(&mut self, update: &WindowUpdate) {
        self(update)
    }
}

/// Handle returned on registration, used to unregister a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered, synchronous fan-out of window updates.
///
/// Listeners run in registration order on the caller's turn; there is no
/// batching or queuing.
#[derive(Default)]
pub struct SyncHub {
    listeners: Vec<(ListenerId, Box<dyn WindowListener>)>,
    next_id: u64,
}

impl SyncHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_window_update<L>(&mut self, listener: L) -> ListenerId
    where
        L: WindowListener + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn notify(&mut self, update: &WindowUpdate) {
        for (_, listener) in &mut self.listeners {
            listener.on_window_update(update);
        }
    }
}

impl fmt::Debug for SyncHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHub")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
