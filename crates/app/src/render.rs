use insole_viewer_core::{format_timestamp, HeatmapMode, WindowListener, WindowUpdate};

/// Stand-in for the chart and heat map: logs a full redraw when the window
/// moved and only a marker move otherwise.
#[derive(Debug)]
pub struct ConsoleRenderer {
    mode: HeatmapMode,
    redraws: u64,
}

impl ConsoleRenderer {
    pub fn new(mode: HeatmapMode) -> Self {
        Self { mode, redraws: 0 }
    }
}

impl WindowListener for ConsoleRenderer {
    fn on_window_update(&mut self, update: &WindowUpdate) {
        let head_time = update
            .head_sample()
            .map_or_else(String::new, |sample| format_timestamp(sample.timestamp_ms));
        let heatmap = update.focus_values(self.mode).unwrap_or_default();

        if update.window_shifted {
            self.redraws += 1;
            tracing::info!(
                redraw = self.redraws,
                samples = update.slice.len(),
                start = update.position.start,
                end = update.position.end,
                head = %head_time,
                "redrawing chart"
            );
        } else {
            tracing::debug!(head = %head_time, offset = update.head_offset, "moving marker");
        }
        tracing::trace!(?heatmap, mode = ?self.mode, "heat map values");
    }
}
