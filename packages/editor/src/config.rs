use std::time::Duration;

pub const DEFAULT_STREAM_TICK: Duration = Duration::from_millis(15);
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(30);

/// Runtime settings for an editing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Interval between revealed characters while streaming
    pub stream_tick: Duration,
    /// Quiet period after the last edit before an autosave runs
    pub autosave_delay: Duration,
    /// When false nothing is loaded, autosaved or snapshotted
    pub version_control: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            stream_tick: DEFAULT_STREAM_TICK,
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            version_control: true,
        }
    }
}

impl EditorConfig {
    pub fn with_stream_tick(mut self, tick: Duration) -> Self {
        self.stream_tick = tick;
        self
    }

    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay = delay;
        self
    }

    pub fn without_version_control(mut self) -> Self {
        self.version_control = false;
        self
    }
}
