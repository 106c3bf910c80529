//! Runtime configuration.

use std::time::Duration;

use testsmith_core::Settings;

/// Configuration shared by the watch runtime and the remote poller.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// How long a path must stay quiet before it is processed.
    pub debounce_interval: Duration,
    /// Delay between two remote polls.
    pub poll_interval: Duration,
    /// Extension of the files to process, including the dot.
    pub extension: String,
    /// Sample test passed along with every request.
    pub sample_reference: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debounce_interval: Duration::from_secs(1),
            poll_interval: Duration::from_secs(60),
            extension: ".cs".to_string(),
            sample_reference: String::new(),
        }
    }
}

impl RuntimeConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes intervals and extension from loaded settings.
    ///
    /// The sample reference is read separately, see
    /// [`Settings::sample_reference`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            debounce_interval: Duration::from_millis(settings.project.debounce_ms),
            poll_interval: Duration::from_secs(settings.git.poll_interval_secs),
            extension: settings.project.code_file_extension.clone(),
            sample_reference: String::new(),
        }
    }

    /// Sets the debounce interval.
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the tracked extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the sample reference.
    pub fn with_sample_reference(mut self, sample: impl Into<String>) -> Self {
        self.sample_reference = sample.into();
        self
    }
}
