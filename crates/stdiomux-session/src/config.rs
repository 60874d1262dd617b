use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::messages::TOOL_API_VERSION;
use crate::stream::StreamInfo;

/// Receives the session's diagnostic lines.
pub type DebugSink = Arc<dyn Fn(fmt::Arguments<'_>) + Send + Sync>;

/// Called once for every stream the session finalizes.
pub type CloseNotifier = Arc<dyn Fn(&StreamInfo) + Send + Sync>;

/// Options for creating a [`Session`](crate::Session).
#[derive(Clone)]
pub struct SessionConfig {
    /// Tool API version advertised in `hello`.
    pub version: u32,
    /// Compress outbound stream data when the peer supports it.
    pub compression: bool,
    pub(crate) debug: Option<DebugSink>,
    pub(crate) close_notifier: Option<CloseNotifier>,
    pub(crate) cancellation: CancellationToken,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: TOOL_API_VERSION,
            compression: cfg!(feature = "zstd"),
            debug: None,
            close_notifier: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send diagnostic lines to `sink` in addition to `tracing`.
    pub fn with_debug<F>(mut self, sink: F) -> Self
    where
        F: Fn(fmt::Arguments<'_>) + Send + Sync + 'static,
    {
        self.debug = Some(Arc::new(sink));
        self
    }

    /// Register a callback for finalized streams.
    ///
    /// The callback runs while the session lock is held; it must not call
    /// back into the session or drop stream handles.
    pub fn with_close_notifier<F>(mut self, notifier: F) -> Self
    where
        F: Fn(&StreamInfo) + Send + Sync + 'static,
    {
        self.close_notifier = Some(Arc::new(notifier));
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Tear the session down when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("version", &self.version)
            .field("compression", &self.compression)
            .field("debug", &self.debug.is_some())
            .field("close_notifier", &self.close_notifier.is_some())
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}
