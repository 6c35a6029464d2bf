use tokio_util::sync::CancellationToken;

/// Per-call options for `create` and `create_stream`
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Force JSON output mode; not supported, must be `None`
    pub json_output: Option<bool>,
    /// Extra vendor arguments; not supported, must be empty
    pub extra_create_args: serde_json::Map<String, serde_json::Value>,
    /// Token used to abandon the call
    pub cancellation: Option<CancellationToken>,
}

impl CreateOptions {
    /// Options carrying a cancellation token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..Self::default()
        }
    }
}
