//! Reassembly of streamed delta chunks into a complete result

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt, stream};
use tokio_util::sync::CancellationToken;

use crate::convert::watsonx::parse_finish_reason;
use crate::error::LlmError;
use crate::protocol::watsonx::WxStreamChunk;
use crate::provider::ChunkStream;
use crate::types::{CreateContent, CreateResult, FunctionCall, RequestUsage};
use crate::usage::UsageTracker;

/// One item of a streaming call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// Text fragment, emitted as it arrives
    Text(String),
    /// Final aggregated result; always the last item of an uncancelled stream
    Done(CreateResult),
}

/// Live fragments followed by one final result
pub type CreateStream = Pin<Box<dyn Stream<Item = Result<StreamItem, LlmError>> + Send>>;

/// Accumulates delta chunks for a single streaming call
///
/// A chunk whose delta has a `content` key is a text chunk, even when the
/// value is empty or null, and its `tool_calls` are ignored. Otherwise each
/// tool-call entry's `id`, `name` and `arguments` are appended to the call at
/// its `index`.
#[derive(Debug, Default)]
pub struct StreamAggregator {
    fragments: Vec<String>,
    tool_calls: BTreeMap<u32, FunctionCall>,
    finish_reason: Option<String>,
}

impl StreamAggregator {
    /// Empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk in, returning the text fragment to emit, if any
    pub fn push(&mut self, chunk: &WxStreamChunk) -> Option<String> {
        let choice = chunk.choices.first()?;

        if let Some(reason) = &choice.finish_reason {
            self.finish_reason = Some(reason.clone());
        }

        // TODO: revalidate against current watsonx streams whether a content
        // key can share a chunk with real tool_calls fragments
        if let Some(content) = &choice.delta.content {
            let text = content.as_deref().unwrap_or_default();
            if text.is_empty() {
                return None;
            }
            self.fragments.push(text.to_owned());
            return Some(text.to_owned());
        }

        for fragment in choice.delta.tool_calls.iter().flatten() {
            let call = self.tool_calls.entry(fragment.index).or_default();

            if let Some(id) = &fragment.id {
                call.id.push_str(id);
            }
            if let Some(function) = &fragment.function {
                if let Some(name) = &function.name {
                    call.name.push_str(name);
                }
                if let Some(arguments) = &function.arguments {
                    call.arguments.push_str(arguments);
                }
            }
        }

        None
    }

    /// Build the final result once the chunk sequence has ended
    ///
    /// Text wins over tool calls. Calls are ordered by index. Usage is zero
    /// because the streaming endpoint does not report it.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::UnknownFinishReason` if the last finish reason seen
    /// is missing or unrecognised
    pub fn finish(self) -> Result<CreateResult, LlmError> {
        let finish_reason = parse_finish_reason(self.finish_reason.as_deref())?;

        let content = if self.fragments.is_empty() {
            CreateContent::FunctionCalls(self.tool_calls.into_values().collect())
        } else {
            CreateContent::Text(self.fragments.concat())
        };

        tracing::debug!("streamed result carries no usage, reporting zero tokens");

        Ok(CreateResult {
            finish_reason,
            content,
            usage: RequestUsage::default(),
            cached: false,
        })
    }
}

struct Driver {
    chunks: ChunkStream,
    aggregator: StreamAggregator,
    cancellation: CancellationToken,
    usage: Arc<UsageTracker>,
}

/// Drive `chunks` through a fresh aggregator
///
/// The cancellation token is checked before every chunk and raced against the
/// pending one. Once it fires the chunk stream is dropped and the output ends
/// without a final result. The output is fused, so polling past the end keeps
/// yielding `None`.
pub(crate) fn aggregate(chunks: ChunkStream, cancellation: CancellationToken, usage: Arc<UsageTracker>) -> CreateStream {
    let driver = Driver {
        chunks,
        aggregator: StreamAggregator::new(),
        cancellation,
        usage,
    };

    let items = stream::unfold(Some(driver), |driver| async move {
        let mut driver = driver?;

        loop {
            let next = tokio::select! {
                biased;
                () = driver.cancellation.cancelled() => {
                    tracing::debug!("stream cancelled, dropping remaining chunks");
                    return None;
                }
                next = driver.chunks.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if let Some(text) = driver.aggregator.push(&chunk) {
                        return Some((Ok(StreamItem::Text(text)), Some(driver)));
                    }
                }
                Some(Err(e)) => return Some((Err(e), None)),
                None => {
                    let item = std::mem::take(&mut driver.aggregator).finish().map(|result| {
                        driver.usage.merge(result.usage);
                        StreamItem::Done(result)
                    });
                    return Some((item, None));
                }
            }
        }
    });

    Box::pin(items.fuse())
}
