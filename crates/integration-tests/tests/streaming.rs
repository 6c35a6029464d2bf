mod harness;

use std::time::Duration;

use futures_util::{StreamExt, TryStreamExt};
use harness::config::mock_config;
use harness::mock_watsonx::{MockWatsonx, StreamScript};
use tokio_util::sync::CancellationToken;
use wxbridge_llm::{CreateOptions, FinishReason, LlmError, LlmMessage, RequestUsage, StreamItem, WatsonxClient};

fn prompt() -> [LlmMessage; 1] {
    [LlmMessage::user("Hello", "user")]
}

#[tokio::test]
async fn streaming_emits_fragments_then_final_text() {
    let mock = MockWatsonx::start_streaming(StreamScript::Text).await.unwrap();
    let client = WatsonxClient::new(mock_config(&mock.base_url())).unwrap();

    let items: Vec<StreamItem> = client
        .create_stream(&prompt(), &[], &CreateOptions::default())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    let (last, fragments) = items.split_last().unwrap();
    assert_eq!(
        fragments,
        ["Hello", " from", " mock", " watsonx"]
            .map(|text| StreamItem::Text(text.to_owned()))
            .as_slice()
    );

    let StreamItem::Done(result) = last else {
        panic!("expected final result, got {last:?}");
    };
    assert_eq!(result.text(), Some("Hello from mock watsonx"));
    assert_eq!(result.finish_reason, FinishReason::Stop);
    assert_eq!(result.usage, RequestUsage::default());
    assert_eq!(mock.stream_count(), 1);
    assert_eq!(mock.last_version().as_deref(), Some("2024-10-08"));
}

#[tokio::test]
async fn streamed_tool_call_fragments_are_joined() {
    let mock = MockWatsonx::start_streaming(StreamScript::ToolCall).await.unwrap();
    let client = WatsonxClient::new(mock_config(&mock.base_url())).unwrap();

    let items: Vec<StreamItem> = client
        .create_stream(&prompt(), &[], &CreateOptions::default())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    let StreamItem::Done(result) = &items[0] else {
        panic!("expected final result, got {:?}", items[0]);
    };

    assert_eq!(result.finish_reason, FinishReason::FunctionCalls);
    let calls = result.function_calls().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "chatcmpl-tool-1");
    assert_eq!(calls[0].name, "get_weather");
    assert_eq!(calls[0].arguments, r#"{"city":"NY"}"#);
}

#[tokio::test]
async fn cancelling_mid_stream_yields_no_result() {
    let mock = MockWatsonx::start_streaming(StreamScript::Stalled).await.unwrap();
    let client = WatsonxClient::new(mock_config(&mock.base_url())).unwrap();
    let token = CancellationToken::new();

    let mut stream = client
        .create_stream(&prompt(), &[], &CreateOptions::with_cancellation(token.clone()))
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first, StreamItem::Text("Hello".to_owned()));

    token.cancel();
    let rest = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("cancelled stream should end promptly");
    assert!(rest.is_none());
}

#[tokio::test]
async fn undecodable_chunk_fails_the_stream() {
    let mock = MockWatsonx::start_streaming(StreamScript::Garbage).await.unwrap();
    let client = WatsonxClient::new(mock_config(&mock.base_url())).unwrap();

    let items: Vec<Result<StreamItem, LlmError>> = client
        .create_stream(&prompt(), &[], &CreateOptions::default())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert!(matches!(&items[0], Ok(StreamItem::Text(text)) if text == "Hello"));
    assert!(matches!(items[1], Err(LlmError::Streaming(_))));
}
