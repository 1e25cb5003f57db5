use super::*;
use crate::api::client::MockStreamProducer;
use crate::api::mock_client::{MockApiClient, MOCK_TRANSPORT_ERROR};
use crate::api::ApiClient;
use crate::error::TurnError;
use crate::state::entry::Role;
use crate::state::session::fake::FakeGit;
use crate::state::session::Session;
use crate::tools::paths::PathResolver;
use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn text_round(text: &str) -> Vec<String> {
    vec![
        r#"data: {"choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#
            .to_string(),
        format!(
            r#"data: {{"choices":[{{"index":0,"delta":{{"content":{}}},"finish_reason":null}}]}}"#,
            serde_json::to_string(text).expect("encode text")
        ),
        r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#.to_string(),
        "data: [DONE]".to_string(),
    ]
}

fn create_file_round() -> Vec<String> {
    vec![
        r#"data: {"choices":[{"index":0,"delta":{"content":"Creating it."},"finish_reason":null}]}"#
            .to_string(),
        r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"create_file","arguments":""}}]},"finish_reason":null}]}"#
            .to_string(),
        r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"file_path\": \"notes/todo.txt\","}}]},"finish_reason":null}]}"#
            .to_string(),
        r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":" \"content\": \"ship it\"}"}}]},"finish_reason":null}]}"#
            .to_string(),
        r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#.to_string(),
        "data: [DONE]".to_string(),
    ]
}

fn driver_with(mock: &MockApiClient, temp: &TempDir, max_history: usize) -> ConversationDriver {
    let producer: Arc<dyn MockStreamProducer> = Arc::new(mock.clone());
    let session = Session::with_backend(
        PathResolver::new(temp.path().to_path_buf()),
        Box::new(FakeGit::repository("main")),
        false,
    );
    ConversationDriver::new(ApiClient::new_mock(producer), session, max_history, 5)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ConversationStreamUpdate>) -> Vec<ConversationStreamUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

#[tokio::test]
async fn test_text_turn_appends_user_and_assistant() -> Result<()> {
    let temp = TempDir::new()?;
    let mock = MockApiClient::new(vec![text_round("Hello there")]);
    let mut driver = driver_with(&mock, &temp, 50);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let summary = driver
        .send_message("hi", Some(&tx), &CancellationToken::new())
        .await?;

    assert_eq!(summary.assistant_text, "Hello there");
    assert_eq!(summary.tool_calls, 0);
    assert_eq!(summary.finish_reason.as_deref(), Some("stop"));
    assert_eq!(driver.state(), DriverState::AwaitingInput);

    let entries = driver.store().entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].role, Role::System);
    assert_eq!(entries[1].role, Role::User);
    assert_eq!(entries[2].role, Role::Assistant);
    assert_eq!(entries[2].content, "Hello there");

    let deltas: String = drain(&mut rx)
        .into_iter()
        .filter_map(|update| match update {
            ConversationStreamUpdate::Delta(text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(deltas, "Hello there");
    Ok(())
}

#[tokio::test]
async fn test_tool_call_turn_dispatches_and_records_result() -> Result<()> {
    let temp = TempDir::new()?;
    let mock = MockApiClient::new(vec![create_file_round()]);
    let mut driver = driver_with(&mock, &temp, 50);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let summary = driver
        .send_message("make a todo file", Some(&tx), &CancellationToken::new())
        .await?;

    assert_eq!(summary.tool_calls, 1);
    assert_eq!(summary.finish_reason.as_deref(), Some("tool_calls"));
    let written = std::fs::read_to_string(temp.path().join("notes/todo.txt"))?;
    assert_eq!(written, "ship it");

    let entries = driver.store().entries();
    let assistant = entries
        .iter()
        .position(|entry| entry.role == Role::Assistant)
        .expect("assistant entry");
    assert!(entries[assistant].has_tool_calls());
    assert_eq!(entries[assistant].tool_calls[0].id, "call_1");

    let tool = &entries[assistant + 1];
    assert_eq!(tool.role, Role::Tool);
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool.content.contains("created/updated"));

    let updates = drain(&mut rx);
    assert!(updates.iter().any(|update| matches!(
        update,
        ConversationStreamUpdate::ToolCall { name, .. } if name == "create_file"
    )));
    assert!(updates.iter().any(|update| matches!(
        update,
        ConversationStreamUpdate::ToolResult { output, .. } if output.contains("notes")
    )));
    Ok(())
}

#[tokio::test]
async fn test_malformed_tool_call_is_dropped_with_diagnostic() -> Result<()> {
    let temp = TempDir::new()?;
    let round = vec![
        r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_bad","function":{"name":"read_file","arguments":"{\"file_path\": "}}]},"finish_reason":null}]}"#
            .to_string(),
        r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#.to_string(),
        "data: [DONE]".to_string(),
    ];
    let mock = MockApiClient::new(vec![round]);
    let mut driver = driver_with(&mock, &temp, 50);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let summary = driver
        .send_message("read something", Some(&tx), &CancellationToken::new())
        .await?;

    assert_eq!(summary.tool_calls, 0);
    assert_eq!(summary.dropped_tool_calls, 1);
    let entries = driver.store().entries();
    assert!(entries.iter().all(|entry| entry.role != Role::Tool));
    assert!(!entries[entries.len() - 1].has_tool_calls());

    assert!(drain(&mut rx).iter().any(|update| matches!(
        update,
        ConversationStreamUpdate::Diagnostic(text) if text.contains("read_file")
    )));
    Ok(())
}

#[tokio::test]
async fn test_cancelled_turn_rolls_back_user_entry() -> Result<()> {
    let temp = TempDir::new()?;
    let mock = MockApiClient::new(vec![text_round("never shown")]);
    let mut driver = driver_with(&mock, &temp, 50);
    let before = driver.store().len();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let error = driver
        .send_message("hi", None, &cancel)
        .await
        .expect_err("cancelled turn should fail");

    assert!(matches!(
        error.downcast_ref::<TurnError>(),
        Some(TurnError::Interrupted)
    ));
    assert_eq!(driver.store().len(), before);
    assert_eq!(driver.state(), DriverState::AwaitingInput);
    Ok(())
}

#[tokio::test]
async fn test_stream_failure_rolls_back_and_next_turn_succeeds() -> Result<()> {
    let temp = TempDir::new()?;
    let mock = MockApiClient::new(Vec::new());
    let mut driver = driver_with(&mock, &temp, 50);
    let before = driver.store().len();

    let error = driver
        .send_message("hi", None, &CancellationToken::new())
        .await
        .expect_err("no scripted response");
    assert!(error.to_string().contains("No more responses"));
    assert_eq!(driver.store().len(), before);

    let mock = MockApiClient::new(vec![text_round("recovered")]);
    let mut driver = driver_with(&mock, &temp, 50);
    let summary = driver
        .send_message("again", None, &CancellationToken::new())
        .await?;
    assert_eq!(summary.assistant_text, "recovered");
    Ok(())
}

#[tokio::test]
async fn test_mid_stream_failure_leaves_no_partial_assistant_entry() -> Result<()> {
    let temp = TempDir::new()?;
    let mut round = create_file_round();
    round.truncate(3);
    round.push(format!("{MOCK_TRANSPORT_ERROR}connection reset"));
    let mock = MockApiClient::new(vec![round]);
    let mut driver = driver_with(&mock, &temp, 50);
    let before = driver.store().len();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let error = driver
        .send_message("make a todo file", Some(&tx), &CancellationToken::new())
        .await
        .expect_err("transport error should fail the turn");

    assert!(error.to_string().contains("connection reset"));
    assert_eq!(driver.store().len(), before);
    assert!(!temp.path().join("notes/todo.txt").exists());
    assert_eq!(
        drain(&mut rx),
        vec![ConversationStreamUpdate::Delta("Creating it.".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn test_requests_carry_persona_and_null_content_for_tool_calls() -> Result<()> {
    let temp = TempDir::new()?;
    let tool_only = vec![
        r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_s","function":{"name":"git_status","arguments":"{}"}}]},"finish_reason":null}]}"#
            .to_string(),
        "data: [DONE]".to_string(),
    ];
    let mock = MockApiClient::new(vec![tool_only, text_round("Clean tree.")]);
    let mut driver = driver_with(&mock, &temp, 50);
    let cancel = CancellationToken::new();

    driver.send_message("status?", None, &cancel).await?;
    driver.send_message("thanks", None, &cancel).await?;

    let requests = mock.recorded_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0][0].role, "system");
    assert_eq!(requests[0][0].content.as_deref(), Some(SYSTEM_PROMPT));

    let second = &requests[1];
    let assistant = second
        .iter()
        .find(|message| message.tool_calls.is_some())
        .expect("assistant tool-call message");
    assert!(assistant.content.is_none());
    let payload = serde_json::to_value(assistant)?;
    assert!(payload["content"].is_null());

    let tool = second
        .iter()
        .find(|message| message.role == "tool")
        .expect("tool result message");
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_s"));
    Ok(())
}

#[tokio::test]
async fn test_history_is_truncated_after_each_turn() -> Result<()> {
    let temp = TempDir::new()?;
    let rounds = (0..6).map(|i| text_round(&format!("reply {i}"))).collect();
    let mock = MockApiClient::new(rounds);
    let mut driver = driver_with(&mock, &temp, 5);
    let cancel = CancellationToken::new();

    for i in 0..6 {
        driver.send_message(&format!("q{i}"), None, &cancel).await?;
    }

    let entries = driver.store().entries();
    assert!(entries.len() <= 5);
    assert_eq!(entries[0].content, SYSTEM_PROMPT);
    assert_eq!(entries[entries.len() - 1].content, "reply 5");
    Ok(())
}

#[test]
fn test_accumulator_keeps_reasoning_out_of_text() {
    use crate::types::StreamEvent;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut accumulator = TurnAccumulator::new();
    accumulator.fold(StreamEvent::Reasoning("thinking".to_string()), Some(&tx));
    accumulator.fold(StreamEvent::Text("answer".to_string()), Some(&tx));

    assert!(accumulator.saw_reasoning());
    assert_eq!(accumulator.text(), "answer");
    assert_eq!(
        drain(&mut rx),
        vec![
            ConversationStreamUpdate::Reasoning("thinking".to_string()),
            ConversationStreamUpdate::Delta("answer".to_string()),
        ]
    );
}
