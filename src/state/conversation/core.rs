use super::streaming::{emit_stream_update, TurnAccumulator};
use super::{ConversationDriver, ConversationStreamUpdate, DriverState, TurnSummary};
use crate::api::stream::StreamParser;
use crate::error::TurnError;
use crate::state::entry::ConversationEntry;
use crate::tools::ToolDispatcher;
use anyhow::Result;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

impl ConversationDriver {
    /// Run one turn: record the input, stream the reply, dispatch any tool calls
    /// and trim the log. An interrupted or failed stream leaves the log as it was
    /// before the input.
    pub async fn send_message(
        &mut self,
        content: &str,
        stream_delta_tx: Option<&mpsc::UnboundedSender<ConversationStreamUpdate>>,
        cancel: &CancellationToken,
    ) -> Result<TurnSummary> {
        let checkpoint = self.store.checkpoint();
        self.store.append(ConversationEntry::user(content))?;
        self.state = DriverState::Dispatching;

        let streamed = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TurnError::Interrupted.into()),
            result = self.stream_reply(stream_delta_tx) => result,
        };
        let accumulator = match streamed {
            Ok(accumulator) => accumulator,
            Err(error) => {
                tracing::debug!(%error, "turn aborted before completion");
                self.store.rollback_to(checkpoint);
                self.state = DriverState::AwaitingInput;
                return Err(error);
            }
        };

        self.state = DriverState::ProcessingToolCalls;
        let (assistant_text, assembled, finish_reason) = accumulator.finish();
        for dropped in &assembled.dropped {
            emit_stream_update(
                stream_delta_tx,
                ConversationStreamUpdate::Diagnostic(format!(
                    "Skipped tool call #{} ({}): {}",
                    dropped.index,
                    dropped.name.as_deref().unwrap_or("unnamed"),
                    dropped.issue
                )),
            );
        }

        let invocations = assembled.invocations;
        self.store.append(ConversationEntry::assistant(
            assistant_text.clone(),
            invocations.clone(),
        ))?;

        // Sequential, best-effort: a failing call does not stop the ones after it.
        for invocation in &invocations {
            emit_stream_update(
                stream_delta_tx,
                ConversationStreamUpdate::ToolCall {
                    name: invocation.name.clone(),
                    arguments: invocation.arguments.clone(),
                },
            );
            let output =
                ToolDispatcher::new(&mut self.session, &mut self.store).dispatch(invocation);
            emit_stream_update(
                stream_delta_tx,
                ConversationStreamUpdate::ToolResult {
                    name: invocation.name.clone(),
                    output: output.clone(),
                },
            );
            self.store
                .append(ConversationEntry::tool_result(invocation, output))?;
        }

        self.store.truncate(self.max_history_messages);
        self.state = DriverState::AwaitingInput;

        Ok(TurnSummary {
            assistant_text,
            tool_calls: invocations.len(),
            dropped_tool_calls: assembled.dropped.len(),
            finish_reason,
        })
    }

    async fn stream_reply(
        &self,
        stream_delta_tx: Option<&mpsc::UnboundedSender<ConversationStreamUpdate>>,
    ) -> Result<TurnAccumulator> {
        let messages = self.store.to_api_messages();
        let mut stream = self.client.create_stream(&messages).await?;
        let mut parser = StreamParser::new();
        let mut accumulator = TurnAccumulator::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            for event in parser.process(&chunk)? {
                accumulator.fold(event, stream_delta_tx);
            }
            if parser.is_done() {
                break;
            }
        }

        // A final event may lack its terminating blank line.
        for event in parser.process(b"\n\n")? {
            accumulator.fold(event, stream_delta_tx);
        }
        Ok(accumulator)
    }
}
