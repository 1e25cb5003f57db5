use super::logging::emit_sse_parse_error;
use crate::types::{ChatChunk, StreamEvent};
use anyhow::Result;

#[derive(Default)]
pub struct StreamParser {
    /// Raw bytes not yet terminated by a blank line. Frames are decoded only once complete,
    /// so a multi-byte character split across chunks survives.
    buffer: Vec<u8>,
    done: bool,
}

fn frame_end(buffer: &[u8], from: usize) -> Option<usize> {
    buffer[from..]
        .windows(2)
        .position(|pair| pair == b"\n\n".as_slice())
        .map(|offset| from + offset + 2)
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>> {
        // JSON payloads escape carriage returns, so every raw CR is framing.
        self.buffer
            .extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut events = Vec::new();
        let mut start = 0;

        while let Some(event_end) = frame_end(&self.buffer, start) {
            let event_text = String::from_utf8_lossy(&self.buffer[start..event_end]);

            let mut event_type = None;
            let mut data_lines = Vec::new();
            for line in event_text.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    event_type = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data_lines.push(rest.trim());
                }
            }

            if !data_lines.is_empty() {
                let json_data = data_lines.join("\n");
                if json_data == "[DONE]" {
                    self.done = true;
                } else {
                    match serde_json::from_str::<ChatChunk>(&json_data) {
                        Ok(chunk) => events.extend(chunk.into_events()),
                        Err(e) => emit_sse_parse_error(event_type.as_deref(), &json_data, &e),
                    }
                }
            }

            start = event_end;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(events)
    }

    pub fn flush(&mut self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned()
    }
}
