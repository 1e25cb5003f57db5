pub mod api;

pub use api::{
    ChatChunk, ChatMessage, ChunkChoice, ChunkDelta, FunctionDelta, PartialToolCallFragment,
    StreamEvent, ToolCallDelta, WireFunction, WireToolCall,
};
