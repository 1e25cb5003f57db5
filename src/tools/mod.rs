pub mod assembler;
pub mod dispatcher;
pub mod editor;
pub mod git;
pub mod ingest;
pub mod invocation;
pub mod paths;
pub mod schema;

pub use assembler::{AssembledToolCalls, DroppedToolCall, ToolCallAssembler};
pub use dispatcher::{AddedContext, ToolDispatcher};
pub use invocation::{ToolInvocation, ToolRequest};
