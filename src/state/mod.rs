pub mod context;
pub mod conversation;
pub mod entry;
pub mod session;

pub use context::ContextStore;
pub use conversation::{ConversationDriver, ConversationStreamUpdate, DriverState, TurnSummary};
pub use entry::{ConversationEntry, Role};
pub use session::Session;
