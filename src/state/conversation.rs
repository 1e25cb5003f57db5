mod core;
mod state;
mod streaming;

#[cfg(test)]
mod tests;

pub use state::{
    ConversationDriver, ConversationStreamUpdate, DriverState, TurnSummary, SYSTEM_PROMPT,
};
pub use streaming::TurnAccumulator;
