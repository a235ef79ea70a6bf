//! Interactive deck assistant
//!
//! Multi-turn chat over an in-memory deck. The model edits pages through a
//! small set of tools and its prose is streamed back to the caller.

pub mod core;
pub mod document;
pub mod gate;
pub mod tools;
pub mod working_memory;

pub use self::core::{ChatAssistant, ChatReply, ToolInvocation};
pub use document::DeckDocument;
pub use gate::StreamGate;
pub use tools::DeckTools;
pub use working_memory::WorkingMemory;
