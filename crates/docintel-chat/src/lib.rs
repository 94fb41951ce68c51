//! Conversation thread and question dispatch.
//!
//! The thread is an append-only log of user and assistant turns. The
//! dispatcher runs one question/answer round trip at a time against the
//! backend and always resolves it into a terminal assistant turn.

pub mod dispatch;
pub mod thread;

pub use dispatch::{DispatchOutcome, PendingQuestion, QueryDispatcher, SkipReason};
pub use thread::{ThreadStore, TurnPair};
