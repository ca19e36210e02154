// Messaging module - inbound message classification and dispatch
pub mod event;
pub mod router;

pub use event::{DataAction, MessageType};
pub use router::{DispatchOutcome, MessageDispatcher};
