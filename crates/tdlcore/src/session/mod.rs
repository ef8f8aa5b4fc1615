//! Per-link download sessions and the button payloads that address them

mod callback;
mod id;
mod store;

pub use callback::{CallbackAction, CallbackPayload, MAX_CALLBACK_DATA_LEN, PAYLOAD_SEPARATOR};
pub use id::SessionId;
pub use store::{PageMove, Session, SessionState, SessionStore};
