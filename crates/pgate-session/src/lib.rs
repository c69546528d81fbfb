//! Session actor for the trade popup gate.
//!
//! One tokio task owns the `PopupRegistry` and processes launches,
//! completion events and expiries strictly one at a time, so every
//! registry read-modify-write is atomic relative to other events.
//!
//! ```text
//!  signal ──► SessionHandle::launch ──┐
//!  event  ──► SessionHandle::deliver ─┼──► mpsc ──► SessionTask ──► PopupRegistry
//!  timer  ──► SessionMsg::Expire ─────┘                 │
//!                                                       └──► broadcast<SessionEvent>
//! ```

pub mod actor;
pub mod error;
pub mod events;

pub use actor::{spawn_session, SessionExpiryScheduler, SessionHandle, SessionMsg, SessionTask};
pub use error::{SessionError, SessionResult};
pub use events::SessionEvent;
