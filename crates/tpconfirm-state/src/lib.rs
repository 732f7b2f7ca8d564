//! In-memory shared state of the confirmation engine.
//!
//! Each store is internally synchronized; single-key operations are atomic
//! and safe to call from the main context and from transport callbacks alike.

pub mod bypass;
pub mod pending;
pub mod session;

pub use bypass::BypassWindow;
pub use pending::{PendingRequest, PendingRequestStore};
pub use session::{Session, SessionTracker};
