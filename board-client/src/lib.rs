//! Board Client - HTTP, live subscription and optimistic state for the board server
//!
//! - [`HttpClient`]: REST calls, also the [`ReorderDispatch`] used by the mutator
//! - [`LiveSubscription`]: `/ws` connection yielding broadcast envelopes
//! - [`optimistic`]: local view, per-entity state and the optimistic mutator

pub mod config;
pub mod error;
pub mod http;
pub mod live;
pub mod optimistic;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use live::LiveSubscription;
pub use optimistic::{
    BoardView, DispatchFailure, DispatchHandle, DispatchOutcome, EntityState, OptimisticMutator,
    ReorderDispatch, SharedView,
};

// Re-export shared types for convenience
pub use shared::message::{BoardEvent, Envelope, Topic};
pub use shared::ordering::{MoveRequest, Slot};
