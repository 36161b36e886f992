//! Application core: explicit state, the reducer, the effect runtime and a text view.

mod runtime;
mod state;
pub mod view;

pub use runtime::{Runtime, RuntimeSettings};
pub use state::{
    reduce, AppState, CopyTarget, Effect, Event, Notice, NoticeKind, RequestId, Status,
    SETUP_PROMPT,
};
