#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Server adapter hosting Pit Defence sessions.
//!
//! Each session runs in its own task at a fixed tick rate. Commands arrive
//! through a bounded inbox, snapshots leave through a watch channel and the
//! finished session is written to a [`SessionStore`].

pub mod ascii;
pub mod autopilot;
pub mod config;
pub mod headless;
pub mod registry;
pub mod runtime;
pub mod seeds;
pub mod session;
pub mod store;

pub use config::{ConfigError, ServerConfig};
pub use registry::SessionRegistry;
pub use runtime::{spawn_session, SessionError, SessionHandle, SessionReport};
pub use session::Session;
pub use store::{InMemoryStore, SessionDocument, SessionStore};
