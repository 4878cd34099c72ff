pub mod bus;
pub mod config;
pub mod errors;
pub mod events;
pub mod history;
pub mod host;
pub mod persist;
pub mod provider;
pub mod registry;
pub mod session;
pub mod snapshot;

pub use config::EngineConfig;
pub use errors::EngineError;
pub use provider::BackendKind;
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{DrawingMode, Session, SessionOptions};
