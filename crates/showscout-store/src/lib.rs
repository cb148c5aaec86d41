//! Show records and the row-store surface the showscout engine reads from.
//!
//! The engine never writes. Everything it needs from the outside world goes
//! through [`ShowStore`]: a filtered table scan plus a handful of optional
//! remote functions, any of which may be missing or broken at runtime.

pub mod memory;
pub mod model;
#[cfg(feature = "rest")]
pub mod rest;
pub mod store;
pub mod test_data;

pub use error::{Result, StoreError};
pub use memory::{FunctionBehaviour, InMemoryStore, StoreCall};
pub use model::{Coordinate, DateWindow, RawGeometry, ShowRecord, ShowStatus};
#[cfg(feature = "rest")]
pub use rest::{PostgrestConfig, PostgrestStore};
pub use store::{RemoteArgs, RemoteFunction, ShowQuery, ShowStore};

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum StoreError {
        #[cfg(feature = "rest")]
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("Remote returned status {status}: {body}")]
        Status { status: u16, body: String },
        #[error("Malformed response: {0}")]
        Decode(#[from] serde_json::Error),
        #[error("Remote function '{0}' is not available on this store")]
        Unsupported(&'static str),
        #[error("Store unavailable: {0}")]
        Unavailable(String),
        #[error("Store configuration error: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, StoreError>;
}
