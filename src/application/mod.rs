// Application layer: the ledger service handle every client talks to.
// Validation and not-found reporting live here; storage stays a thin
// SQL mapping underneath.

pub mod error;
pub mod outcome;
pub mod service;

pub use error::*;
pub use outcome::*;
pub use service::*;
