mod amount;
mod category;
mod entry;
mod filter;
mod ledger;

pub use amount::*;
pub use category::*;
pub use entry::*;
pub use filter::*;
pub use ledger::*;
