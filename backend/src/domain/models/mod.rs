pub mod ledger;
pub mod offer;
pub mod rollup;

pub use ledger::*;
pub use offer::*;
pub use rollup::*;
