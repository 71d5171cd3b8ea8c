//! Subcommand implementations

mod mint;
mod sale;
mod serve;

pub use mint::mint;
pub use sale::{account, breakdown, progress, quote, status};
pub use serve::serve;
