//! Command handlers for CLI subcommands

mod sync;
mod utils;
mod validate;

pub use sync::handle_sync;
pub use validate::handle_validate;
