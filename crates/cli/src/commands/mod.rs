//! Command implementations.

mod run;
mod validate;

pub use run::{prepare_blueprint, run_server};
pub use validate::run_validate;
