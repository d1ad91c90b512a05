//! Configuration is split into:
//! - `types.rs` (data structures + defaults)
//! - `load.rs`  (IO: config file, `.env`, env overrides)

mod load;
mod types;

pub use load::{apply_env_overrides, load_default, load_from, validate};
pub use types::*;
