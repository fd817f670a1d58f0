#![allow(dead_code, unused_imports)]

pub use sitepipe_test_utils::builders;
pub use sitepipe_test_utils::fake_executor;
pub use sitepipe_test_utils::{init_tracing, with_timeout};

use std::path::PathBuf;

/// The `Sitepipe.toml` shipped at the repository root.
pub fn shipped_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Sitepipe.toml")
}
