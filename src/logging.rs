//! Logging setup.
//!
//! The tree itself only ever calls into the `log` facade ([`log::trace`],
//! [`log::debug`], [`log::warn`]) — it never initializes a logger. Binaries
//! embedding this crate are free to wire up whatever logger they like;
//! [`init`] is a convenience for the common case of just wanting
//! `env_logger` with a sensible default filter.

/// Initializes `env_logger` from the `FOLDERTREE_LOG` environment variable,
/// defaulting to `"info"` if unset. Safe to call more than once; only the
/// first call has an effect.
#[cfg(feature = "init_env_logger")]
pub fn init() {
    let _ = env_logger::Builder::new()
        .parse_filters(&std::env::var("FOLDERTREE_LOG").unwrap_or_else(|_| "info".to_owned()))
        .try_init();
}
