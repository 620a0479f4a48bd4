//! Structured logging.
//!
//! Grounded on `runtime/Cargo.toml`'s `slog`/`slog-json`/`slog-scope`/
//! `slog-stdlog` stack; the bare `log`-crate-backed `EkidenLogger` in
//! `enclave/logger/src/lib.rs` is the SGX-only ancestor of this and is not
//! carried forward outside the enclave loader, which is out of scope here.
use slog::{Drain, Logger};

lazy_static::lazy_static! {
    static ref ROOT_LOGGER: Logger = {
        let drain = slog_json::Json::new(std::io::stdout())
            .add_default_keys()
            .build()
            .fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!("component" => "oasis-core"))
    };
}

/// Get a logger for the given module path, as a child of the process root
/// logger so every component's log lines share the same JSON sink.
pub fn get_logger(module: &'static str) -> Logger {
    ROOT_LOGGER.new(o!("module" => module))
}

/// Install the root logger as the global destination for the standard
/// `log` crate macros, so dependencies that only know `log::info!` etc.
/// still end up in the same structured sink.
pub fn init_stdlog_bridge() {
    let _guard = slog_scope::set_global_logger(ROOT_LOGGER.clone());
    std::mem::forget(_guard);
    slog_stdlog::init().ok();
}
