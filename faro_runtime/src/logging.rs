/// Initialize env_logger from `RUST_LOG`. Safe to call more than once; later
/// calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .try_init();
}
