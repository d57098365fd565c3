//! Exercises the logging wrappers the server/client loops call into.

use pmu_sync::logging::{init_logger, log_debug, log_error, log_info, log_warn};

#[test]
fn logging_helpers_do_not_panic() {
    log_error("this is an error message");
    log_warn("this is a warning message");
    log_info("this is an info message");
    log_debug("this is a debug message");
}

#[test]
fn init_logger_does_not_panic() {
    init_logger();
}
