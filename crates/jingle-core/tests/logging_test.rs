//! Global subscriber installation
//!
//! Kept in its own test binary: installing a global subscriber would leak
//! log output into every other test sharing the process.

use serial_test::serial;
use tracing::Level;

use jingle_core::{setup_logging, CallError, LoggingConfig};

#[test]
#[serial]
fn test_second_install_is_an_error() {
    let config = LoggingConfig::new(Level::WARN).with_file_info();
    assert!(setup_logging(config.clone()).is_ok());

    assert!(matches!(
        setup_logging(config.with_json()),
        Err(CallError::Configuration { .. })
    ));
}
