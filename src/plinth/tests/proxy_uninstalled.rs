//! Runs as its own process so no other test can install the shared
//! container first.

use plinth::proxy::{App, ProxyError};

#[test]
fn proxies_fail_before_any_application_boots() {
    assert!(!plinth::booted());

    assert!(matches!(App::current(), Err(ProxyError::NullContainer)));
    assert!(matches!(plinth::app(), Err(ProxyError::NullContainer)));
}
