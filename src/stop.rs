use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Cooperative cancellation check, polled once before every page fetch.
pub trait StopSignal {
    fn should_stop(&self) -> bool;
}

/// Never asks the scrape to stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn should_stop(&self) -> bool {
        false
    }
}

impl StopSignal for CancellationToken {
    fn should_stop(&self) -> bool {
        self.is_cancelled()
    }
}

impl StopSignal for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Plain predicates, e.g. `|| flag.load(Ordering::Relaxed)`.
impl<F: Fn() -> bool> StopSignal for F {
    fn should_stop(&self) -> bool {
        self()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_closure_signal() {
        let calls = Cell::new(0);
        let stop = || {
            calls.set(calls.get() + 1);
            calls.get() > 2
        };
        assert!(!stop.should_stop());
        assert!(!stop.should_stop());
        assert!(stop.should_stop());
    }

    #[test]
    fn test_token_and_flag() {
        let token = CancellationToken::new();
        let child = token.clone();
        assert!(!child.should_stop());
        token.cancel();
        assert!(child.should_stop());

        let flag = AtomicBool::new(false);
        assert!(!flag.should_stop());
        flag.store(true, Ordering::Relaxed);
        assert!(flag.should_stop());
        assert!(!NeverStop.should_stop());
    }
}
