use signal_hook::consts::{SIGINT, SIGTERM};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Blocks the calling thread until SIGINT or SIGTERM has been received.
pub struct SignalWaiter {
    terminate: Arc<AtomicBool>,
}

impl SignalWaiter {
    /// Register SIGINT and SIGTERM to raise the shared flag.
    pub fn install() -> std::io::Result<SignalWaiter> {
        let terminate = Arc::new(AtomicBool::new(false));
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&terminate))?;
        }
        Ok(SignalWaiter { terminate })
    }

    #[cfg(test)]
    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminate)
    }

    /// Poll once per second until a termination signal arrives.
    pub fn wait(&self) {
        println!("Waiting for termination. Press <CTRL-C> to terminate.");
        self.wait_with_poll(Duration::from_secs(1));
    }

    pub fn wait_with_poll(&self, poll: Duration) {
        while !self.terminate.load(Ordering::SeqCst) {
            std::thread::sleep(poll);
        }
        tracing::debug!("termination signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_wait_returns_once_flag_is_set() {
        let waiter = SignalWaiter::install().unwrap();
        let flag = waiter.flag();

        let setter = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        });

        let started = Instant::now();
        waiter.wait_with_poll(Duration::from_millis(10));
        setter.join().unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(waiter.flag().load(Ordering::SeqCst));
    }

    #[test]
    fn test_flag_starts_cleared() {
        let waiter = SignalWaiter::install().unwrap();
        assert!(!waiter.flag().load(Ordering::SeqCst));
    }
}
