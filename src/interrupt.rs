use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot "move home" signal.  Command handlers only ever set it and the state machine
/// only ever clears it, so a request can't be lost between the two.
#[derive(Debug, Clone, Default)]
pub struct MoveHomeFlag {
  requested: Arc<AtomicBool>,
}

impl MoveHomeFlag {
  pub fn new() -> Self {
    Default::default()
  }

  /// Idempotent: a second request before the first is acted on is a no-op.
  pub fn request(&self) -> bool {
    !self.requested.swap(true, Ordering::AcqRel)
  }

  pub fn is_requested(&self) -> bool {
    self.requested.load(Ordering::Acquire)
  }

  pub(crate) fn take(&self) -> bool {
    self.requested.swap(false, Ordering::AcqRel)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_request_is_idempotent() {
    let flag = MoveHomeFlag::new();
    let commands = flag.clone();
    assert!(commands.request());
    assert!(!commands.request());
    assert!(flag.is_requested());
    assert!(flag.take());
    assert!(!flag.take());
    assert!(!commands.is_requested());
  }
}
