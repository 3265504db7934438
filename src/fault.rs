//! The fault taxonomy. Every fault is fatal to the core that raised it and to that
//! core only: the run loop catches it at its boundary, reports a diagnostic (except
//! for `DieSignal`), and de-registers the core. Nothing here propagates to other
//! cores or to the machine-wide tables.

use crate::address::Address;
use crate::cell::Cell;

#[derive(Debug, thiserror::Error)]
pub enum Fault {
  /// The offset is past the end of the segment, or the segment does not exist.
  #[error("out of bounds access at {0}")]
  OutOfRange(Address),

  /// A message was addressed to a core id that is not registered. Cores that have
  /// terminated are unregistered, so sending to a dead core fails instead of
  /// blocking forever.
  #[error("no core with id {0}")]
  NoSuchCore(Cell),

  /// The target core terminated while the rendezvous was in progress.
  #[error("mailbox of core {0} closed")]
  MailboxClosed(Cell),

  #[error("no device with id {0}")]
  NoSuchDevice(Cell),

  /// The byte-stream device has no peer registered under this handle.
  #[error("no stream with handle {0}")]
  NoSuchStream(Cell),

  /// No free id below the table's bound. Ids are reused, so this means 2^16 live
  /// entries at once.
  #[error("{0} table exhausted")]
  TableExhausted(&'static str),

  #[error("{0} stack overflow")]
  StackOverflow(&'static str),

  #[error("{0} stack underflow")]
  StackUnderflow(&'static str),

  #[error("register index {0} out of range")]
  BadRegister(Cell),

  /// The reserved invalid marker, or any unassigned opcode byte.
  #[error("invalid opcode {0:#04x}")]
  InvalidOpcode(u8),

  #[error("device failure: {0}")]
  DeviceFailure(#[from] std::io::Error),

  /// The host OS refused the thread for a new core. Raised at `spawn`, before the
  /// core ever runs.
  #[error("core thread could not be launched: {0}")]
  SpawnFailed(std::io::Error),

  /// Not an error: the `Die` instruction requesting clean, silent termination.
  #[error("die instruction ran")]
  DieSignal
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spawn_failure_is_not_reported_as_device_io() {
    let error = std::io::Error::new(std::io::ErrorKind::Other, "thread limit reached");
    let fault = Fault::SpawnFailed(error);
    assert_eq!(
      format!("{}", fault),
      "core thread could not be launched: thread limit reached"
    );
  }
}
