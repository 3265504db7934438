//! Pluggable I/O devices reachable from the `DoIO` instruction. Each device
//! interprets its own sub-protocol against the issuing core's operand stack.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cell::Cell;
use crate::core::Core;
use crate::fault::Fault;

pub const DEVICE_LIMIT: usize = 1 << 16;

/**
  One `DoIO` invocation. The instruction has already popped the device id; the
  handler pops a sub-command cell and then whatever further operands its contract
  requires, and may push results back. A handler may block on its underlying
  resource; it blocks only the issuing core.
*/
pub trait Device: Send {
  fn handle(&mut self, core: &mut Core) -> Result<(), Fault>;
}

/// Devices are shared across cores; each one carries its own lock so a device
/// blocked in a handler does not stall `DoIO` on unrelated devices.
pub type SharedDevice = Arc<Mutex<Box<dyn Device>>>;

pub struct DeviceTable {
  devices: HashMap<Cell, SharedDevice>
}

impl DeviceTable {

  pub fn new() -> DeviceTable {
    DeviceTable { devices: HashMap::new() }
  }

  /// Assigns the device the first free small integer id.
  pub fn register(&mut self, device: Box<dyn Device>) -> Result<Cell, Fault> {
    for id in 0..DEVICE_LIMIT as Cell {
      if self.devices.contains_key(&id) {
        continue;
      }
      self.devices.insert(id, Arc::new(Mutex::new(device)));
      return Ok(id);
    }
    Err(Fault::TableExhausted("device"))
  }

  pub fn get(&self, id: Cell) -> Result<SharedDevice, Fault> {
    self.devices.get(&id).cloned().ok_or(Fault::NoSuchDevice(id))
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  struct Inert;

  impl Device for Inert {
    fn handle(&mut self, _core: &mut Core) -> Result<(), Fault> {
      Ok(())
    }
  }

  #[test]
  fn ids_count_up_from_zero() {
    let mut table = DeviceTable::new();
    assert_eq!(table.register(Box::new(Inert)).unwrap(), 0);
    assert_eq!(table.register(Box::new(Inert)).unwrap(), 1);
    assert!(table.get(1).is_ok());
    assert!(matches!(table.get(2), Err(Fault::NoSuchDevice(2))));
  }
}
