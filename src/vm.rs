//! Machine-wide state and lifecycle: the segment table, the live-core registry, the
//! device table, and the single-fire shutdown signal. Cores share all three tables;
//! each table sits behind one lock, so any core may touch any segment, device, or
//! mailbox by id while the registries themselves stay consistent.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::address::Address;
use crate::cell::Cell;
use crate::core::{Core, CoreId};
use crate::device::{Device, DeviceTable, SharedDevice};
use crate::fault::Fault;
use crate::memory::SegmentTable;

pub const CORE_LIMIT: usize = 1 << 16;

/// Locks a table even if a panicking thread poisoned it; the registries hold no
/// invariants a fault can break mid-update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The live-core registry and the shutdown signal share one lock: the signal must
/// fire exactly once, on the transition to an empty registry, and deciding that
/// and sending it have to be atomic.
struct CoreTable {
  mailboxes   : HashMap<CoreId, SyncSender<Cell>>,
  shutdown_tx : Option<Sender<()>>
}

pub struct Vm {
  memory      : Mutex<SegmentTable>,
  cores       : Mutex<CoreTable>,
  devices     : Mutex<DeviceTable>,
  shutdown_rx : Mutex<Receiver<()>>
}

impl Vm {

  pub fn new() -> Arc<Vm> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    Arc::new(Vm {
      memory      : Mutex::new(SegmentTable::new()),
      cores       : Mutex::new(CoreTable {
                      mailboxes: HashMap::new(),
                      shutdown_tx: Some(shutdown_tx)
                    }),
      devices     : Mutex::new(DeviceTable::new()),
      shutdown_rx : Mutex::new(shutdown_rx)
    })
  }

  // region Memory

  pub fn alloc(&self, size: Cell) -> Result<Address, Fault> {
    lock(&self.memory).alloc(size)
  }

  pub fn free(&self, address: Address) {
    lock(&self.memory).free(address)
  }

  pub fn resize(&self, address: Address, new_size: Cell) -> Result<(), Fault> {
    lock(&self.memory).resize(address, new_size)
  }

  pub fn read(&self, address: Address) -> Result<Cell, Fault> {
    lock(&self.memory).read(address)
  }

  pub fn write(&self, address: Address, value: Cell) -> Result<(), Fault> {
    lock(&self.memory).write(address, value)
  }

  /// Allocates a segment and fills it with `cells`: the program-loading interface.
  /// A host loads packed bundles and literal operands, then spawns a core at the
  /// returned base address.
  pub fn load(&self, cells: &[Cell]) -> Result<Address, Fault> {
    let mut memory = lock(&self.memory);
    let base = memory.alloc(cells.len() as Cell)?;
    for (i, cell) in cells.iter().enumerate() {
      memory.write(base.advanced(i as Cell), *cell)?;
    }
    Ok(base)
  }

  // endregion

  // region Devices

  /// Assigns the device the first free small integer id.
  pub fn register_device(&self, device: Box<dyn Device>) -> Result<Cell, Fault> {
    lock(&self.devices).register(device)
  }

  pub(crate) fn device(&self, id: Cell) -> Result<SharedDevice, Fault> {
    lock(&self.devices).get(id)
  }

  // endregion

  // region Core lifecycle

  /**
    Creates a core with zeroed registers and stacks, its instruction pointer at
    `at`, registers it, and launches its run loop on its own thread. Returns the
    new core's id immediately; activation is asynchronous.

    The thread owns the core for its whole life. On exit (`Die`, or any fault) it
    reports a diagnostic (silently for `Die`) and unregisters, so the live-core
    count stays accurate and shutdown detection keeps working. A fault in one core
    never touches another core's state.
  */
  pub fn spawn(self: &Arc<Self>, at: Address) -> Result<CoreId, Fault> {
    let (mailbox_tx, mailbox_rx) = mpsc::sync_channel(0);

    let id = {
      let mut table = lock(&self.cores);
      let id = first_free_core_id(&table.mailboxes)?;
      table.mailboxes.insert(id, mailbox_tx);
      id
    };

    let mut core = Core::new(Arc::clone(self), id, at, mailbox_rx);
    let vm = Arc::clone(self);
    let launched =
      thread::Builder::new()
        .name(format!("core-{}", id))
        .spawn(move || {
          log::debug!("core {} started at {}", core.id(), at);
          match core.run() {
            Fault::DieSignal => {
              log::debug!("core {} terminated", core.id());
            }
            fault => {
              // The crash report goes to stderr unconditionally; a host may not
              // have wired up a logger.
              eprintln!("core {} crashed: {}\n{}", core.id(), fault, core);
              log::error!("core {} crashed: {}", core.id(), fault);
            }
          }
          vm.unregister(core.id());
        });

    if let Err(error) = launched {
      // The thread never existed, so take its registration back out.
      lock(&self.cores).mailboxes.remove(&id);
      return Err(Fault::SpawnFailed(error));
    }
    Ok(id)
  }

  /// Removes the core from the live registry. On the transition to an empty
  /// registry the shutdown signal fires, exactly once, without blocking the
  /// terminating core: the channel is buffered and the sender is consumed.
  pub(crate) fn unregister(&self, id: CoreId) {
    let mut table = lock(&self.cores);
    table.mailboxes.remove(&id);
    if table.mailboxes.is_empty() {
      if let Some(shutdown_tx) = table.shutdown_tx.take() {
        // Nobody waiting is fine; the signal sits in the channel buffer.
        let _ = shutdown_tx.send(());
      }
    }
  }

  /// Delivers `message` to the target core's mailbox, blocking until the target
  /// is ready to receive (rendezvous). Fails instead of hanging when the target
  /// does not exist or terminates mid-rendezvous.
  pub fn send(&self, target: CoreId, message: Cell) -> Result<(), Fault> {
    let mailbox =
      lock(&self.cores)
        .mailboxes
        .get(&target)
        .cloned()
        .ok_or(Fault::NoSuchCore(target))?;
    // The table lock is released; only this sender blocks on the rendezvous.
    mailbox.send(message).map_err(|_| Fault::MailboxClosed(target))
  }

  pub fn live_cores(&self) -> usize {
    lock(&self.cores).mailboxes.len()
  }

  /// Blocks until every core has terminated. Returns immediately if the signal
  /// already fired.
  pub fn wait(&self) {
    let shutdown_rx = lock(&self.shutdown_rx);
    let _ = shutdown_rx.recv();
  }

  // endregion

}

fn first_free_core_id(mailboxes: &HashMap<CoreId, SyncSender<Cell>>) -> Result<CoreId, Fault> {
  for id in 0..CORE_LIMIT as CoreId {
    if !mailboxes.contains_key(&id) {
      return Ok(id);
    }
  }
  Err(Fault::TableExhausted("core"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sending_to_an_unknown_core_faults() {
    let vm = Vm::new();
    assert!(matches!(vm.send(12, 99), Err(Fault::NoSuchCore(12))));
  }

  #[test]
  fn load_fills_a_fresh_segment() {
    let vm = Vm::new();
    let base = vm.load(&[10, 20, 30]).unwrap();
    assert_eq!(vm.read(base).unwrap(), 10);
    assert_eq!(vm.read(base.advanced(2)).unwrap(), 30);
    assert!(matches!(vm.read(base.advanced(3)), Err(Fault::OutOfRange(_))));
  }
}
