/*!

  A multi-core bytecode virtual machine. Programs are sequences of 64 bit cells;
  each cell fetched as code is a bundle of four single-byte instructions. Cores are
  independently scheduled execution units with private registers and stacks that
  share a segmented memory space, a device table, and point-to-point rendezvous
  mailboxes.

  A host drives the machine through the loading interface:

  ```ignore
  let vm = Vm::new();
  let program = vm.load(&[
    Bundle::of([Opcode::Literal, Opcode::Literal, Opcode::Add, Opcode::Die]).to_cell(),
    3,
    4
  ])?;
  vm.spawn(program)?;
  vm.wait(); // until the last core terminates
  ```

  Faults are contained per core: a crashing core prints its id, the fault, and a
  full state dump, then unregisters; the rest of the machine keeps running.

*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod cell;
pub mod core;
pub mod device;
pub mod fault;
pub mod memory;
pub mod stack;
pub mod stream;
pub mod vm;

pub use crate::address::Address;
pub use crate::bytecode::{Bundle, Opcode};
pub use crate::cell::{Cell, NO, YES};
pub use crate::core::{Core, CoreId};
pub use crate::device::Device;
pub use crate::fault::Fault;
pub use crate::stream::{Stream, StreamDevice};
pub use crate::vm::Vm;
