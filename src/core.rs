//! One concurrent execution unit: a private register file, two bounded stacks, an
//! instruction pointer, and a mailbox. The run loop fetches one bundle per memory
//! word and dispatches its four sub-instructions in turn.

use std::fmt::{Display, Formatter};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use prettytable::{format as TableFormat, Table};

use crate::address::Address;
use crate::bytecode::{Bundle, Opcode};
use crate::cell::{cond, Cell, NO};
use crate::fault::Fault;
use crate::stack::Stack;
use crate::vm::{lock, Vm};

pub type CoreId = Cell;

pub const REGISTER_COUNT      : usize = 24;
pub const DATA_STACK_DEPTH    : usize = 32;
pub const ADDRESS_STACK_DEPTH : usize = 256;

pub struct Core {
  vm        : Arc<Vm>,
  id        : CoreId,
  registers : [Cell; REGISTER_COUNT],
  data      : Stack,             // Operand stack
  address   : Stack,             // Return/address stack
  ip        : Address,
  mailbox   : Receiver<Cell>
}

impl Core {

  pub(crate) fn new(vm: Arc<Vm>, id: CoreId, at: Address, mailbox: Receiver<Cell>) -> Core {
    Core {
      vm,
      id,
      registers : [NO; REGISTER_COUNT],
      data      : Stack::new("data", DATA_STACK_DEPTH),
      address   : Stack::new("address", ADDRESS_STACK_DEPTH),
      ip        : at,
      mailbox
    }
  }

  pub fn id(&self) -> CoreId {
    self.id
  }

  pub fn ip(&self) -> Address {
    self.ip
  }

  // Device handlers reach the issuing core's operand stack through these.

  pub fn push_data(&mut self, value: Cell) -> Result<(), Fault> {
    self.data.push(value)
  }

  pub fn pop_data(&mut self) -> Result<Cell, Fault> {
    self.data.pop()
  }

  pub fn push_address(&mut self, value: Cell) -> Result<(), Fault> {
    self.address.push(value)
  }

  pub fn pop_address(&mut self) -> Result<Cell, Fault> {
    self.address.pop()
  }

  /**
    Fetches the bundle at the instruction pointer, dispatches its four
    sub-instructions, and advances the pointer by one word.

    A control-flow instruction inside the bundle does not short-circuit the
    remaining sub-instructions: they execute against the redirected state, and the
    redirection takes effect at the next fetch. Jump targets compensate by landing
    one word early (see `Opcode::Jump`).
  */
  pub(crate) fn step(&mut self) -> Result<(), Fault> {
    let bundle = Bundle::from_cell(self.vm.read(self.ip)?);
    for byte in bundle.bytes().iter() {
      let opcode = Opcode::decode(*byte)?;
      self.dispatch(opcode)?;
    }
    self.ip = self.ip.advanced(1);
    Ok(())
  }

  /// Runs until a fault ends this core. `Fault::DieSignal` is the clean exit.
  pub(crate) fn run(&mut self) -> Fault {
    loop {
      if let Err(fault) = self.step() {
        return fault;
      }
    }
  }

  /// Executes one instruction against this core's state. Binary operations pop
  /// `right` then `left`, so the second-popped value is the left operand.
  pub(crate) fn dispatch(&mut self, opcode: Opcode) -> Result<(), Fault> {
    #[cfg(feature = "trace_execution")]
    println!("core {}: {} at {}", self.id, opcode, self.ip);

    match opcode {

      Opcode::Nop => {}

      Opcode::Literal => {
        // The operand occupies the word after the bundle; leave the pointer on it
        // so the post-bundle increment skips it.
        self.ip = self.ip.advanced(1);
        let value = self.vm.read(self.ip)?;
        self.data.push(value)?;
      }

      Opcode::Dup => {
        let top = self.data.pop()?;
        self.data.push(top)?;
        self.data.push(top)?;
      }

      Opcode::Drop => {
        self.data.pop()?;
      }

      Opcode::Swap => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(a)?;
        self.data.push(b)?;
      }

      Opcode::Push => {
        let value = self.data.pop()?;
        self.address.push(value)?;
      }

      Opcode::Pop => {
        let value = self.address.pop()?;
        self.data.push(value)?;
      }

      Opcode::Jump => {
        // One word early: the run loop's post-bundle increment lands on the target.
        self.ip = Address::from_cell(self.data.pop()?).retreated(1);
      }

      Opcode::CondJump => {
        let target = self.data.pop()?;
        let flag   = self.data.pop()?;
        if flag != NO {
          self.ip = Address::from_cell(target).retreated(1);
        }
      }

      Opcode::Call => {
        self.address.push(self.ip.to_cell())?;
        self.ip = Address::from_cell(self.data.pop()?).retreated(1);
      }

      Opcode::CondCall => {
        let target = self.data.pop()?;
        let flag   = self.data.pop()?;
        if flag != NO {
          self.address.push(self.ip.to_cell())?;
          self.ip = Address::from_cell(target).retreated(1);
        }
      }

      Opcode::Ret => {
        self.ip = Address::from_cell(self.address.pop()?);
      }

      Opcode::RetIfZero => {
        if self.data.peek()? == NO {
          self.data.pop()?;
          self.ip = Address::from_cell(self.address.pop()?);
        }
      }

      Opcode::Equal => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(cond(b == a))?;
      }

      Opcode::NotEqual => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(cond(b != a))?;
      }

      Opcode::LessThan => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(cond(b < a))?;
      }

      Opcode::GreaterThan => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(cond(b > a))?;
      }

      Opcode::Fetch => {
        let address = Address::from_cell(self.data.pop()?);
        let value = self.vm.read(address)?;
        self.data.push(value)?;
      }

      Opcode::Store => {
        let address = Address::from_cell(self.data.pop()?);
        let value = self.data.pop()?;
        self.vm.write(address, value)?;
      }

      Opcode::Add => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(b.wrapping_add(a))?;
      }

      Opcode::Subtract => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(b.wrapping_sub(a))?;
      }

      Opcode::Multiply => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(b.wrapping_mul(a))?;
      }

      Opcode::DivideRemainder => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        if a == NO {
          self.data.push(NO)?;
          self.data.push(NO)?;
        } else {
          // Remainder first; the quotient ends up on top.
          self.data.push(b % a)?;
          self.data.push(b / a)?;
        }
      }

      Opcode::And => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(b & a)?;
      }

      Opcode::Or => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(b | a)?;
      }

      Opcode::Xor => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        self.data.push(b ^ a)?;
      }

      Opcode::ShiftLeft => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        let shifted = if a < 64 { b << a } else { NO };
        self.data.push(shifted)?;
      }

      Opcode::ShiftRight => {
        let a = self.data.pop()?;
        let b = self.data.pop()?;
        let shifted = if a < 64 { b >> a } else { NO };
        self.data.push(shifted)?;
      }

      Opcode::Alloc => {
        let size = self.data.pop()?;
        let address = self.vm.alloc(size)?;
        self.data.push(address.to_cell())?;
      }

      Opcode::ResizeSegment => {
        let size = self.data.pop()?;
        let address = Address::from_cell(self.data.pop()?);
        self.vm.resize(address, size)?;
        self.data.push(address.to_cell())?;
      }

      Opcode::Free => {
        let address = Address::from_cell(self.data.pop()?);
        self.vm.free(address);
      }

      Opcode::Spawn => {
        let at = Address::from_cell(self.data.pop()?);
        let id = self.vm.spawn(at)?;
        self.data.push(id)?;
      }

      Opcode::Send => {
        let target  = self.data.pop()?;
        let message = self.data.pop()?;
        self.vm.send(target, message)?;
      }

      Opcode::Recv => {
        let message =
          self.mailbox
              .recv()
              .map_err(|_| Fault::MailboxClosed(self.id))?;
        self.data.push(message)?;
      }

      Opcode::ReadRegister => {
        let index = self.data.pop()?;
        let value =
          *self.registers
               .get(index as usize)
               .ok_or(Fault::BadRegister(index))?;
        self.data.push(value)?;
      }

      Opcode::WriteRegister => {
        let index = self.data.pop()?;
        let value = self.data.pop()?;
        let register =
          self.registers
              .get_mut(index as usize)
              .ok_or(Fault::BadRegister(index))?;
        *register = value;
      }

      Opcode::DoIO => {
        let id = self.data.pop()?;
        // Clone the handle out of the table so a blocking device holds only its
        // own lock, not the table's.
        let device = self.vm.device(id)?;
        let mut device = lock(&*device);
        device.handle(self)?;
      }

      Opcode::Die => {
        return Err(Fault::DieSignal);
      }

      Opcode::Compare => {
        let length = self.data.pop()?;
        let dest   = Address::from_cell(self.data.pop()?);
        let src    = Address::from_cell(self.data.pop()?);
        let mut equal = true;
        for i in 0..length {
          if self.vm.read(dest.advanced(i))? != self.vm.read(src.advanced(i))? {
            equal = false;
            break;
          }
        }
        self.data.push(cond(equal))?;
      }

      Opcode::Copy => {
        let length = self.data.pop()?;
        let dest   = Address::from_cell(self.data.pop()?);
        let src    = Address::from_cell(self.data.pop()?);
        for i in 0..length {
          let value = self.vm.read(src.advanced(i))?;
          self.vm.write(dest.advanced(i), value)?;
        }
      }

      Opcode::Dbg => {
        eprintln!("{}", self);
      }

      Opcode::Invalid => {
        return Err(Fault::InvalidOpcode(opcode.code()));
      }

    }
    Ok(())
  }

  fn make_cell_table(label: &str, cells: &[Cell]) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Slot", ubl->"Contents"]);
    for (i, cell) in cells.iter().enumerate() {
      table.add_row(row![r->format!("{}[{}] =", label, i), format!("{}", cell)]);
    }
    table
  }

}

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

/// The full state dump emitted by the `Dbg` opcode and by crash reports: all
/// registers, both stacks bottom-to-top, and the instruction pointer.
impl Display for Core {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let r_table = Core::make_cell_table("R", &self.registers);
    let d_table = Core::make_cell_table("D", self.data.cells());
    let a_table = Core::make_cell_table("A", self.address.cells());

    let mut combined_table = table!([r_table, d_table, a_table]);
    combined_table.set_titles(row![ub->"Registers", ub->"Data Stack", ub->"Address Stack"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "Core {} at {}\n{}", self.id, self.ip, combined_table)
  }
}
