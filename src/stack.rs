//! A bounded LIFO of `Cell`s, used for each core's 32-deep operand stack and
//! 256-deep return/address stack. Overflow and underflow raise faults instead of
//! silently corrupting adjacent core state.

use crate::cell::Cell;
use crate::fault::Fault;

pub struct Stack {
  name     : &'static str,
  capacity : usize,
  cells    : Vec<Cell>
}

impl Stack {

  pub fn new(name: &'static str, capacity: usize) -> Stack {
    Stack {
      name,
      capacity,
      cells: Vec::with_capacity(capacity)
    }
  }

  pub fn push(&mut self, value: Cell) -> Result<(), Fault> {
    if self.cells.len() == self.capacity {
      return Err(Fault::StackOverflow(self.name));
    }
    self.cells.push(value);
    Ok(())
  }

  pub fn pop(&mut self) -> Result<Cell, Fault> {
    self.cells.pop().ok_or(Fault::StackUnderflow(self.name))
  }

  /// The top of the stack without popping it. `RetIfZero` peeks before it commits
  /// to popping.
  pub fn peek(&self) -> Result<Cell, Fault> {
    self.cells.last().copied().ok_or(Fault::StackUnderflow(self.name))
  }

  pub fn depth(&self) -> usize {
    self.cells.len()
  }

  /// The live cells, bottom first. Used by the state dump.
  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pushes_and_pops_in_lifo_order() {
    let mut stack = Stack::new("data", 4);
    stack.push(1).unwrap();
    stack.push(2).unwrap();
    assert_eq!(stack.peek().unwrap(), 2);
    assert_eq!(stack.pop().unwrap(), 2);
    assert_eq!(stack.pop().unwrap(), 1);
  }

  #[test]
  fn overflow_is_a_fault() {
    let mut stack = Stack::new("data", 2);
    stack.push(1).unwrap();
    stack.push(2).unwrap();
    match stack.push(3) {
      Err(Fault::StackOverflow("data")) => {},
      other => panic!("expected overflow, got {:?}", other)
    }
    // The stack itself is untouched.
    assert_eq!(stack.depth(), 2);
  }

  #[test]
  fn underflow_is_a_fault() {
    let mut stack = Stack::new("address", 2);
    match stack.pop() {
      Err(Fault::StackUnderflow("address")) => {},
      other => panic!("expected underflow, got {:?}", other)
    }
  }
}
