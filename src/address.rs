//! A `Cell` interpreted as a memory address: the high half names a segment, the low
//! half is an offset into it. Addresses are opaque to instructions; only the segment
//! table decodes them.

use std::fmt::{Display, Formatter};

use crate::cell::{Cell, HalfCell};

/// `(segment_id << 32) | offset`. Instructions manipulate addresses as raw cells,
/// so all arithmetic here wraps the way unchecked cell arithmetic does.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Address(Cell);

impl Address {

  pub fn new(segment: HalfCell, offset: HalfCell) -> Address {
    Address(((segment as Cell) << 32) | (offset as Cell))
  }

  pub fn from_cell(cell: Cell) -> Address {
    Address(cell)
  }

  pub fn to_cell(self) -> Cell {
    self.0
  }

  pub fn segment(self) -> HalfCell {
    ((self.0 >> 32) & 0xFFFF_FFFF) as HalfCell
  }

  pub fn offset(self) -> HalfCell {
    (self.0 & 0xFFFF_FFFF) as HalfCell
  }

  /// Steps the address forward by `n` words.
  pub fn advanced(self, n: Cell) -> Address {
    Address(self.0.wrapping_add(n))
  }

  /// Steps the address back by `n` words. Jump targets are stored one word early to
  /// compensate for the post-bundle increment of the run loop.
  pub fn retreated(self, n: Cell) -> Address {
    Address(self.0.wrapping_sub(n))
  }

}

impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}::{}", self.segment(), self.offset())
  }
}
