//! Packing and unpacking of instruction bundles: one memory word holding four
//! opcode bytes, byte 0 first-executed.

use std::fmt::{Display, Formatter};

use super::Opcode;
use crate::cell::Cell;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Bundle(Cell);

impl Bundle {

  /// Packs four opcode bytes into one word, `a` executing first.
  pub fn pack(a: u8, b: u8, c: u8, d: u8) -> Bundle {
    Bundle(
        (a as Cell)
      | (b as Cell) << 8
      | (c as Cell) << 16
      | (d as Cell) << 24
    )
  }

  /// Packs four opcodes, first-executed first. Convenience for hosts assembling
  /// programs by hand.
  pub fn of(ops: [Opcode; 4]) -> Bundle {
    Bundle::pack(ops[0].code(), ops[1].code(), ops[2].code(), ops[3].code())
  }

  pub fn from_cell(cell: Cell) -> Bundle {
    Bundle(cell)
  }

  pub fn to_cell(self) -> Cell {
    self.0
  }

  /// The four instruction bytes in execution order.
  pub fn bytes(self) -> [u8; 4] {
    [
      ( self.0        & 0xFF) as u8,
      ((self.0 >> 8)  & 0xFF) as u8,
      ((self.0 >> 16) & 0xFF) as u8,
      ((self.0 >> 24) & 0xFF) as u8
    ]
  }

}

impl Display for Bundle {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let names =
      self.bytes()
          .iter()
          .map(|byte| {
            match Opcode::decode(*byte) {
              Ok(opcode) => format!("{}", opcode),
              Err(_)     => format!("{:#04x}", byte)
            }
          })
          .collect::<Vec<String>>()
          .join(" ");
    write!(f, "[{}]", names)
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  #[test]
  fn packs_first_executed_into_the_low_byte() {
    let bundle = Bundle::of([Opcode::Literal, Opcode::Add, Opcode::Store, Opcode::Die]);
    assert_eq!(bundle.to_cell() & 0xFF, Opcode::Literal.code() as Cell);
    assert_eq!(
      bundle.bytes(),
      [Opcode::Literal.code(), Opcode::Add.code(), Opcode::Store.code(), Opcode::Die.code()]
    );
  }

  #[test]
  fn top_half_of_the_word_stays_clear() {
    let bundle = Bundle::pack(0xFF, 0xFF, 0xFF, 0xFF);
    assert_eq!(bundle.to_cell(), 0xFFFF_FFFF);
  }

  proptest! {
    #[test]
    fn round_trips_any_four_bytes(a: u8, b: u8, c: u8, d: u8) {
      let bundle = Bundle::pack(a, b, c, d);
      prop_assert_eq!(bundle.bytes(), [a, b, c, d]);
      prop_assert_eq!(Bundle::from_cell(bundle.to_cell()), bundle);
    }
  }
}
