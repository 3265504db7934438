use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::fault::Fault;

/**
  Opcodes of the virtual machine.

  Values are consecutive bytes starting at 0, so the order the opcodes are listed
  below is significant: it is the binary encoding. `Dbg` and `Invalid` sit apart at
  the top of the byte range and are not part of the normal numbering.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString,      TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq, PartialEq,   Debug,            Hash
)]
#[repr(u8)]
pub enum Opcode {
  Nop = 0,
  Literal,          // push the word following the bundle, skip over it
  Dup,
  Drop,
  Swap,
  Push,             // data -> address stack
  Pop,              // address -> data stack
  Jump,
  CondJump,
  Call,
  CondCall,
  Ret,
  RetIfZero,
  Equal,
  NotEqual,
  LessThan,
  GreaterThan,
  Fetch,
  Store,
  Add,
  Subtract,
  Multiply,
  DivideRemainder,  // pushes remainder, then quotient
  And,
  Or,
  Xor,
  ShiftLeft,
  ShiftRight,
  Alloc,
  ResizeSegment,
  Free,
  Spawn,
  Send,
  Recv,
  ReadRegister,
  WriteRegister,
  DoIO,
  Die,
  Compare,
  Copy,

  /// Dumps the issuing core's state to diagnostic output.
  Dbg     = 254,
  /// Reserved. Dispatching it is a fatal fault.
  Invalid = 255
}

impl Opcode {

  pub fn code(self) -> u8 {
    Into::<u8>::into(self)
  }

  /// Decodes one byte of a bundle. Unassigned byte values fault.
  pub fn decode(byte: u8) -> Result<Opcode, Fault> {
    Opcode::try_from(byte).map_err(|_| Fault::InvalidOpcode(byte))
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numbering_is_sequential_from_nop() {
    assert_eq!(Opcode::Nop.code(), 0);
    assert_eq!(Opcode::Literal.code(), 1);
    assert_eq!(Opcode::Die.code(), 37);
    assert_eq!(Opcode::Compare.code(), 38);
    assert_eq!(Opcode::Copy.code(), 39);
    assert_eq!(Opcode::Dbg.code(), 254);
    assert_eq!(Opcode::Invalid.code(), 255);
  }

  #[test]
  fn unassigned_bytes_do_not_decode() {
    assert!(Opcode::decode(39).is_ok());
    for byte in 40..254 {
      match Opcode::decode(byte) {
        Err(Fault::InvalidOpcode(b)) => assert_eq!(b, byte),
        other => panic!("byte {} decoded to {:?}", byte, other)
      }
    }
  }

  #[test]
  fn opcode_names_round_trip() {
    use std::str::FromStr;
    assert_eq!(format!("{}", Opcode::DivideRemainder), "DivideRemainder");
    assert_eq!(Opcode::from_str("CondJump").unwrap(), Opcode::CondJump);
  }
}
