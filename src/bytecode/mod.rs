/*!

  The VM uses a 64 bit word size, but instructions occupy only the low four bytes of
  a word. One memory word is one *bundle* of four instructions, packed little-endian
  by byte position: byte 0 executes first, byte 3 last. The remaining word bits above
  byte 3 are part of the word but unused by the packer (conventionally zero).

  Opcodes are single bytes numbered sequentially from 0 (`Nop`) to 39 (`Copy`), with
  a debug opcode fixed at 254 and an explicit invalid marker at 255. Every other
  value is equally invalid. Instructions that need an operand larger than a byte
  (only `Literal`) take it from the memory word following the bundle.

*/

mod bundle;
mod opcode;

pub use bundle::Bundle;
pub use opcode::Opcode;
