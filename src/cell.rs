//! The machine word. A `Cell` is used uniformly for data values, addresses, boolean
//! results, and packed instruction bundles.

/// The 64 bit machine word.
pub type Cell = u64;
/// Half of a machine word, the width of a segment id or an offset.
pub type HalfCell = u32;

/// The machine's encoding of false.
pub const NO: Cell = 0;
/// The machine's encoding of true: all bits set.
pub const YES: Cell = !NO;

/// Converts a host boolean into the machine's boolean encoding. Comparison
/// instructions push only `YES` or `NO`, never any other value.
pub fn cond(b: bool) -> Cell {
  match b {
    true  => YES,
    false => NO
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn booleans_are_all_or_nothing() {
    assert_eq!(cond(true), 0xFFFF_FFFF_FFFF_FFFF);
    assert_eq!(cond(false), 0);
  }
}
