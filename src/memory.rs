//! The segment registry: dynamically-sized arrays of cells keyed by a small integer
//! id. Segments are the only shared mutable structure cores have, so programs may
//! use them as their synchronization primitive; the table itself lives behind a
//! single lock in the `Vm`.

use std::collections::HashMap;

use crate::address::Address;
use crate::cell::{Cell, HalfCell, NO};
use crate::fault::Fault;

/// Segment ids are reused, first free id from 0. The bound matches the core and
/// device tables.
pub const SEGMENT_LIMIT: usize = 1 << 16;

pub struct SegmentTable {
  segments: HashMap<HalfCell, Vec<Cell>>
}

impl SegmentTable {

  pub fn new() -> SegmentTable {
    SegmentTable { segments: HashMap::new() }
  }

  /// Creates a zero-initialized segment of `size` cells and returns its base
  /// address (offset 0).
  pub fn alloc(&mut self, size: Cell) -> Result<Address, Fault> {
    for id in 0..SEGMENT_LIMIT as HalfCell {
      if self.segments.contains_key(&id) {
        continue;
      }
      self.segments.insert(id, vec![NO; size as usize]);
      return Ok(Address::new(id, 0));
    }
    Err(Fault::TableExhausted("segment"))
  }

  /// Removes the segment from the registry. Freeing an unknown id is a no-op. Any
  /// address still referencing the id afterward is a use-after-free: the id may be
  /// handed out again by a later `alloc`.
  pub fn free(&mut self, address: Address) {
    self.segments.remove(&address.segment());
  }

  /// Replaces the segment with one of `new_size` cells, keeping the overlapping
  /// prefix. Growth is zero-initialized; shrinking discards the tail. The address
  /// value itself is unchanged.
  pub fn resize(&mut self, address: Address, new_size: Cell) -> Result<(), Fault> {
    let segment =
      self.segments
          .get_mut(&address.segment())
          .ok_or(Fault::OutOfRange(address))?;
    segment.resize(new_size as usize, NO);
    Ok(())
  }

  pub fn read(&self, address: Address) -> Result<Cell, Fault> {
    self.segments
        .get(&address.segment())
        .and_then(|segment| segment.get(address.offset() as usize))
        .copied()
        .ok_or(Fault::OutOfRange(address))
  }

  pub fn write(&mut self, address: Address, value: Cell) -> Result<(), Fault> {
    let cell =
      self.segments
          .get_mut(&address.segment())
          .and_then(|segment| segment.get_mut(address.offset() as usize))
          .ok_or(Fault::OutOfRange(address))?;
    *cell = value;
    Ok(())
  }

}
