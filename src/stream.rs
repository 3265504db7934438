//! The reference byte-stream device: a multiplexer over read/write/close-capable
//! peers, each addressed by a small integer handle.
//!
//! Operand-stack contract (top first when `DoIO` dispatches here):
//!
//!   sub-command 0, read one byte:  `handle --  byte`
//!   sub-command 1, write one byte: `handle byte -- `
//!   sub-command 2, close:          `handle -- `

use std::collections::HashMap;
use std::io;
use std::io::{Read, Write};

use crate::cell::Cell;
use crate::core::Core;
use crate::device::Device;
use crate::fault::Fault;

pub const STREAM_READ  : Cell = 0;
pub const STREAM_WRITE : Cell = 1;
pub const STREAM_CLOSE : Cell = 2;

pub const STREAM_LIMIT: usize = 1 << 16;

/// A byte-stream peer. Closing is dropping.
pub trait Stream: Read + Write + Send {}
impl<T: Read + Write + Send> Stream for T {}

pub struct StreamDevice {
  streams: HashMap<Cell, Box<dyn Stream>>
}

impl StreamDevice {

  pub fn new() -> StreamDevice {
    StreamDevice { streams: HashMap::new() }
  }

  /// Registers a peer under the first free handle.
  pub fn add(&mut self, stream: Box<dyn Stream>) -> Result<Cell, Fault> {
    for handle in 0..STREAM_LIMIT as Cell {
      if self.streams.contains_key(&handle) {
        continue;
      }
      self.streams.insert(handle, stream);
      return Ok(handle);
    }
    Err(Fault::TableExhausted("stream"))
  }

  fn stream(&mut self, handle: Cell) -> Result<&mut Box<dyn Stream>, Fault> {
    self.streams.get_mut(&handle).ok_or(Fault::NoSuchStream(handle))
  }

}

impl Device for StreamDevice {
  /// A failed or empty read, or a failed write, is a `DeviceFailure` fault: fatal
  /// to the issuing core, contained there.
  fn handle(&mut self, core: &mut Core) -> Result<(), Fault> {
    let command = core.pop_data()?;
    match command {

      STREAM_READ => {
        let handle = core.pop_data()?;
        let stream = self.stream(handle)?;
        let mut byte = [0u8; 1];
        let count = stream.read(&mut byte)?;
        if count == 0 {
          return Err(Fault::DeviceFailure(
            io::Error::new(io::ErrorKind::UnexpectedEof, "stream yielded no byte")
          ));
        }
        core.push_data(byte[0] as Cell)?;
      }

      STREAM_WRITE => {
        let byte   = core.pop_data()?;
        let handle = core.pop_data()?;
        let stream = self.stream(handle)?;
        stream.write_all(&[byte as u8])?;
      }

      STREAM_CLOSE => {
        let handle = core.pop_data()?;
        self.streams.remove(&handle).ok_or(Fault::NoSuchStream(handle))?;
      }

      _ => {
        // Unknown sub-commands are ignored, matching the reference device.
      }

    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::collections::VecDeque;
  use std::sync::mpsc;
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::address::Address;
  use crate::bytecode::Opcode;
  use crate::core::Core;
  use crate::vm::Vm;

  // A loopback peer: reads drain `input`, writes land in the shared `output`.
  struct Loopback {
    input  : VecDeque<u8>,
    output : Arc<Mutex<Vec<u8>>>
  }

  impl Read for Loopback {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
      match self.input.pop_front() {
        Some(byte) => {
          buf[0] = byte;
          Ok(1)
        }
        None => Ok(0)
      }
    }
  }

  impl Write for Loopback {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.output.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  fn rig(input: &[u8]) -> (Arc<Vm>, Core, Cell, Cell, Arc<Mutex<Vec<u8>>>) {
    let output = Arc::new(Mutex::new(Vec::new()));
    let peer = Loopback {
      input: input.iter().copied().collect(),
      output: Arc::clone(&output)
    };

    let mut device = StreamDevice::new();
    let handle = device.add(Box::new(peer)).unwrap();

    let vm = Vm::new();
    let device_id = vm.register_device(Box::new(device)).unwrap();

    let (_sender, receiver) = mpsc::sync_channel(0);
    let core = Core::new(Arc::clone(&vm), 0, Address::new(0, 0), receiver);
    (vm, core, device_id, handle, output)
  }

  #[test]
  fn reads_one_byte_per_invocation() {
    let (_vm, mut core, device_id, handle, _output) = rig(&[0xAB]);

    core.push_data(handle).unwrap();
    core.push_data(STREAM_READ).unwrap();
    core.push_data(device_id).unwrap();
    core.dispatch(Opcode::DoIO).unwrap();
    assert_eq!(core.pop_data().unwrap(), 0xAB);

    // The stream is drained now; an empty read is a device failure.
    core.push_data(handle).unwrap();
    core.push_data(STREAM_READ).unwrap();
    core.push_data(device_id).unwrap();
    assert!(matches!(
      core.dispatch(Opcode::DoIO),
      Err(Fault::DeviceFailure(_))
    ));
  }

  #[test]
  fn writes_one_byte_per_invocation() {
    let (_vm, mut core, device_id, handle, output) = rig(&[]);

    core.push_data(handle).unwrap();
    core.push_data(0xC4).unwrap();
    core.push_data(STREAM_WRITE).unwrap();
    core.push_data(device_id).unwrap();
    core.dispatch(Opcode::DoIO).unwrap();

    assert_eq!(*output.lock().unwrap(), vec![0xC4]);
  }

  #[test]
  fn close_deregisters_the_handle() {
    let (_vm, mut core, device_id, handle, _output) = rig(&[1, 2]);

    core.push_data(handle).unwrap();
    core.push_data(STREAM_CLOSE).unwrap();
    core.push_data(device_id).unwrap();
    core.dispatch(Opcode::DoIO).unwrap();

    core.push_data(handle).unwrap();
    core.push_data(STREAM_READ).unwrap();
    core.push_data(device_id).unwrap();
    assert!(matches!(
      core.dispatch(Opcode::DoIO),
      Err(Fault::NoSuchStream(_))
    ));
  }
}
