use crate::error::Result;

/// Upper bound on the number of steps in a single request.
pub const MAX_REQUEST_COMMANDS: usize = 4;

/// One step of a request against the controller's two ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCommand {
    /// Write a byte to the data port (0x60).
    WriteData(u8),
    /// Write a byte to the command port (0x64).
    WriteCommand(u8),
    /// Read a byte from the data port.
    ReadData,
    /// Read a byte from the data port and stop the sequence unless it matches.
    ReadDataAndCompare(u8),
}

/// A short, fixed-capacity command sequence submitted to a [`Ps2Transport`].
///
/// Transports execute steps in order and record how many completed. A failing
/// [`PortCommand::ReadDataAndCompare`] stops the sequence at that step, so
/// `completed() < len()` is how callers observe a mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ps2Request {
    commands: [PortCommand; MAX_REQUEST_COMMANDS],
    len: usize,
    completed: usize,
    read: [Option<u8>; MAX_REQUEST_COMMANDS],
}

impl Ps2Request {
    pub fn from_commands(commands: &[PortCommand]) -> Self {
        assert!(
            commands.len() <= MAX_REQUEST_COMMANDS,
            "PS/2 request holds at most {MAX_REQUEST_COMMANDS} commands"
        );
        let mut buf = [PortCommand::ReadData; MAX_REQUEST_COMMANDS];
        buf[..commands.len()].copy_from_slice(commands);
        Self {
            commands: buf,
            len: commands.len(),
            completed: 0,
            read: [None; MAX_REQUEST_COMMANDS],
        }
    }

    pub fn commands(&self) -> &[PortCommand] {
        &self.commands[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of steps the transport executed successfully.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.len
    }

    /// Byte read by the step at `index`, if that step was a read and it completed.
    pub fn read_byte(&self, index: usize) -> Option<u8> {
        if index < self.completed {
            self.read[index]
        } else {
            None
        }
    }

    /// Marks the next step as done. Transports call this once per executed step.
    pub fn complete_step(&mut self, read: Option<u8>) {
        if self.completed < self.len {
            self.read[self.completed] = read;
            self.completed += 1;
        }
    }

    pub fn reset_progress(&mut self) {
        self.completed = 0;
        self.read = [None; MAX_REQUEST_COMMANDS];
    }
}

/// The controller side of the driver: executes command sequences against the
/// data and command ports. The driver never touches I/O ports directly.
pub trait Ps2Transport {
    /// Executes `request` and waits for it to finish. Must not be called from the
    /// byte-delivery path.
    ///
    /// A failed comparison is reported through [`Ps2Request::completed`], not as
    /// an error. `Err` means the round trip itself failed (e.g. timed out).
    fn submit_blocking(&mut self, request: &mut Ps2Request) -> Result<()>;

    /// Queues `request` without waiting. The transport owns the request from
    /// here on, including logging and dropping it if the device misbehaves.
    fn submit_async(&mut self, request: Ps2Request);
}

impl<T: Ps2Transport + ?Sized> Ps2Transport for &mut T {
    fn submit_blocking(&mut self, request: &mut Ps2Request) -> Result<()> {
        (**self).submit_blocking(request)
    }

    fn submit_async(&mut self, request: Ps2Request) {
        (**self).submit_async(request)
    }
}

impl<T: Ps2Transport + ?Sized> Ps2Transport for Box<T> {
    fn submit_blocking(&mut self, request: &mut Ps2Request) -> Result<()> {
        (**self).submit_blocking(request)
    }

    fn submit_async(&mut self, request: Ps2Request) {
        (**self).submit_async(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_tracks_progress_and_reads() {
        let mut req = Ps2Request::from_commands(&[
            PortCommand::WriteCommand(0x20),
            PortCommand::ReadData,
        ]);
        assert_eq!(req.len(), 2);
        assert!(!req.is_complete());
        assert_eq!(req.read_byte(1), None);

        req.complete_step(None);
        req.complete_step(Some(0x45));
        req.complete_step(Some(0x99));

        assert!(req.is_complete());
        assert_eq!(req.completed(), 2);
        assert_eq!(req.read_byte(1), Some(0x45));

        req.reset_progress();
        assert_eq!(req.completed(), 0);
        assert_eq!(req.read_byte(1), None);
    }

    #[test]
    #[should_panic]
    fn request_rejects_oversized_sequences() {
        Ps2Request::from_commands(&[PortCommand::ReadData; MAX_REQUEST_COMMANDS + 1]);
    }
}
