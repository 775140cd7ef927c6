//! Byte I/O as seen by the LC-3: the keyboard/display endpoints and the
//! device latches behind KBSR/KBDR/DSR/DDR. Endpoints are swappable so
//! that script playback and the GUI socket can stand in for stdin/stdout.

use nix::sys::select::{select, FdSet};
use nix::sys::time::{TimeVal, TimeValLike};
use nix::unistd::isatty;
use std::fs::File;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::unix::io::{AsRawFd, RawFd};
use std::thread;
use std::time::Duration;

/// Empty KBSR polls tolerated before the reader starts sleeping between
/// polls instead of spinning.
const IDLE_POLL_THRESHOLD: u32 = 250;
const IDLE_SLEEP: Duration = Duration::from_nanos(500);

pub enum Input {
    Stdin,
    File(File),
    Socket(TcpStream),
    #[cfg(test)]
    Buffer(io::Cursor<Vec<u8>>),
}

pub enum Output {
    Stdout,
    Socket(TcpStream),
    #[cfg(test)]
    Buffer(Vec<u8>),
}

pub struct Console {
    input: Input,
    output: Output,
    pub kbsr_latched: bool,
    pub dsr_latched: bool,
    kbsr_waits: u32,
}

impl Console {
    /// Standalone mode: the LC-3 console is the process's own terminal.
    pub fn stdio() -> Self {
        Self::new(Input::Stdin, Output::Stdout)
    }

    /// GUI mode: both directions ride one loopback connection.
    pub fn gui(stream: TcpStream) -> io::Result<Self> {
        let input = stream.try_clone()?;
        Ok(Self::new(Input::Socket(input), Output::Socket(stream)))
    }

    fn new(input: Input, output: Output) -> Self {
        Self {
            input,
            output,
            kbsr_latched: false,
            dsr_latched: false,
            kbsr_waits: 0,
        }
    }

    /// Redirect LC-3 keyboard input (the `stdin` option and script playback
    /// swap this; the display endpoint never moves).
    pub fn set_input(&mut self, input: Input) {
        self.input = input;
    }

    /// Point the input back at the output's socket (GUI mode after a script
    /// unwinds or when the `stdin` option flips).
    pub fn rebind_input_to_output(&mut self) -> io::Result<()> {
        if let Output::Socket(stream) = &self.output {
            self.input = Input::Socket(stream.try_clone()?);
        }
        Ok(())
    }

    fn input_fd(&self) -> Option<RawFd> {
        match &self.input {
            Input::Stdin => Some(libc::STDIN_FILENO),
            Input::File(file) => Some(file.as_raw_fd()),
            Input::Socket(stream) => Some(stream.as_raw_fd()),
            #[cfg(test)]
            Input::Buffer(_) => None,
        }
    }

    pub fn input_is_tty(&self) -> bool {
        match self.input_fd() {
            Some(fd) => isatty(fd).unwrap_or(false),
            None => false,
        }
    }

    /// File descriptor for the terminal-mode guard; `None` when the input
    /// is not an OS handle.
    pub fn tty_fd(&self) -> Option<RawFd> {
        self.input_fd()
    }

    /// Is a byte available right now?
    pub fn poll_input(&self) -> bool {
        match &self.input {
            #[cfg(test)]
            Input::Buffer(cursor) => (cursor.position() as usize) < cursor.get_ref().len(),
            _ => match self.input_fd() {
                Some(fd) => poll_fd(fd),
                None => false,
            },
        }
    }

    /// Blocking single-byte read. `None` means the stream is exhausted.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buffer = [0; 1];
        loop {
            let result = match &mut self.input {
                Input::Stdin => io::stdin().read(&mut buffer),
                Input::File(file) => file.read(&mut buffer),
                Input::Socket(stream) => stream.read(&mut buffer),
                #[cfg(test)]
                Input::Buffer(cursor) => cursor.read(&mut buffer),
            };
            match result {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buffer[0])),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        match &mut self.output {
            Output::Stdout => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(&[byte])?;
                handle.flush()
            }
            Output::Socket(stream) => {
                stream.write_all(&[byte])?;
                stream.flush()
            }
            #[cfg(test)]
            Output::Buffer(buffer) => {
                buffer.push(byte);
                Ok(())
            }
        }
    }

    /// Discard whatever input is pending.
    pub fn drain_input(&mut self) {
        while self.poll_input() {
            match self.read_byte() {
                Ok(Some(_)) => continue,
                _ => break,
            }
        }
    }

    /// KBSR read: report (and possibly establish) the input latch.
    pub fn kbsr_read(&mut self, rand_device: bool) -> u16 {
        if !self.kbsr_latched {
            if self.poll_input() {
                self.kbsr_waits = 0;
                // Randomized device timing holds the ready bit off most
                // of the time, like slow hardware would.
                self.kbsr_latched = !rand_device || rand::random::<u8>() & 15 == 0;
            } else {
                if self.kbsr_waits < u32::max_value() {
                    self.kbsr_waits += 1;
                }
                if self.kbsr_waits > IDLE_POLL_THRESHOLD {
                    thread::sleep(IDLE_SLEEP);
                }
            }
        }
        if self.kbsr_latched {
            0x8000
        } else {
            0x0000
        }
    }

    /// DSR read: the display becomes ready here, gating the next DDR write.
    pub fn dsr_read(&mut self, rand_device: bool) -> u16 {
        if !self.dsr_latched {
            self.dsr_latched = !rand_device || rand::random::<u8>() & 15 == 0;
        }
        if self.dsr_latched {
            0x8000
        } else {
            0x0000
        }
    }

    /// DDR write: emits only when a DSR read latched the ready bit.
    pub fn ddr_write(&mut self, value: u16) {
        if !self.dsr_latched {
            return;
        }
        let _ = self.write_byte(value as u8);
        self.dsr_latched = false;
    }

    pub fn reset_latches(&mut self) {
        self.kbsr_latched = false;
        self.dsr_latched = false;
        self.kbsr_waits = 0;
    }

    #[cfg(test)]
    pub fn fixture(input: &[u8]) -> Self {
        Self::new(
            Input::Buffer(io::Cursor::new(input.to_vec())),
            Output::Buffer(Vec::new()),
        )
    }

    #[cfg(test)]
    pub fn output_bytes(&self) -> &[u8] {
        match &self.output {
            Output::Buffer(buffer) => buffer,
            _ => panic!("not a test console"),
        }
    }
}

/// Zero-timeout readability check on a descriptor.
pub fn poll_fd(fd: RawFd) -> bool {
    let mut readfds = FdSet::new();
    readfds.insert(fd);

    match select(None, &mut readfds, None, None, &mut TimeVal::zero()) {
        Ok(value) => value == 1,
        Err(_) => false,
    }
}
