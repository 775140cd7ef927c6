//! The "run until stopped" loop: terminal mode switching around free
//! execution, and the bookkeeping every stop performs.

use crate::machine::Machine;
use crate::signals;
use log::debug;
use nix::sys::termios::{
    tcflush, tcgetattr, tcsetattr, FlushArg, LocalFlags, SetArg, SpecialCharacterIndices, Termios,
};
use std::os::unix::io::RawFd;

/// Scoped raw-mode switch: canonical mode and echo off, single-byte reads.
/// The saved settings are restored on every exit path.
struct RawModeGuard {
    fd: RawFd,
    saved: Termios,
}

impl RawModeGuard {
    fn new(fd: RawFd) -> Option<Self> {
        let saved = tcgetattr(fd).ok()?;
        let mut raw = saved.clone();
        raw.local_flags &= !(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        tcsetattr(fd, SetArg::TCSANOW, &raw).ok()?;
        Some(Self { fd, saved })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = tcsetattr(self.fd, SetArg::TCSANOW, &self.saved);
    }
}

/// Run instructions until a stop condition fires, then restore the
/// terminal, report, and clear transient run state.
pub fn run_until_stopped(m: &mut Machine) {
    m.halt = false;
    signals::clear_halt();

    let guard = if m.gui_mode {
        // Removes the PC marker in the GUI.
        println!("CONT");
        None
    } else if m.console.input_is_tty() {
        m.console.tty_fd().and_then(RawModeGuard::new)
    } else {
        None
    };

    while m.execute_instruction() {}
    debug!("run loop stopped at x{:04X}", m.regs.pc);

    if let Some(guard) = guard {
        let fd = guard.fd;
        drop(guard);
        // Anything still buffered would otherwise be read back as
        // simulator commands.
        if !m.options.keep_input_on_stop {
            let _ = tcflush(fd, FlushArg::TCIFLUSH);
        }
    }

    if signals::take_stop_notice() {
        println!("\nLC-3 stopped.\n");
    }

    // Only a GUI interruption preserves the system breakpoint and any
    // finish in progress; the run resumes transparently afterwards.
    if !m.interrupted_at_gui {
        m.sys_breakpoint = None;
        m.finish_depth = 0;
    }

    m.show_state_if_stop_visible();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Machine, MCR};

    #[test]
    fn run_stops_on_mcr_halt_and_clears_state() {
        let mut machine = Machine::fixture();
        // STI R0, #1 with the pointer word aimed at the MCR.
        machine.write_memory(0x3000, 0xb001);
        machine.write_memory(0x3002, MCR);
        machine.sys_breakpoint = Some(0x9999);
        machine.finish_depth = 0;

        run_until_stopped(&mut machine);

        assert_eq!(machine.regs.pc, 0x3001);
        assert_eq!(machine.sys_breakpoint, None);
        assert_eq!(machine.finish_depth, 0);
    }

    #[test]
    fn run_stops_at_breakpoint() {
        let mut machine = Machine::fixture();
        for addr in 0x3000..0x3010 {
            machine.write_memory(addr, 0x0000); // never-taken branches
        }
        machine.set_breakpoint(0x3008);

        run_until_stopped(&mut machine);

        assert_eq!(machine.regs.pc, 0x3008);
    }
}
