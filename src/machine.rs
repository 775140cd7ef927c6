//! The machine proper: registers, memory, devices, symbols, breakpoints,
//! and the per-instruction stop logic the debugger's run loop drives.

use crate::config::Options;
use crate::console::{self, Console};
use crate::disasm;
use crate::execute::execute;
use crate::instruction::{InstFlags, Instruction};
use crate::memory::Memory;
use crate::memory::MEMORY_SIZE;
use crate::registers::Registers;
use crate::signals;
use crate::symbol::SymbolTable;
use log::debug;
use std::process;

pub const KBSR: u16 = 0xfe00;
pub const KBDR: u16 = 0xfe02;
pub const DSR: u16 = 0xfe04;
pub const DDR: u16 = 0xfe06;
pub const MCR: u16 = 0xfffe;

/// A `finish` that nests subroutines this deep has almost certainly
/// recursed forever.
pub const MAX_FINISH_DEPTH: u32 = 10_000_000;

pub struct Machine {
    pub regs: Registers,
    pub mem: Memory,
    pub console: Console,
    pub symbols: SymbolTable,
    pub options: Options,
    pub gui_mode: bool,
    pub in_init: bool,
    pub interrupted_at_gui: bool,
    /// Set by an MCR clock-enable clear; the signal handler's request is
    /// kept separately in `signals`.
    pub halt: bool,
    /// Single-address stop backing the `next` command.
    pub sys_breakpoint: Option<u16>,
    pub finish_depth: u32,
    pub last_flags: InstFlags,
    breakpoints: Vec<bool>,
}

impl Machine {
    pub fn new(console: Console, gui_mode: bool) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            console,
            symbols: SymbolTable::new(),
            options: Options::default(),
            gui_mode,
            in_init: false,
            interrupted_at_gui: false,
            halt: false,
            sys_breakpoint: None,
            finish_depth: 0,
            last_flags: InstFlags::default(),
            breakpoints: vec![false; MEMORY_SIZE],
        }
    }

    /// Memory read with device dispatch. Reads of the five mapped registers
    /// have side effects; everything else is plain storage.
    pub fn read_memory(&mut self, address: u16) -> u16 {
        match address {
            KBSR => self.console.kbsr_read(self.options.rand_device),
            KBDR => {
                if self.console.kbsr_latched {
                    match self.console.read_byte() {
                        Ok(Some(byte)) => {
                            self.mem.write(KBDR, u16::from(byte));
                        }
                        _ => {
                            if self.gui_mode {
                                println!("ERR {{LC-3 read past end of input stream.}}");
                            } else {
                                println!("LC-3 read past end of input stream.");
                            }
                            process::exit(3);
                        }
                    }
                }
                self.console.kbsr_latched = false;
                self.mem.read(KBDR)
            }
            DSR => self.console.dsr_read(self.options.rand_device),
            DDR => 0x0000,
            MCR => 0x8000,
            _ => self.mem.read(address),
        }
    }

    /// Memory write with device dispatch. Plain writes that change the
    /// stored word feed the GUI's code display, immediately or deferred
    /// depending on the `delay` option.
    pub fn write_memory(&mut self, address: u16, value: u16) {
        match address {
            KBSR | KBDR | DSR => {}
            DDR => self.console.ddr_write(value),
            MCR => {
                if value & 0x8000 == 0 {
                    self.halt = true;
                }
            }
            _ => {
                if self.mem.write(address, value) && self.gui_mode {
                    if self.options.delay_mem_update {
                        self.mem.mark_show_later(address);
                    } else {
                        disasm::disassemble_one(self, address);
                    }
                }
            }
        }
    }

    pub fn halt_requested(&self) -> bool {
        self.halt || signals::halt_requested()
    }

    /// Fetch, decode, and execute one instruction, then apply the stop
    /// checks in precedence order. Returns whether the run loop should
    /// keep going.
    pub fn execute_instruction(&mut self) -> bool {
        self.regs.ir = self.read_memory(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);

        let instruction = match Instruction::decode(self.regs.ir) {
            Some(instruction) => instruction,
            None => {
                // Leave the PC on the offending word.
                self.regs.pc = self.regs.pc.wrapping_sub(1);
                if self.gui_mode {
                    println!("ERR {{Illegal instruction at x{:04X}!}}", self.regs.pc);
                } else {
                    println!("Illegal instruction at x{:04X}!", self.regs.pc);
                }
                return false;
            }
        };

        self.last_flags = instruction.flags();
        execute(self, instruction);

        // The instruction has retired; its side effects are visible to
        // every check below. A halt request outranks the breakpoints.
        if self.halt_requested() {
            debug!("stopping: halt requested at x{:04X}", self.regs.pc);
            return false;
        }

        if self.breakpoints[self.regs.pc as usize] {
            if !self.gui_mode {
                println!("The LC-3 hit a breakpoint...");
            }
            return false;
        }

        if self.sys_breakpoint == Some(self.regs.pc) {
            return false;
        }

        if self.finish_depth > 0 {
            if self.last_flags.subroutine {
                self.finish_depth += 1;
                if self.finish_depth == MAX_FINISH_DEPTH {
                    if self.gui_mode {
                        println!("ERR {{Stopping due to possibly infinite recursion.}}");
                    } else {
                        println!("Stopping due to possibly infinite recursion.");
                    }
                    self.finish_depth = 0;
                    return false;
                }
            } else if self.last_flags.ret {
                self.finish_depth -= 1;
                if self.finish_depth == 0 {
                    return false;
                }
            }
        }

        if !self.in_init && self.gui_mode && console::poll_fd(libc::STDIN_FILENO) {
            self.interrupted_at_gui = true;
            return false;
        }

        true
    }

    // Breakpoint management.

    pub fn is_breakpoint(&self, address: u16) -> bool {
        self.breakpoints[address as usize]
    }

    pub fn set_breakpoint(&mut self, address: u16) {
        if self.breakpoints[address as usize] {
            if !self.gui_mode {
                println!("That breakpoint is already set.");
            }
        } else {
            self.breakpoints[address as usize] = true;
            if self.gui_mode {
                println!("BREAK {}", u32::from(address) + 1);
            } else {
                println!("Set breakpoint at x{:04X}.", address);
            }
        }
    }

    pub fn clear_breakpoint(&mut self, address: u16) {
        if !self.breakpoints[address as usize] {
            if !self.gui_mode {
                println!("No such breakpoint was set.");
            }
        } else if self.gui_mode {
            println!("BCLEAR {}", u32::from(address) + 1);
        } else {
            println!("Cleared breakpoint at x{:04X}.", address);
        }
        self.breakpoints[address as usize] = false;
    }

    pub fn clear_all_breakpoints(&mut self) {
        for slot in self.breakpoints.iter_mut() {
            *slot = false;
        }
    }

    pub fn list_breakpoints(&mut self) {
        let set: Vec<u16> = (0..MEMORY_SIZE as u32)
            .filter(|&addr| self.breakpoints[addr as usize])
            .map(|addr| addr as u16)
            .collect();

        if set.is_empty() {
            println!("No breakpoints are set.");
            return;
        }
        println!("The following instructions are set as breakpoints:");
        for addr in set {
            disasm::disassemble_one(self, addr);
        }
    }

    // Object and symbol loading.

    /// Store an object image (load address, then body) through the normal
    /// write path, and squash symbols over the covered range. Returns the
    /// range `[start, end)`.
    pub fn load_object(&mut self, words: &[u16]) -> Option<(u16, u16)> {
        let (&start, body) = words.split_first()?;
        let mut addr = start;
        for &word in body {
            self.write_memory(addr, word);
            addr = addr.wrapping_add(1);
        }
        self.symbols.squash_range(start, addr);
        Some((start, addr))
    }

    pub fn add_symbols(&mut self, entries: &[(String, u16)]) {
        for (name, addr) in entries {
            self.symbols.add(name, *addr, true);
        }
    }

    // State rendering.

    pub fn print_registers(&mut self) {
        if !self.gui_mode {
            println!(
                "PC=x{:04X} IR=x{:04X} PSR=x{:04X} ({})",
                self.regs.pc,
                self.regs.ir,
                self.regs.psr,
                self.regs.cc_name()
            );
            for regnum in 0..8 {
                print!("R{}=x{:04X} ", regnum, self.regs.by_index(regnum));
            }
            println!();
            disasm::disassemble_one(self, self.regs.pc);
        } else {
            for regnum in 0..11 {
                println!("REG R{} x{:04X}", regnum, self.regs.by_index(regnum));
            }
            println!("REG R11 {}", self.regs.cc_name());
        }
    }

    /// GUI-mode single-register report; PSR also carries the condition
    /// code, and focus returns to the code pane.
    pub fn print_register(&mut self, which: usize) {
        println!("REG R{} x{:04X}", which, self.regs.by_index(which));
        if which == 10 {
            println!("REG R11 {}", self.regs.cc_name());
        }
        println!("TOCODE");
    }

    pub fn dump_delayed_mem_updates(&mut self) {
        for addr in self.mem.take_show_later() {
            disasm::disassemble_one(self, addr);
        }
    }

    /// Nothing is shown when the GUI interrupted the run; the simulator
    /// resumes automatically and the stop is invisible to the user.
    pub fn show_state_if_stop_visible(&mut self) {
        if self.interrupted_at_gui {
            return;
        }
        if self.gui_mode && self.options.delay_mem_update {
            self.dump_delayed_mem_updates();
        }
        self.print_registers();
    }

    /// Explicit stop requested by the GUI: drop transient run state and
    /// dump everything.
    pub fn gui_stop_and_dump(&mut self) {
        self.interrupted_at_gui = false;
        self.sys_breakpoint = None;
        self.finish_depth = 0;
        self.dump_delayed_mem_updates();
        self.print_registers();
    }

    #[cfg(test)]
    pub fn fixture() -> Self {
        let mut machine = Machine::new(Console::fixture(b""), false);
        // Deterministic devices under test.
        machine.options.rand_device = false;
        machine.regs.pc = 0x3000;
        machine
    }
}
