//! The command dispatcher and handlers: prefix-matched commands read from
//! the terminal, the GUI channel, or a stack of script files.

use crate::config::Config;
use crate::console::{self, Input};
use crate::disasm;
use crate::loader;
use crate::machine::Machine;
use crate::os;
use crate::parse::{parse_address, parse_range, RangeContext, Scale};
use crate::run::run_until_stopped;
use crate::signals;
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::Editor;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::process;

const MAX_SCRIPT_DEPTH: usize = 10;

const TOO_MANY_ARGS: &str = "WARNING: Ignoring excess arguments.";
const BAD_ADDRESS: &str = "Addresses must be labels or values in the range x0000 to xFFFF.";

const REPEATABLE: u8 = 1; // pressing ENTER repeats the command
const LIST_TYPE: u8 = 2; // pressing ENTER shows more
const GUI_ONLY: u8 = 4; // hidden outside GUI mode

struct Command {
    name: &'static str,
    /// Shortest accepted abbreviation.
    min_len: usize,
    flags: u8,
    handler: fn(&mut Debugger, &str),
}

const COMMANDS: &[Command] = &[
    Command { name: "break",     min_len: 1, flags: 0,          handler: Debugger::cmd_break },
    Command { name: "continue",  min_len: 1, flags: REPEATABLE, handler: Debugger::cmd_continue },
    Command { name: "dump",      min_len: 1, flags: LIST_TYPE,  handler: Debugger::cmd_dump },
    Command { name: "execute",   min_len: 1, flags: 0,          handler: Debugger::cmd_execute },
    Command { name: "file",      min_len: 1, flags: 0,          handler: Debugger::cmd_file },
    Command { name: "finish",    min_len: 3, flags: REPEATABLE, handler: Debugger::cmd_finish },
    Command { name: "help",      min_len: 1, flags: 0,          handler: Debugger::cmd_help },
    Command { name: "list",      min_len: 1, flags: LIST_TYPE,  handler: Debugger::cmd_list },
    Command { name: "memory",    min_len: 1, flags: 0,          handler: Debugger::cmd_memory },
    Command { name: "next",      min_len: 1, flags: REPEATABLE, handler: Debugger::cmd_next },
    Command { name: "option",    min_len: 1, flags: 0,          handler: Debugger::cmd_option },
    Command { name: "printregs", min_len: 1, flags: 0,          handler: Debugger::cmd_printregs },
    Command { name: "quit",      min_len: 4, flags: 0,          handler: Debugger::cmd_quit },
    Command { name: "register",  min_len: 1, flags: 0,          handler: Debugger::cmd_register },
    Command { name: "reset",     min_len: 5, flags: 0,          handler: Debugger::cmd_reset },
    Command { name: "step",      min_len: 1, flags: REPEATABLE, handler: Debugger::cmd_step },
    Command { name: "translate", min_len: 1, flags: 0,          handler: Debugger::cmd_translate },
    Command { name: "x",         min_len: 1, flags: GUI_ONLY,   handler: Debugger::cmd_lc3_stop },
];

/// First table entry the word abbreviates, honoring minimum lengths and
/// GUI visibility.
fn lookup(word: &str, gui_mode: bool) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| {
        word.len() >= command.min_len
            && is_prefix(word, command.name)
            && (gui_mode || command.flags & GUI_ONLY == 0)
    })
}

fn is_prefix(word: &str, full: &str) -> bool {
    !word.is_empty()
        && word.len() <= full.len()
        && full[..word.len()].eq_ignore_ascii_case(word)
}

pub struct Debugger {
    pub machine: Machine,
    editor: Option<Editor<()>>,
    scripts: Vec<BufReader<File>>,
    stop_scripts: bool,
    start_file: Option<String>,
    start_script: Option<String>,
    dump_last_end: u16,
    list_last_end: u16,
}

impl Debugger {
    pub fn new(machine: Machine, config: &Config) -> Self {
        let editor = if machine.gui_mode {
            None
        } else {
            Some(Editor::<()>::new())
        };
        Self {
            machine,
            editor,
            scripts: Vec::new(),
            stop_scripts: false,
            start_file: config.file.clone(),
            start_script: config.script.clone(),
            dump_last_end: 0,
            list_last_end: 0,
        }
    }

    /// Full machine initialization: zero state, load the bundled OS and its
    /// symbols, let the OS run, then replay any startup file or script.
    pub fn init_machine(&mut self) {
        self.machine.in_init = true;

        self.machine.regs.reset();
        self.machine.mem.reset();
        self.machine.symbols.remove_all();
        self.machine.clear_all_breakpoints();

        let image = &os::OS_IMAGE;
        match self.machine.load_object(&image.object) {
            None => {
                self.report("Failed to read LC-3 OS code.");
                self.machine.show_state_if_stop_visible();
            }
            Some((start, end)) => {
                match loader::read_symbols(Cursor::new(image.symbols.as_bytes())) {
                    Ok(symbols) => self.machine.add_symbols(&symbols),
                    Err(_) => self.report("Failed to read LC-3 OS symbols."),
                }
                if self.machine.gui_mode {
                    // Load the OS code into the GUI display.
                    disasm::disassemble_range(&mut self.machine, start, end);
                }
                self.machine.regs.pc = os::RESET_VECTOR;
                run_until_stopped(&mut self.machine);
            }
        }

        self.machine.in_init = false;

        if let Some(script) = self.start_script.clone() {
            self.cmd_execute(&script);
        } else if let Some(file) = self.start_file.clone() {
            self.cmd_file(&file);
        }
    }

    /// Read and dispatch commands until input runs out, `quit`, or a
    /// script unwind.
    pub fn command_loop(&mut self) {
        let mut last_cmd: Option<String> = None;

        while !self.stop_scripts {
            let mut cmd = match self.read_command() {
                Some(line) => line,
                None => break,
            };

            if cmd.trim_start().is_empty() {
                // An empty line repeats the last command, if allowed.
                cmd = match last_cmd.take() {
                    Some(previous) => previous,
                    None => continue,
                };
            } else {
                last_cmd = None;
            }

            let trimmed = cmd.trim_start();
            let word = match trimmed.split_whitespace().next() {
                Some(word) => word.to_string(),
                None => continue,
            };
            let args = trimmed[word.len()..].trim_start().to_string();

            match lookup(&word, self.machine.gui_mode) {
                None => println!("Unknown command.  Type 'h' for help."),
                Some(command) => {
                    debug!("dispatch {:?} -> {}", word, command.name);
                    (command.handler)(self, &args);

                    if command.flags & LIST_TYPE != 0 {
                        last_cmd = Some(format!("{} more", word));
                    } else if command.flags & REPEATABLE != 0 && self.scripts.is_empty() {
                        last_cmd = Some(cmd);
                    }
                }
            }
        }
    }

    /// One line from the current command source: the innermost script, the
    /// GUI channel, or the interactive prompt.
    fn read_command(&mut self) -> Option<String> {
        if let Some(script) = self.scripts.last_mut() {
            let mut line = String::new();
            return match script.read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => {
                    strip_newline(&mut line);
                    Some(line)
                }
            };
        }

        if self.machine.gui_mode {
            // An empty command queue after a GUI interruption means the
            // front end wants the simulator running again.
            if self.machine.interrupted_at_gui && !console::poll_fd(libc::STDIN_FILENO) {
                return Some("c".to_string());
            }
            let mut line = String::new();
            return match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => {
                    strip_newline(&mut line);
                    Some(line)
                }
            };
        }

        let editor = self.editor.as_mut()?;
        loop {
            match editor.readline("(lc3sim) ") {
                Ok(line) => {
                    editor.add_history_entry(line.as_str());
                    return Some(line);
                }
                // Probably a CTRL-C: print a blank line and try again.
                Err(ReadlineError::Interrupted) => println!(),
                Err(_) => return None,
            }
        }
    }

    fn report(&self, message: &str) {
        if self.machine.gui_mode {
            println!("ERR {{{}}}", message);
        } else {
            println!("{}", message);
        }
    }

    fn warn_too_many_args(&self) {
        // Spaces in GUI entry boxes arrive as extra arguments; ignore
        // them silently there.
        if !self.machine.gui_mode {
            println!("{}", TOO_MANY_ARGS);
        }
    }

    fn no_args_allowed(&self, args: &str) {
        if !args.trim().is_empty() {
            self.warn_too_many_args();
        }
    }

    /// Discard pending LC-3 console input before a run, unless disabled or
    /// inside a script (flushing would eat the rest of the script).
    fn flush_console_input(&mut self) {
        if !self.machine.options.flush_on_start || !self.scripts.is_empty() {
            return;
        }
        self.machine.console.drain_input();
    }

    // Command handlers.

    fn cmd_break(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();

        if let Some(&subcommand) = tokens.first() {
            if is_prefix(subcommand, "list") {
                if tokens.len() > 1 {
                    self.warn_too_many_args();
                }
                self.machine.list_breakpoints();
                return;
            }
            if tokens.len() > 1 {
                if tokens.len() > 2 {
                    self.warn_too_many_args();
                }
                let addr = parse_address(&self.machine.symbols, tokens[1]);
                if is_prefix(subcommand, "clear") {
                    if tokens[1].eq_ignore_ascii_case("all") {
                        self.machine.clear_all_breakpoints();
                        if !self.machine.gui_mode {
                            println!("Cleared all breakpoints.");
                        }
                        return;
                    }
                    match addr {
                        Some(addr) => self.machine.clear_breakpoint(addr),
                        None => println!("{}", BAD_ADDRESS),
                    }
                    return;
                }
                if is_prefix(subcommand, "set") {
                    match addr {
                        Some(addr) => self.machine.set_breakpoint(addr),
                        None => println!("{}", BAD_ADDRESS),
                    }
                    return;
                }
            }
        }

        println!("breakpoint options include:");
        println!("  break clear <addr>|all -- clear one or all breakpoints");
        println!("  break list             -- list all breakpoints");
        println!("  break set <addr>       -- set a breakpoint");
    }

    fn cmd_continue(&mut self, args: &str) {
        self.no_args_allowed(args);
        if self.machine.interrupted_at_gui {
            // Resuming after a GUI interruption: the earlier flush and
            // run state still stand.
            self.machine.interrupted_at_gui = false;
        } else {
            self.flush_console_input();
        }
        run_until_stopped(&mut self.machine);
    }

    fn cmd_dump(&mut self, args: &str) {
        let ctx = RangeContext {
            symbols: &self.machine.symbols,
            pc: self.machine.regs.pc,
            last_end: Some(self.dump_last_end),
        };
        if let Some(range) = parse_range(&ctx, args, &Scale::Window(48)) {
            if range.extra_args {
                self.warn_too_many_args();
            }
            disasm::dump_memory(&mut self.machine, range.start, range.end);
            self.dump_last_end = range.end;
            return;
        }

        println!("dump options include:");
        println!("  dump               -- dump memory around PC");
        println!("  dump <addr>        -- dump memory starting from an address or label");
        println!("  dump <addr> <addr> -- dump a range of memory");
        println!("  dump more          -- continue previous dump (or press <Enter>)");
    }

    fn cmd_execute(&mut self, args: &str) {
        if self.scripts.len() == MAX_SCRIPT_DEPTH {
            // Safer to unwind than to bury a warning arbitrarily deep.
            println!(
                "Cannot execute more than {} levels of scripts!",
                MAX_SCRIPT_DEPTH
            );
            self.stop_scripts = true;
            return;
        }

        let path = args.trim();
        let script = match File::open(path) {
            Ok(file) => file,
            Err(_) => {
                println!("Cannot open script file \"{}\".", path);
                self.stop_scripts = true;
                return;
            }
        };

        if !self.machine.options.script_uses_stdin {
            if let Ok(dup) = script.try_clone() {
                self.machine.console.set_input(Input::File(dup));
            }
        }

        self.scripts.push(BufReader::new(script));
        self.command_loop();
        self.scripts.pop();

        if self.scripts.is_empty() {
            if self.machine.gui_mode {
                let _ = self.machine.console.rebind_input_to_output();
            } else {
                self.machine.console.set_input(Input::Stdin);
            }
            self.stop_scripts = false;
        } else if !self.machine.options.script_uses_stdin {
            // Back to the enclosing script level: LC-3 console input
            // follows it.
            if let Some(outer) = self.scripts.last() {
                if let Ok(dup) = outer.get_ref().try_clone() {
                    self.machine.console.set_input(Input::File(dup));
                }
            }
        }
    }

    fn cmd_file(&mut self, args: &str) {
        let name = args.trim();
        if name.is_empty() {
            if self.machine.gui_mode {
                println!("ERR {{Could not parse file name!}}");
            } else {
                println!("syntax: file <file to load>");
            }
            return;
        }

        let mut buf = name.to_string();
        // A '.' inside the final path component marks an extension;
        // otherwise ".obj" is assumed.
        let ext_start = match buf.rfind('.') {
            Some(dot) if !buf[dot..].contains('/') => dot,
            _ => {
                let len = buf.len();
                buf.push_str(".obj");
                len
            }
        };

        if !buf[ext_start..].eq_ignore_ascii_case(".obj") {
            if !self.machine.gui_mode && buf[ext_start..].eq_ignore_ascii_case(".sym") {
                match loader::read_symbol_file(&buf) {
                    Ok(symbols) => {
                        self.machine.add_symbols(&symbols);
                        println!("Read symbols from \"{}.\"", buf);
                    }
                    Err(_) => println!("Failed to read symbols from \"{}.\"", buf),
                }
                return;
            }
            if self.machine.gui_mode {
                println!("ERR {{Only .obj files can be loaded.}}");
            } else {
                println!("Only .obj or .sym files can be loaded.");
            }
            return;
        }

        let loaded = loader::read_object_file(&buf)
            .ok()
            .and_then(|words| self.machine.load_object(&words));
        let (start, end) = match loaded {
            Some(range) => range,
            None => {
                if self.machine.gui_mode {
                    println!("ERR {{Failed to load \"{}.\"}}", buf);
                } else {
                    println!("Failed to load \"{}.\"", buf);
                }
                return;
            }
        };

        // Success: reload the same file next time the machine is reset.
        self.start_file = Some(buf.clone());

        let sym_path = format!("{}.sym", &buf[..ext_start]);
        let warn = match loader::read_symbol_file(&sym_path) {
            Ok(symbols) => {
                self.machine.add_symbols(&symbols);
                false
            }
            Err(_) => true,
        };

        self.machine.regs.pc = start;

        if self.machine.gui_mode {
            // Load the new code into the GUI display and reorient it.
            disasm::disassemble_range(&mut self.machine, start, end);
            println!("TOCODE");
            self.machine.print_register(8);
            if warn {
                println!("ERR {{WARNING: No symbols are available.}}");
            }
        } else {
            println!("Loaded \"{}\" and set PC to x{:04X}", buf, start);
            if warn {
                println!("WARNING: No symbols are available.");
            }
        }

        // Loading while stopped at the GUI's request must not auto-resume,
        // but the display still needs the pending updates.
        if self.machine.interrupted_at_gui {
            self.machine.gui_stop_and_dump();
        }
    }

    fn cmd_finish(&mut self, args: &str) {
        self.no_args_allowed(args);
        self.flush_console_input();
        self.machine.finish_depth = 1;
        run_until_stopped(&mut self.machine);
    }

    fn cmd_help(&mut self, _args: &str) {
        println!("file <file>           -- file load (also sets PC to start of file)\n");
        println!("break ...             -- breakpoint management\n");
        println!("continue              -- continue execution");
        println!("finish                -- execute to end of current subroutine");
        println!("next                  -- execute next instruction (full subroutine/trap)");
        println!("step                  -- execute one step (into subroutine/trap)\n");
        println!("list ...              -- list instructions at the PC, an address, a label");
        println!("dump ...              -- dump memory at the PC, an address, a label");
        println!("translate <addr>      -- show the value of a label and print the contents");
        println!("printregs             -- print registers and current instruction\n");
        println!("memory <addr> <val>   -- set the value held in a memory location");
        println!("register <reg> <val>  -- set a register to a value\n");
        println!("execute <file name>   -- execute a script file\n");
        println!("reset                 -- reset LC-3 and reload last file\n");
        println!("quit                  -- quit the simulator\n");
        println!("help                  -- print this help\n");
        println!("All commands except quit can be abbreviated.");
    }

    fn cmd_list(&mut self, args: &str) {
        let ctx = RangeContext {
            symbols: &self.machine.symbols,
            pc: self.machine.regs.pc,
            last_end: Some(self.list_last_end),
        };
        if let Some(range) = parse_range(&ctx, args, &Scale::Window(10)) {
            if range.extra_args {
                self.warn_too_many_args();
            }
            disasm::disassemble_range(&mut self.machine, range.start, range.end);
            self.list_last_end = range.end;
            return;
        }

        println!("list options include:");
        println!("  list               -- list instructions around PC");
        println!("  list <addr>        -- list instructions starting from an address or label");
        println!("  list <addr> <addr> -- list a range of instructions");
        println!("  list more          -- continue previous listing (or press <Enter>)");
    }

    fn cmd_memory(&mut self, args: &str) {
        let ctx = RangeContext {
            symbols: &self.machine.symbols,
            pc: self.machine.regs.pc,
            last_end: None,
        };
        match parse_range(&ctx, args, &Scale::Exact) {
            Some(range) => {
                if range.extra_args {
                    self.warn_too_many_args();
                }
                let (addr, value) = (range.start, range.end);
                self.machine.write_memory(addr, value);
                if self.machine.gui_mode {
                    println!("TRANS x{:04X} x{:04X}", addr, value);
                    disasm::disassemble_one(&mut self.machine, addr);
                } else {
                    println!("Wrote x{:04X} to address x{:04X}.", value, addr);
                }
            }
            None => {
                if self.machine.gui_mode {
                    // The GUI supplies the address itself, so only the
                    // value can be bad here.
                    println!("ERR {{No address or label corresponding to the desired value exists.}}");
                } else {
                    println!("syntax: memory <addr> <value>");
                }
            }
        }
    }

    fn cmd_next(&mut self, args: &str) {
        let next_pc = self.machine.regs.pc.wrapping_add(1);

        self.no_args_allowed(args);
        self.flush_console_input();

        // The first instruction may already hit a breakpoint.
        if self.machine.execute_instruction() && self.machine.last_flags.subroutine {
            // A system breakpoint survives GUI interruptions, so the
            // pending `next` is not forgotten mid-run.
            self.machine.sys_breakpoint = Some(next_pc);
            run_until_stopped(&mut self.machine);
            return;
        }

        self.machine.show_state_if_stop_visible();
    }

    fn cmd_option(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();

        if tokens.len() >= 2 {
            let value = if tokens[1].eq_ignore_ascii_case("on") {
                Some(true)
            } else if tokens[1].eq_ignore_ascii_case("off") {
                Some(false)
            } else {
                None
            };
            if let Some(oval) = value {
                if tokens.len() > 2 {
                    self.warn_too_many_args();
                }
                if self.apply_option(tokens[0], oval) {
                    return;
                }
            }
        }

        println!("syntax: option <option> on|off\n   options include:");
        println!("      device -- simulate random device (keyboard/display)timing");
        println!("      flush  -- flush console input each time LC-3 starts");
        println!("      keep   -- keep remaining input when the LC-3 stops");
        println!("      stdin  -- use stdin for LC-3 console input during script execution");
        println!("NOTE: all options are ON by default");
    }

    fn apply_option(&mut self, name: &str, oval: bool) -> bool {
        let not = if oval { "" } else { "not " };

        if is_prefix(name, "flush") {
            self.machine.options.flush_on_start = oval;
            if !self.machine.gui_mode {
                println!("Will {}flush the console input when starting.", not);
            }
            return true;
        }
        if is_prefix(name, "keep") {
            self.machine.options.keep_input_on_stop = oval;
            if !self.machine.gui_mode {
                println!("Will {}keep remaining input when the LC-3 stops.", not);
            }
            return true;
        }
        if is_prefix(name, "device") {
            self.machine.options.rand_device = oval;
            if !self.machine.gui_mode {
                println!("Will {}randomize device interactions.", not);
            }
            return true;
        }
        // GUI only: defer memory updates until the LC-3 stops?
        if self.machine.gui_mode && is_prefix(name, "delay") {
            // Turning the option off while the GUI believes the processor
            // is running must dump immediately.
            if self.machine.options.delay_mem_update && !oval {
                self.machine.dump_delayed_mem_updates();
            }
            self.machine.options.delay_mem_update = oval;
            return true;
        }
        if is_prefix(name, "stdin") {
            self.machine.options.script_uses_stdin = oval;
            if !self.machine.gui_mode {
                println!(
                    "Will {}use stdin for LC-3 console input during script execution.",
                    not
                );
            }
            if !self.scripts.is_empty() {
                if !oval {
                    if let Some(top) = self.scripts.last() {
                        if let Ok(dup) = top.get_ref().try_clone() {
                            self.machine.console.set_input(Input::File(dup));
                        }
                    }
                } else if !self.machine.gui_mode {
                    self.machine.console.set_input(Input::Stdin);
                } else {
                    let _ = self.machine.console.rebind_input_to_output();
                }
            }
            return true;
        }

        false
    }

    fn cmd_printregs(&mut self, args: &str) {
        self.no_args_allowed(args);
        self.machine.print_registers();
    }

    fn cmd_quit(&mut self, args: &str) {
        self.no_args_allowed(args);
        process::exit(0);
    }

    fn cmd_register(&mut self, args: &str) {
        const RNAME: [&str; 12] = [
            "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "PC", "IR", "PSR", "CC",
        ];
        const CC_VAL: [&str; 4] = ["POSITIVE", "ZERO", "", "NEGATIVE"];

        let tokens: Vec<&str> = args.split_whitespace().collect();
        if tokens.len() < 2 {
            println!("syntax: register <reg> <value>");
            return;
        }

        let rnum = match RNAME
            .iter()
            .position(|name| name.eq_ignore_ascii_case(tokens[0]))
        {
            Some(rnum) => rnum,
            None => {
                println!("Registers are R0...R7, PC, IR, PSR, and CC.");
                return;
            }
        };

        // Condition codes are a special case: mnemonics, prefix-matched.
        if rnum == 11 {
            for (value, name) in CC_VAL.iter().enumerate() {
                if !name.is_empty() && is_prefix(tokens[1], name) {
                    let psr = self.machine.regs.psr;
                    self.machine.regs.psr = (psr & !0x0e00) | ((value as u16 + 1) << 9);
                    if self.machine.gui_mode {
                        // Printing the PSR prints both PSR and CC.
                        self.machine.print_register(10);
                    } else {
                        println!("Set CC to {}.", name);
                    }
                    return;
                }
            }
            self.report("CC can only be set to NEGATIVE, ZERO, or POSITIVE.");
            return;
        }

        match parse_address(&self.machine.symbols, tokens[1]) {
            Some(value) => {
                self.machine.regs.set_by_index(rnum, value);
                if self.machine.gui_mode {
                    self.machine.print_register(rnum);
                } else {
                    println!("Set {} to x{:04X}.", RNAME[rnum], value);
                }
            }
            None => {
                self.report("No address or label corresponding to the desired value exists.");
            }
        }
    }

    fn cmd_reset(&mut self, args: &str) {
        if !self.scripts.is_empty() {
            // Resetting from a script would re-run the script mid-unwind.
            self.report("Cannot reset the LC-3 from within a script.");
            return;
        }
        self.no_args_allowed(args);

        // The GUI learns about memory through the write path, so zero it
        // with real writes before wiping state behind the scenes.
        if self.machine.gui_mode {
            self.machine.interrupted_at_gui = false;
            for addr in 0..=0xffffu16 {
                self.machine.write_memory(addr, 0);
            }
            self.machine.gui_stop_and_dump();
        }

        self.machine.console.reset_latches();
        signals::clear_stop_notice();
        self.machine.sys_breakpoint = None;
        self.machine.finish_depth = 0;

        self.init_machine();

        if self.machine.gui_mode {
            println!("TOCODE");
        }
    }

    fn cmd_step(&mut self, args: &str) {
        self.no_args_allowed(args);
        self.flush_console_input();
        self.machine.execute_instruction();
        self.machine.show_state_if_stop_visible();
    }

    fn cmd_translate(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        if tokens.len() > 1 {
            self.warn_too_many_args();
        }
        let token = match tokens.first() {
            Some(&token) => token,
            None => {
                println!("syntax: translate <addr>");
                return;
            }
        };

        let addr = match parse_address(&self.machine.symbols, token) {
            Some(addr) => addr,
            None => {
                if self.machine.gui_mode {
                    println!("ERR {{No such address or label exists.}}");
                } else {
                    println!("{}", BAD_ADDRESS);
                }
                return;
            }
        };

        let value = self.machine.read_memory(addr);
        if self.machine.gui_mode {
            println!("TRANS x{:04X} x{:04X}", addr, value);
        } else {
            println!("Address x{:04X} has value x{:04x}.", addr, value);
        }
    }

    /// The GUI's stop button: halt the (already stopped) simulator's
    /// pending run state and dump everything.
    fn cmd_lc3_stop(&mut self, _args: &str) {
        self.machine.gui_stop_and_dump();
    }

    #[cfg(test)]
    fn fixture() -> Self {
        Self {
            machine: Machine::fixture(),
            editor: None,
            scripts: Vec::new(),
            stop_scripts: false,
            start_file: None,
            start_script: None,
            dump_last_end: 0,
            list_last_end: 0,
        }
    }
}

fn strip_newline(line: &mut String) {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_respect_minimum_lengths() {
        assert_eq!(lookup("co", false).unwrap().name, "continue");
        assert_eq!(lookup("c", false).unwrap().name, "continue");
        assert_eq!(lookup("quit", false).unwrap().name, "quit");
        assert!(lookup("q", false).is_none());
        assert!(lookup("qui", false).is_none());
        assert_eq!(lookup("fin", false).unwrap().name, "finish");
        assert!(lookup("fi", false).unwrap().name == "file");
        assert_eq!(lookup("reset", false).unwrap().name, "reset");
        assert!(lookup("rese", false).is_none());
        assert_eq!(lookup("r", false).unwrap().name, "register");
        assert_eq!(lookup("STEP", false).unwrap().name, "step");
        assert!(lookup("stepp", false).is_none());
    }

    #[test]
    fn gui_commands_are_hidden() {
        assert!(lookup("x", false).is_none());
        assert_eq!(lookup("x", true).unwrap().name, "x");
    }

    #[test]
    fn unknown_words_do_not_match() {
        assert!(lookup("bogus", false).is_none());
        assert!(lookup("", false).is_none());
    }

    #[test]
    fn memory_command_writes_a_word() {
        let mut debugger = Debugger::fixture();
        debugger.cmd_memory("x4000 #18");
        assert_eq!(debugger.machine.read_memory(0x4000), 18);

        // Symbolic values work on both sides.
        debugger.machine.symbols.add("SPOT", 0x4100, true);
        debugger.cmd_memory("SPOT SPOT");
        assert_eq!(debugger.machine.read_memory(0x4100), 0x4100);
    }

    #[test]
    fn break_command_sets_and_clears() {
        let mut debugger = Debugger::fixture();
        debugger.cmd_break("set x3000");
        assert!(debugger.machine.is_breakpoint(0x3000));
        debugger.cmd_break("c x3000");
        assert!(!debugger.machine.is_breakpoint(0x3000));

        debugger.cmd_break("set x3000");
        debugger.cmd_break("set x3004");
        debugger.cmd_break("clear all");
        assert!(!debugger.machine.is_breakpoint(0x3000));
        assert!(!debugger.machine.is_breakpoint(0x3004));
    }

    #[test]
    fn register_command_sets_registers_and_cc() {
        let mut debugger = Debugger::fixture();
        debugger.cmd_register("PC x200");
        assert_eq!(debugger.machine.regs.pc, 0x0200);

        debugger.cmd_register("r3 #10");
        assert_eq!(
            debugger.machine.regs.read(crate::instruction::Register::R3),
            10
        );

        debugger.cmd_register("CC N");
        assert_eq!(debugger.machine.regs.cc_name(), "NEGATIVE");
        debugger.cmd_register("cc pos");
        assert_eq!(debugger.machine.regs.cc_name(), "POSITIVE");
        debugger.cmd_register("CC Z");
        assert_eq!(debugger.machine.regs.cc_name(), "ZERO");
    }

    #[test]
    fn option_command_prefix_matches() {
        let mut debugger = Debugger::fixture();
        debugger.cmd_option("device off");
        assert!(!debugger.machine.options.rand_device);
        debugger.cmd_option("d on");
        assert!(debugger.machine.options.rand_device);
        debugger.cmd_option("k off");
        assert!(!debugger.machine.options.keep_input_on_stop);
        debugger.cmd_option("flush off");
        assert!(!debugger.machine.options.flush_on_start);
        // "delay" is GUI-only; outside GUI mode it falls through to the
        // syntax message without touching the option.
        debugger.cmd_option("delay off");
        assert!(debugger.machine.options.delay_mem_update);
    }

    #[test]
    fn step_command_advances_one_instruction() {
        let mut debugger = Debugger::fixture();
        debugger.machine.write_memory(0x3000, 0x0000);
        debugger.cmd_step("");
        assert_eq!(debugger.machine.regs.pc, 0x3001);
    }

    #[test]
    fn next_command_runs_over_subroutines() {
        let mut debugger = Debugger::fixture();
        // 0x3000: JSR 0x3004; subroutine loops a little, then returns.
        debugger.machine.write_memory(0x3000, 0x4803);
        debugger.machine.write_memory(0x3004, 0x0000);
        debugger.machine.write_memory(0x3005, 0xc1c0);

        debugger.cmd_next("");
        assert_eq!(debugger.machine.regs.pc, 0x3001);
        assert_eq!(debugger.machine.sys_breakpoint, None);
    }

    #[test]
    fn next_equals_step_for_straight_line_code() {
        let mut debugger = Debugger::fixture();
        debugger.machine.write_memory(0x3000, 0x1021); // ADD R0,R0,#1
        debugger.cmd_next("");
        assert_eq!(debugger.machine.regs.pc, 0x3001);
        assert_eq!(
            debugger.machine.regs.read(crate::instruction::Register::R0),
            1
        );
    }

    #[test]
    fn finish_stops_after_return() {
        let mut debugger = Debugger::fixture();
        // Caller at 0x3000 did `JSR 0x3004` already; we are inside the
        // subroutine with R7 pointing back at 0x3001.
        debugger.machine.regs.pc = 0x3004;
        debugger
            .machine
            .regs
            .write(crate::instruction::Register::R7, 0x3001);
        debugger.machine.write_memory(0x3004, 0x0000);
        debugger.machine.write_memory(0x3005, 0xc1c0); // RET

        debugger.cmd_finish("");
        assert_eq!(debugger.machine.regs.pc, 0x3001);
        assert_eq!(debugger.machine.finish_depth, 0);
    }

    #[test]
    fn translate_reads_through_symbols() {
        let mut debugger = Debugger::fixture();
        debugger.machine.symbols.add("DATA", 0x5000, true);
        debugger.machine.write_memory(0x5000, 0x1234);
        // Rendering goes to stdout; the state must be untouched.
        debugger.cmd_translate("DATA");
        assert_eq!(debugger.machine.read_memory(0x5000), 0x1234);
    }
}
