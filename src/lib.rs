mod config;
mod console;
mod debugger;
mod disasm;
mod execute;
mod instruction;
mod loader;
mod machine;
mod memory;
mod os;
mod parse;
mod registers;
mod run;
mod sign_extend;
mod signals;
mod symbol;

pub use crate::config::Config;
use crate::console::Console;
use crate::debugger::Debugger;
use crate::machine::Machine;
use std::io;
use std::net::{Ipv4Addr, TcpStream};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The GUI front end never told us a usable port, or the loopback
    /// connection failed.
    #[error("failed to connect to GUI")]
    GuiConnect(#[source] io::Error),
    #[error("cannot install the interrupt handler")]
    Signals(#[source] nix::Error),
}

pub fn run(config: Config) -> Result<(), Error> {
    signals::install().map_err(Error::Signals)?;

    let console = if config.gui {
        Console::gui(connect_gui()?).map_err(Error::GuiConnect)?
    } else {
        Console::stdio()
    };

    let machine = Machine::new(console, config.gui);
    let script_mode = config.script.is_some();

    let mut debugger = Debugger::new(machine, &config);
    debugger.init_machine();

    // `-s` runs the startup script during init and exits.
    if script_mode {
        return Ok(());
    }

    debugger.command_loop();
    println!();
    Ok(())
}

/// The GUI hands us a decimal port number on stdin; the connection serves
/// as the LC-3 console in both directions.
fn connect_gui() -> Result<TcpStream, Error> {
    let mut line = String::new();
    io::stdin().read_line(&mut line).map_err(Error::GuiConnect)?;
    let port: u16 = line.trim().parse().map_err(|_| {
        Error::GuiConnect(io::Error::new(
            io::ErrorKind::InvalidData,
            "bad port number",
        ))
    })?;

    TcpStream::connect((Ipv4Addr::LOCALHOST, port)).map_err(Error::GuiConnect)
}
