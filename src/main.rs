use clap::{App, Arg};
use lc3sim::{Config, Error};
use std::env;
use std::process;

fn main() {
    env_logger::init();

    // The GUI front end invokes `lc3sim -gui`; clap cannot express a
    // single-dash long flag, so it is peeled off before parsing.
    let mut args: Vec<String> = env::args().collect();
    let gui = args.len() > 1 && args[1] == "-gui";
    if gui {
        args.remove(1);
    }

    let matches = App::new("lc3sim")
        .about("Interactive simulator and debugger for the LC-3")
        .arg(
            Arg::with_name("script")
                .short("s")
                .value_name("SCRIPT")
                .help("Runs a simulator script and exits")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("FILE")
                .help("Object or symbol file to load at startup")
                .index(1)
                .conflicts_with("script"),
        )
        .get_matches_from(args);

    let config = Config {
        gui,
        file: matches.value_of("FILE").map(str::to_string),
        script: matches.value_of("script").map(str::to_string),
    };

    if let Err(e) = lc3sim::run(config) {
        match e {
            Error::GuiConnect(_) => println!("failed to connect to GUI"),
            other => println!("{}", other),
        }
        process::exit(1);
    }
}
