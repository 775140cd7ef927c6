/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub struct Config {
    pub gui: bool,
    /// Object or symbol file loaded at startup and on `reset`.
    pub file: Option<String>,
    /// Script executed at startup (`-s`) and re-run on `reset`.
    pub script: Option<String>,
}

/// Runtime toggles driven by the `option` command. Everything defaults on.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Flush pending LC-3 console input when execution starts.
    pub flush_on_start: bool,
    /// Keep unread console input when the LC-3 stops.
    pub keep_input_on_stop: bool,
    /// Randomize keyboard/display ready-bit timing.
    pub rand_device: bool,
    /// GUI only: defer memory-change reports until the LC-3 stops.
    pub delay_mem_update: bool,
    /// Keep the LC-3 console on stdin while a script runs.
    pub script_uses_stdin: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            flush_on_start: true,
            keep_input_on_stop: true,
            rand_device: true,
            delay_mem_update: true,
            script_uses_stdin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_options_default_on() {
        let options = Options::default();
        assert!(options.flush_on_start);
        assert!(options.keep_input_on_stop);
        assert!(options.rand_device);
        assert!(options.delay_mem_update);
        assert!(options.script_uses_stdin);
    }
}
