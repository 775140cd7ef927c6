//! SIGINT handling. The handler is restricted to two atomic flag stores;
//! the run loop polls them between retired instructions.

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

static HALT_REQUESTED: AtomicBool = AtomicBool::new(false);
static STOP_NOTICE_NEEDED: AtomicBool = AtomicBool::new(false);

extern "C" fn halt_lc3(_: libc::c_int) {
    // Has no effect unless the LC-3 is running.
    HALT_REQUESTED.store(true, Ordering::SeqCst);
    // Print a stop notice after ^C.
    STOP_NOTICE_NEEDED.store(true, Ordering::SeqCst);
}

/// Install the persistent SIGINT handler.
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(halt_lc3),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGINT, &action) }.map(|_| ())
}

pub fn halt_requested() -> bool {
    HALT_REQUESTED.load(Ordering::SeqCst)
}

pub fn clear_halt() {
    HALT_REQUESTED.store(false, Ordering::SeqCst);
}

/// Consume the pending stop notice, if any.
pub fn take_stop_notice() -> bool {
    STOP_NOTICE_NEEDED.swap(false, Ordering::SeqCst)
}

pub fn clear_stop_notice() {
    STOP_NOTICE_NEEDED.store(false, Ordering::SeqCst);
}
