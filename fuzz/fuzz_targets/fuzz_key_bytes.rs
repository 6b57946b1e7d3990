#![no_main]
use libfuzzer_sys::fuzz_target;
use teleop_core::{Bindings, Session, apply_command};

fuzz_target!(|data: &[u8]| {
    // Any keystroke sequence keeps every dispatched axis inside [-1, 1].
    let bindings = Bindings::default();
    let session = Session::new();
    for b in data {
        if let Some(cmd) = bindings.on_byte(*b) {
            apply_command(&session, cmd);
        }
        let c = session.state.read_and_advance(0.15);
        assert!(c.max_abs() <= 1.0);
    }
});
