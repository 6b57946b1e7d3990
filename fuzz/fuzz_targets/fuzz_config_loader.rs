#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    let Ok(cfg) = teleop_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // A valid config must also convert into runtime settings.
        let lp = teleop_core::LoopCfg::from(&cfg);
        assert!(lp.alpha > 0.0 && lp.alpha <= 1.0);
        assert!(lp.tick_hz > 0);
        let _ = teleop_core::KeyMap::from(&cfg.keys);
    }
});
