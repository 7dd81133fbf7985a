//! `cycle` subcommand: walk the color wheel until Ctrl+C.

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{Color, Options, RUNNING, Result, load_config, open_light};
use blynclight_lib::config::MIN_CYCLE_INTERVAL_MS;

pub(super) fn cmd_cycle(opts: &Options, interval: Option<u64>) -> Result<()> {
    let config = load_config(opts.config_path.as_deref());
    let interval = interval
        .unwrap_or(config.cycle_interval_ms)
        .max(MIN_CYCLE_INTERVAL_MS);

    let mut light = open_light(opts, &config)?;
    light.with_updates_paused(|l| -> Result<()> {
        l.set_color(Color::wheel(0))?;
        l.set_on(true)?;
        Ok(())
    })?;

    println!("Cycling colors every {interval} ms. Press Ctrl+C to stop.");
    let mut position: u8 = 0;
    while RUNNING.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(interval));
        position = position.wrapping_add(1);
        light.set_color(Color::wheel(position))?;
    }

    light.reset(true)?;
    println!("Light: OFF");
    Ok(())
}
