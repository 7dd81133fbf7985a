//! `on` / `off` subcommands.

use super::{Color, Config, Field, FlashSpeed, Options, Result, color, load_config, open_light};

/// Options for `blync on`. Unset values fall back to the config.
pub(super) struct OnArgs {
    pub color: Option<String>,
    pub dim: Option<bool>,
    pub flash: Option<bool>,
    pub speed: Option<FlashSpeed>,
}

/// Fold a `--x` / `--no-x` pair into an override. clap rejects both at once.
pub(super) fn flag_override(set: bool, unset: bool) -> Option<bool> {
    match (set, unset) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// What `on` will write after command-line overrides are applied to the config.
#[derive(Debug, PartialEq)]
struct OnSettings {
    color: Color,
    dim: bool,
    flash: bool,
    speed: FlashSpeed,
}

impl OnArgs {
    fn resolve(&self, config: &Config) -> Result<OnSettings> {
        let color = match &self.color {
            Some(c) => color::parse_color(c)?,
            None => config.color()?,
        };
        let speed = match self.speed {
            Some(s) => s,
            None => config.flash_speed()?,
        };
        Ok(OnSettings {
            color,
            dim: self.dim.unwrap_or(config.dim),
            flash: self.flash.unwrap_or(config.flash),
            speed,
        })
    }
}

pub(super) fn cmd_on(opts: &Options, args: OnArgs) -> Result<()> {
    let config = load_config(opts.config_path.as_deref());
    let OnSettings {
        color,
        dim,
        flash,
        speed,
    } = args.resolve(&config)?;

    let mut light = open_light(opts, &config)?;
    light.with_updates_paused(|l| -> Result<()> {
        l.set_color(color)?;
        l.set_dim(dim)?;
        l.set(Field::Flash, flash.into())?;
        l.set(Field::Speed, speed.value())?;
        l.set_on(true)?;
        Ok(())
    })?;

    let mut extras = Vec::new();
    if dim {
        extras.push("dim".to_string());
    }
    if flash {
        extras.push(format!("flashing {speed}"));
    }
    if extras.is_empty() {
        println!("Light: ON {color}");
    } else {
        println!("Light: ON {color} ({})", extras.join(", "));
    }
    Ok(())
}

pub(super) fn cmd_off(opts: &Options) -> Result<()> {
    let config = load_config(opts.config_path.as_deref());
    let mut light = open_light(opts, &config)?;
    light.reset(true)?;
    println!("Light: OFF");
    Ok(())
}
