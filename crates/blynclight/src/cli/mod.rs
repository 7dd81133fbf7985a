//! CLI subcommands for `blync`.

mod config_cmd;
mod cycle;
mod devices;
mod light;
mod set;
mod sound;
mod status;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use blynclight_lib::color::{self, Color};
pub(super) use blynclight_lib::command::{Field, Status};
pub(super) use blynclight_lib::config::Config;
pub(super) use blynclight_lib::device::{LightInfo, PlatformBackend, PlatformDevice};
pub(super) use blynclight_lib::error::Result;
pub(super) use blynclight_lib::protocol::{FlashSpeed, MAX_VOLUME};
pub(super) use blynclight_lib::BlyncLight;

use set::Assignment;

/// Options shared by every subcommand.
pub struct Options {
    pub json: bool,
    pub config_path: Option<PathBuf>,
    pub light: Option<usize>,
}

/// Load config from `path` (or the default location), logging parse warnings.
pub(super) fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => {
            let (config, warnings) = Config::load_from(p);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

/// Claim the light selected by `--light` or the config.
pub(super) fn open_light(opts: &Options, config: &Config) -> Result<BlyncLight<PlatformDevice>> {
    let index = opts.light.unwrap_or(config.light_index);
    let light = BlyncLight::get_light(&PlatformBackend::default(), index)?;
    log::info!("using {}", light.info());
    Ok(light)
}

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Print `value` as pretty JSON.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let s = serde_json::to_string_pretty(value)
        .map_err(|e| blynclight_lib::BlyncError::Io(std::io::Error::other(e)))?;
    println!("{s}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub count: usize,
    pub devices: Vec<LightInfo>,
}

#[derive(Serialize)]
pub(super) struct LightStatusJson {
    pub light: LightInfo,
    pub on: bool,
    pub color: String,
    pub dim: bool,
    pub flash: bool,
    pub bytes: String,
    pub fields: Status,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub problems: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List connected BlyncLights
    Devices,

    /// Turn the light on
    On {
        /// Color (name or #RRGGBB), default from config
        #[arg(long)]
        color: Option<String>,
        /// Dim the light
        #[arg(long, conflicts_with = "bright")]
        dim: bool,
        /// Full brightness, even if the config sets `dim`
        #[arg(long)]
        bright: bool,
        /// Flash the light
        #[arg(long, conflicts_with = "no_flash")]
        flash: bool,
        /// Steady light, even if the config sets `flash`
        #[arg(long)]
        no_flash: bool,
        /// Flash speed: slow, medium or fast
        #[arg(long)]
        speed: Option<FlashSpeed>,
    },

    /// Turn the light off
    Off,

    /// Write raw fields in a single update, e.g. `set red=255 flash=1`
    Set {
        /// NAME=VALUE pairs. VALUE is decimal, 0x hex or true/false/on/off.
        /// `color` takes a name, #RRGGBB, or a 0xRRBBGG wire value (no bare digits)
        #[arg(value_name = "NAME=VALUE", required = true, value_parser = set::parse_assignment)]
        assignments: Vec<Assignment>,
    },

    /// Play a built-in tune
    Play {
        /// Tune number (0-15)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
        music: u8,
        /// Volume (0-15), default from config
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
        volume: Option<u8>,
        /// Repeat until `quiet`
        #[arg(long)]
        repeat: bool,
    },

    /// Stop playing and mute
    Quiet,

    /// Cycle through colors until Ctrl+C
    Cycle {
        /// Milliseconds between color steps, default from config
        #[arg(long, value_name = "MS")]
        interval: Option<u64>,
    },

    /// Show current configuration and file paths
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, opts: &Options) -> Result<()> {
    match cmd {
        Command::Devices => devices::cmd_devices(opts.json),
        Command::On {
            color,
            dim,
            bright,
            flash,
            no_flash,
            speed,
        } => {
            if opts.json {
                warn_json_unsupported("on");
            }
            light::cmd_on(
                opts,
                light::OnArgs {
                    color,
                    dim: light::flag_override(dim, bright),
                    flash: light::flag_override(flash, no_flash),
                    speed,
                },
            )
        }
        Command::Off => {
            if opts.json {
                warn_json_unsupported("off");
            }
            light::cmd_off(opts)
        }
        Command::Set { assignments } => set::cmd_set(opts, &assignments),
        Command::Play {
            music,
            volume,
            repeat,
        } => {
            if opts.json {
                warn_json_unsupported("play");
            }
            sound::cmd_play(opts, music, volume, repeat)
        }
        Command::Quiet => {
            if opts.json {
                warn_json_unsupported("quiet");
            }
            sound::cmd_quiet(opts)
        }
        Command::Cycle { interval } => {
            if opts.json {
                warn_json_unsupported("cycle");
            }
            cycle::cmd_cycle(opts, interval)
        }
        Command::Config => config_cmd::cmd_config(opts),
    }
}


#[cfg(test)]
mod json_output_tests {
    use super::*;

    fn info() -> LightInfo {
        LightInfo {
            vendor_id: 0x2C0D,
            product_id: 0x000C,
            path: "usb:001/004".into(),
            serial: None,
            product: Some("BlyncLight".into()),
        }
    }

    #[test]
    fn devices_output_empty() {
        let output = DevicesOutput {
            count: 0,
            devices: vec![],
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["count"], 0);
        assert!(parsed["devices"].as_array().unwrap().is_empty());
    }

    #[test]
    fn devices_output_with_devices() {
        let output = DevicesOutput {
            count: 1,
            devices: vec![info()],
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["devices"][0]["path"], "usb:001/004");
        assert!(parsed["devices"][0]["serial"].is_null());
    }

    #[test]
    fn config_output_complete() {
        let output = ConfigOutput {
            config_file: Some("/home/user/.config/blynclight/config.toml".into()),
            config_file_exists: true,
            settings: Config::default(),
            problems: vec![],
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert!(parsed["config_file"].is_string());
        assert_eq!(parsed["settings"]["color"], "green");
        assert_eq!(parsed["settings"]["flash_speed"], "slow");
        assert!(parsed["problems"].as_array().unwrap().is_empty());
    }

    #[test]
    fn light_status_has_expected_fields() {
        let word = blynclight_lib::CommandWord::new();
        let output = LightStatusJson {
            light: info(),
            on: false,
            color: Color::OFF.to_string(),
            dim: false,
            flash: false,
            bytes: word.to_string(),
            fields: word.status(),
        };
        let parsed = serde_json::to_value(&output).unwrap();
        let obj = parsed.as_object().unwrap();
        assert_eq!(obj.len(), 7);
        assert_eq!(parsed["color"], "#000000");
        assert_eq!(parsed["fields"]["mute"], 1);
        assert_eq!(parsed["fields"].as_object().unwrap().len(), 12);
    }
}
