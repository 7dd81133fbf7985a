//! `set` subcommand: write raw fields in one suspended update.

use blynclight_lib::light::check_name;

use super::{Options, Result, color, load_config, open_light, status};

/// One parsed `NAME=VALUE` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: u32,
}

/// Parse `NAME=VALUE`. Unknown names are rejected here, before any device is opened.
pub(super) fn parse_assignment(s: &str) -> std::result::Result<Assignment, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got \"{s}\""))?;
    let name = name.trim().to_lowercase();
    check_name(&name).map_err(|e| e.to_string())?;
    let value = parse_value(&name, value.trim())?;
    Ok(Assignment { name, value })
}

/// Parse a field value: decimal, `0x` hex or a boolean word.
///
/// `color` has its own forms, see [`parse_color_value`].
fn parse_value(name: &str, value: &str) -> std::result::Result<u32, String> {
    if name == "color" {
        return parse_color_value(value);
    }
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" => return Ok(1),
        "false" | "off" | "no" => return Ok(0),
        _ => {}
    }
    let parsed = match strip_hex_prefix(value) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|_| format!("invalid value for {name}: \"{value}\""))
}

/// Parse a `color` value: a color name, canonical `#RRGGBB`, or a packed
/// wire-order `0xRRBBGG`.
///
/// Bare digit strings are rejected: `00ff00` could mean either byte order.
fn parse_color_value(value: &str) -> std::result::Result<u32, String> {
    if let Some(hex) = strip_hex_prefix(value) {
        return match u32::from_str_radix(hex, 16) {
            Ok(packed) if packed <= 0xFF_FFFF => Ok(packed),
            _ => Err(format!(
                "invalid value for color: \"{value}\" (0x wire values are 0xRRBBGG, at most 0xFFFFFF)"
            )),
        };
    }
    if !value.starts_with('#') && value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "invalid value for color: \"{value}\" (use a name, #RRGGBB or 0xRRBBGG)"
        ));
    }
    color::parse_color(value)
        .map(|c| c.packed())
        .map_err(|e| format!("invalid value for color: {e}"))
}

fn strip_hex_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))
}

pub(super) fn cmd_set(opts: &Options, assignments: &[Assignment]) -> Result<()> {
    let config = load_config(opts.config_path.as_deref());
    let mut light = open_light(opts, &config)?;

    light.with_updates_paused(|l| -> Result<()> {
        for a in assignments {
            log::debug!("set {}={:#x}", a.name, a.value);
            l.set_by_name(&a.name, a.value)?;
        }
        Ok(())
    })?;

    status::print_status(&light, opts.json)
}
