//! `config` subcommand: show current configuration and file paths.

use super::{
    Config, ConfigOutput, Options, Result, color, kv, kv_indent, kv_width, load_config, print_json,
};

pub(super) fn cmd_config(opts: &Options) -> Result<()> {
    let custom_path = opts.config_path.as_deref();
    let config = load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };

    if opts.json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            problems,
        };
        return print_json(&output);
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "light_index:",
            "color:",
            "dim:",
            "flash:",
            "flash_speed:",
            "volume:",
            "cycle_interval_ms:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => {
            kv("Config file:", format_args!("{} (loaded)", p.display()), w)
        }
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("light_index:", config.light_index, w);
    let color_display = match color::parse_color(&config.color) {
        Ok(c) => format!("{} -> {}", config.color, color::format_color(c)),
        Err(_) => format!("{} (invalid)", config.color),
    };
    kv_indent("color:", &color_display, w);
    kv_indent("dim:", config.dim, w);
    kv_indent("flash:", config.flash, w);
    kv_indent("flash_speed:", &config.flash_speed, w);
    kv_indent("volume:", config.volume, w);
    kv_indent("cycle_interval_ms:", config.cycle_interval_ms, w);

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}
