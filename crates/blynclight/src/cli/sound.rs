//! `play` / `quiet` subcommands: drive the built-in sound bits.

use super::{Field, MAX_VOLUME, Options, Result, load_config, open_light};

pub(super) fn cmd_play(opts: &Options, music: u8, volume: Option<u8>, repeat: bool) -> Result<()> {
    let config = load_config(opts.config_path.as_deref());
    let volume = volume.unwrap_or(config.volume).min(MAX_VOLUME);

    let mut light = open_light(opts, &config)?;
    light.with_updates_paused(|l| -> Result<()> {
        l.set(Field::Music, music.into())?;
        l.set(Field::Volume, volume.into())?;
        l.set(Field::Repeat, repeat.into())?;
        l.set(Field::Mute, 0)?;
        l.set(Field::Play, 1)?;
        Ok(())
    })?;

    println!(
        "Playing tune {music} at volume {volume}{}",
        if repeat { " (repeating)" } else { "" }
    );
    Ok(())
}

pub(super) fn cmd_quiet(opts: &Options) -> Result<()> {
    let config = load_config(opts.config_path.as_deref());
    let mut light = open_light(opts, &config)?;
    light.with_updates_paused(|l| -> Result<()> {
        l.set(Field::Play, 0)?;
        l.set(Field::Repeat, 0)?;
        l.set(Field::Mute, 1)?;
        Ok(())
    })?;
    println!("Sound: OFF");
    Ok(())
}
