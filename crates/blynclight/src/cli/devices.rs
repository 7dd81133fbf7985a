//! `devices` subcommand: list connected BlyncLights.

use super::{BlyncLight, DevicesOutput, PlatformBackend, PlatformDevice, Result, print_json};

pub(super) fn cmd_devices(json: bool) -> Result<()> {
    let devices = BlyncLight::<PlatformDevice>::available_lights(&PlatformBackend::default())?;

    if json {
        let output = DevicesOutput {
            count: devices.len(),
            devices,
        };
        return print_json(&output);
    }

    if devices.is_empty() {
        println!("No BlyncLights found.");
        return Ok(());
    }

    println!(
        "Found {} BlyncLight{}:",
        devices.len(),
        if devices.len() == 1 { "" } else { "s" }
    );
    println!();

    for (i, dev) in devices.iter().enumerate() {
        println!("  [{i}] {dev}");
        if let Some(ref serial) = dev.serial {
            println!("      Serial: {serial}");
        }
    }

    Ok(())
}
