//! Light status output shared by commands that change the light.

use blynclight_lib::device::HidDevice;

use super::{BlyncLight, Field, LightStatusJson, Result, kv, kv_indent, kv_width, print_json};

pub(super) fn print_status<D: HidDevice>(light: &BlyncLight<D>, json: bool) -> Result<()> {
    if json {
        let output = LightStatusJson {
            light: light.info().clone(),
            on: light.on(),
            color: light.color().to_string(),
            dim: light.dim(),
            flash: light.get(Field::Flash) != 0,
            bytes: light.command().to_string(),
            fields: light.status(),
        };
        return print_json(&output);
    }

    let names: Vec<String> = Field::ALL.iter().map(|f| format!("{f}:")).collect();
    let indent: Vec<&str> = names.iter().map(String::as_str).collect();
    let w = kv_width(&["Light:", "State:", "Color:", "Bytes:"], &indent);

    kv("Light:", light.info(), w);
    kv("State:", if light.on() { "on" } else { "off" }, w);
    kv("Color:", light.color(), w);
    kv("Bytes:", light.command(), w);
    println!();
    println!("Fields:");
    for (name, value) in light.status().iter() {
        kv_indent(&format!("{name}:"), value, w);
    }
    Ok(())
}
