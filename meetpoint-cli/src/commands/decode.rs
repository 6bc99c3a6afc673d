use anyhow::{Context, Result};
use meetpoint::plus_code;
use serde::Serialize;

#[derive(Serialize)]
struct DecodeResponse {
    code: String,
    lat: f64,
    lng: f64,
    south: f64,
    west: f64,
    north: f64,
    east: f64,
    code_length: usize,
}

pub fn run(code: &str, json: bool) -> Result<()> {
    let area = plus_code::decode(code).with_context(|| format!("Failed to decode '{}'", code))?;
    let center = area.center();

    if json {
        let response = DecodeResponse {
            code: code.trim().to_uppercase(),
            lat: center.lat(),
            lng: center.lng(),
            south: area.south,
            west: area.west,
            north: area.north,
            east: area.east,
            code_length: area.code_length,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{:.7}, {:.7}", center.lat(), center.lng());
    }

    Ok(())
}
