use anyhow::{Context, Result};
use meetpoint::{plus_code, Coordinate};

pub fn run(lat: f64, lng: f64, length: usize) -> Result<()> {
    let coord = Coordinate::new(lat, lng)?;
    let code = plus_code::encode(coord, length)
        .with_context(|| format!("Failed to encode {}", coord))?;

    println!("{}", code);
    Ok(())
}
