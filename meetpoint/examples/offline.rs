//! Offline meeting point example.
//!
//! Run with: cargo run --example offline -- 849VCWC8+R9 "37.40,-122.10" ...

use meetpoint::{MeetingPlanner, MeetpointError};
use std::env;

fn main() -> Result<(), MeetpointError> {
    let mut codes: Vec<String> = env::args().skip(1).collect();
    if codes.is_empty() {
        // A few spots around Mountain View, CA
        codes = vec![
            "849VCWC8+R9".to_string(),
            "849VCWG9+5X".to_string(),
            "37.3861,-122.0839".to_string(),
        ];
    }

    let planner = MeetingPlanner::builder().cache_size(100).build()?;
    let plan = planner.plan_codes(codes)?;

    println!("Location codes:");
    for code in &plan.codes {
        println!("  {}", code);
    }
    for failure in &plan.geocode_failures {
        eprintln!("{}", failure);
    }

    println!("\nRefined midpoint: {}", plan.midpoint());
    println!("{:-<50}", "");
    for entry in &plan.report {
        println!("{}", entry);
    }

    Ok(())
}
