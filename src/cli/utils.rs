use serde_json::json;

use crate::cli::OutputFormat;
use crate::models::Mission;

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Output a mission list, one line per mission in text mode
pub fn output_missions(output_format: &OutputFormat, missions: &[Mission]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "missions": missions }))?);
        }
        OutputFormat::Text => {
            println!("{:<6} {:<12} {:<12} {}", "ID", "LAUNCH", "ROCKET", "TITLE");
            for mission in missions {
                println!("{}", mission_row(mission));
            }
        }
    }
    Ok(())
}

/// Output a single mission with its crew
pub fn output_mission(output_format: &OutputFormat, mission: &Mission) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "mission": mission }))?);
        }
        OutputFormat::Text => {
            println!("{}", mission.title);
            println!("ID: {}", mission.id);
            println!("Rocket: {}", mission.rocket);
            if !mission.launch_date.is_empty() {
                println!("Launch date: {}", mission.launch_date);
            }
            println!("Commander: {}", mission.commander);
            println!("Senior pilot / CM pilot: {}", mission.senior_pilot_or_command_module_pilot);
            println!("Pilot / LM pilot: {}", mission.pilot_or_lunar_module_pilot);
        }
    }
    Ok(())
}

fn mission_row(mission: &Mission) -> String {
    // Launch dates arrive as ISO timestamps; the date part is enough here
    let launch = mission.launch_date.get(..10).unwrap_or(&mission.launch_date);
    format!("{:<6} {:<12} {:<12} {}", mission.id, launch, mission.rocket, mission.title)
}
