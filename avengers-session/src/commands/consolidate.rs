use std::path::Path;

use serde_json::json;

use avengers_session::config::AppConfig;
use avengers_session::consolidate::{consolidate, Consolidation};

pub fn run(
    config: &AppConfig,
    mission_id: &str,
    force: bool,
    output: Option<&Path>,
    json: bool,
) -> anyhow::Result<u8> {
    let store = super::store(config);

    match consolidate(&store, mission_id, force, output)? {
        Consolidation::Incomplete(validation) => {
            if json {
                let output = json!({
                    "mission_id": mission_id,
                    "report_path": null,
                    "validation": validation,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            eprintln!(
                "Mission {} is incomplete: {}/{} agents produced results.",
                mission_id, validation.completed, validation.total
            );
            for issue in &validation.issues {
                eprintln!("  - {}", issue);
            }
            eprintln!("Re-run with --force to write the report anyway.");
            Ok(1)
        }
        Consolidation::Written {
            mission,
            report_path,
            validation,
        } => {
            if json {
                let output = json!({
                    "mission_id": mission.id,
                    "report_path": report_path,
                    "validation": validation,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Consolidated mission {}", mission.id);
                println!("Report: {}", report_path.display());
                println!("{}", "=".repeat(60));
                println!("  Agents:    {}", validation.total);
                println!("  Completed: {}", validation.completed);
                if validation.success {
                    println!("  Outcome:   success");
                } else {
                    println!("  Outcome:   partial ({} issues)", validation.issues.len());
                }
                println!("{}", "=".repeat(60));
            }
            Ok(0)
        }
    }
}
