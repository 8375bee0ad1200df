use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use avengers_session::config::AppConfig;
use avengers_session::state::{TaskStatus, DEFAULT_LOG_LIMIT};
use avengers_session::watch::{watch_mission, StatusReport, WatchOutcome};

const BAR_WIDTH: usize = 40;
const SHOWN_LOG_ENTRIES: usize = 5;

pub fn run(config: &AppConfig, mission_id: &str, json: bool) -> anyhow::Result<u8> {
    let store = super::store(config);
    let report = StatusReport::collect(&store, mission_id, DEFAULT_LOG_LIMIT)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(0)
}

pub fn watch(config: &AppConfig, mission_id: &str, interval_secs: u64, json: bool) -> anyhow::Result<u8> {
    let store = super::store(config);

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))?;

    if !json {
        println!(
            "Watching mission {} every {}s (Ctrl-C to stop)",
            mission_id, interval_secs
        );
    }

    let outcome = watch_mission(
        &store,
        mission_id,
        Duration::from_secs(interval_secs),
        &stop,
        |report| {
            if json {
                match serde_json::to_string(report) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("Error: {}", e),
                }
            } else {
                // Clear screen and home the cursor.
                print!("\x1b[2J\x1b[H");
                print_report(report);
            }
        },
    )?;

    if !json {
        match outcome {
            WatchOutcome::Complete => println!("\nAll agents finished. Stopped watching."),
            WatchOutcome::Interrupted => println!("\nStopped watching."),
        }
    }
    Ok(0)
}

fn progress_bar(completed: usize, total: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        BAR_WIDTH * completed / total
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn print_report(report: &StatusReport) {
    let mission = &report.mission;
    println!("{}", "=".repeat(70));
    println!("Mission {}", mission.id);
    println!("{}", "=".repeat(70));
    println!("Task:    {}", mission.task);
    println!("Status:  {}", mission.status);
    println!("Created: {}", mission.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(updated) = mission.updated_at {
        println!("Updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    match &report.plan {
        Some(plan) => {
            let progress = report.progress;
            println!();
            println!(
                "Progress: {}/{} ({}%)",
                progress.completed, progress.total, progress.percent
            );
            println!("[{}]", progress_bar(progress.completed, progress.total));

            for phase in &plan.phases {
                println!();
                println!("Phase {}:", phase.phase);
                for agent in &phase.agents {
                    let Some(artifact) = report.artifact(&agent.id) else {
                        continue;
                    };
                    if artifact.status == TaskStatus::Completed {
                        println!(
                            "  ✅ {} {} ({} bytes)",
                            agent.emoji, agent.id, artifact.size
                        );
                    } else {
                        println!("  ⏳ {} {}", agent.emoji, agent.id);
                    }
                }
            }
        }
        None => {
            println!();
            println!("No execution plan yet.");
        }
    }

    if !report.logs.is_empty() {
        println!();
        println!("Recent events:");
        let skip = report.logs.len().saturating_sub(SHOWN_LOG_ENTRIES);
        for entry in &report.logs[skip..] {
            println!(
                "  [{}] {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.event
            );
        }
    }

    println!("{}", "=".repeat(70));
    if report.plan.is_some() {
        if report.is_complete() {
            println!("All agents finished.");
            println!("Next: avengers consolidate --mission {}", mission.id);
        } else {
            println!("In progress.");
            println!("Refresh: avengers status --mission {}", mission.id);
        }
    }
}
