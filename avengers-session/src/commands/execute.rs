use anyhow::Context;
use serde_json::json;
use tracing::warn;

use avengers_session::config::AppConfig;
use avengers_session::plan::dispatch::{render_markdown, render_plan};
use avengers_session::state::MissionStatus;

pub fn run(config: &AppConfig, mission_id: &str, save: bool, dry_run: bool) -> anyhow::Result<u8> {
    let store = super::store(config);
    let mission = store.load(mission_id)?;
    let plan = store.load_plan(mission_id)?;
    let phases = render_plan(&plan);

    println!("Mission: {}", mission.id);
    println!("Task:    {}", mission.task);
    println!(
        "{} agents in {} phases",
        plan.total_agents,
        plan.phases.len()
    );

    for (i, phase) in phases.iter().enumerate() {
        println!();
        if phase.parallel {
            println!(
                "=== Phase {}: dispatch these {} together ===",
                phase.phase,
                phase.commands.len()
            );
        } else {
            println!("=== Phase {} ===", phase.phase);
        }
        for call in &phase.commands {
            println!();
            println!("// {}", call.agent_id);
            println!("{}", call.code);
        }
        if i + 1 < phases.len() {
            println!();
            println!(
                "// Wait for every Phase {} agent to report MISSION_COMPLETE before continuing.",
                phase.phase
            );
        }
    }
    println!();

    if save {
        let path = store.layout(mission_id).commands_script();
        std::fs::write(&path, render_markdown(&mission.id, &phases))
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Saved commands to {}", path.display());
    }

    if dry_run {
        println!("Dry run: mission status unchanged.");
    } else if mission.status != MissionStatus::Initializing {
        warn!(
            mission = %mission_id,
            status = %mission.status,
            "mission already dispatched, leaving status unchanged"
        );
        println!("Mission is already {}; status unchanged.", mission.status);
    } else {
        store.record_event(
            mission_id,
            "execution_started",
            json!({
                "total_phases": plan.phases.len(),
                "total_agents": plan.total_agents,
            }),
        );
        store.update_status(mission_id, MissionStatus::Executing, None)?;
        println!("Mission is now executing.");
    }
    println!("Track progress: avengers status --mission {} --watch", mission_id);

    Ok(0)
}
