use std::path::Path;

use anyhow::Context;
use serde_json::json;

use avengers_session::config::AppConfig;
use avengers_session::plan::{build_agent_tasks, build_plan, ExecutionPlan, SubtaskFile};
use avengers_session::state::Mission;

pub fn run(
    config: &AppConfig,
    task: Option<&str>,
    subtasks: Option<&Path>,
    json: bool,
) -> anyhow::Result<u8> {
    let store = super::store(config);

    let Some(subtasks_path) = subtasks else {
        let description = task.unwrap_or_default();
        let mission = store.create(description)?;
        if json {
            let output = json!({ "mission": mission, "plan": null });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_created(&mission);
            println!();
            println!("No subtasks given. Write a subtask file, for example");
            println!("  {}", mission.path.join("subtasks.json").display());
            println!("then run:");
            println!(
                "  avengers assemble --task {:?} --subtasks {}",
                mission.task,
                mission.path.join("subtasks.json").display()
            );
        }
        return Ok(0);
    };

    let file = SubtaskFile::load(subtasks_path)
        .with_context(|| format!("reading subtasks from {}", subtasks_path.display()))?;
    let description = task.unwrap_or_else(|| file.task_description());

    let mission = store.create(description)?;
    let tasks = build_agent_tasks(&mission.id, &file.subtasks, &config.roles)?;
    store.save_tasks(&mission.id, &tasks)?;

    let plan = build_plan(&mission.id, &tasks, &store.layout(&mission.id));
    let plan_path = store.save_plan(&plan)?;
    store.record_event(
        &mission.id,
        "plan_created",
        json!({
            "total_agents": plan.total_agents,
            "total_phases": plan.phases.len(),
            "unresolved_dependencies": plan.unresolved_dependencies.len(),
        }),
    );

    if json {
        let output = json!({ "mission": mission, "plan": plan });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_created(&mission);
        println!("Plan:    {}", plan_path.display());
        println!();
        print_plan(&plan);
        println!();
        println!("Next: avengers execute --mission {}", mission.id);
    }

    Ok(0)
}

fn print_created(mission: &Mission) {
    println!("Mission: {}", mission.id);
    println!("Task:    {}", mission.task);
    println!("Path:    {}", mission.path.display());
}

fn print_plan(plan: &ExecutionPlan) {
    println!(
        "{} agents in {} phases",
        plan.total_agents,
        plan.phases.len()
    );
    for phase in &plan.phases {
        let mode = if phase.parallel { "parallel" } else { "sequential" };
        println!("  Phase {} ({})", phase.phase, mode);
        for agent in &phase.agents {
            println!("    {} {}  {}", agent.emoji, agent.id, agent.description);
        }
    }

    for unresolved in &plan.unresolved_dependencies {
        println!(
            "  warning: {} placed in phase {} without {}",
            unresolved.agent_id,
            unresolved.phase,
            unresolved.unmet.join(", ")
        );
    }
}
