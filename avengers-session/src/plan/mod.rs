pub mod dispatch;
pub mod scheduler;
pub mod schema;
pub mod subtasks;

pub use schema::{DispatchCommand, ExecutionPlan, PlanAgent, PlanPhase, UnresolvedDependency};
pub use scheduler::{schedule, Phase};
pub use subtasks::{build_agent_tasks, SubtaskFile, SubtaskSpec};

use tracing::{info, warn};

use crate::state::schema::AgentTask;
use crate::state::store::MissionLayout;

/// Schedule `tasks` and attach a dispatch descriptor to each.
///
/// Commands follow the input task order, phases follow the scheduler.
pub fn build_plan(mission_id: &str, tasks: &[AgentTask], layout: &MissionLayout) -> ExecutionPlan {
    let phases = schedule(tasks);

    let mut unresolved_dependencies = Vec::new();
    for phase in &phases {
        if let Some(unmet) = &phase.forced {
            for task in &phase.tasks {
                warn!(
                    mission = %mission_id,
                    agent = %task.id,
                    phase = phase.number,
                    unmet = ?unmet,
                    "dependencies never satisfied, admitting task anyway"
                );
                unresolved_dependencies.push(UnresolvedDependency {
                    agent_id: task.id.clone(),
                    phase: phase.number,
                    unmet: unmet.clone(),
                });
            }
        }
    }

    let plan = ExecutionPlan {
        mission_id: mission_id.to_string(),
        total_agents: tasks.len(),
        phases: phases
            .iter()
            .map(|phase| PlanPhase {
                phase: phase.number,
                parallel: phase.parallel(),
                agents: phase.tasks.iter().map(|t| PlanAgent::from_task(t)).collect(),
            })
            .collect(),
        commands: tasks
            .iter()
            .map(|t| dispatch::dispatch_command(t, layout))
            .collect(),
        unresolved_dependencies,
    };

    info!(
        mission = %mission_id,
        agents = plan.total_agents,
        phases = plan.phases.len(),
        "built execution plan"
    );
    plan
}
