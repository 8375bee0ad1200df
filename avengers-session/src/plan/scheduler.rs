//! Dependency scheduler.
//!
//! Turns an ordered task list into phases by level-order admission: each
//! round admits every remaining task whose dependencies are all already
//! scheduled. When a round admits nothing (a cycle, or a dependency on an id
//! that is never scheduled) the first remaining task is admitted alone and
//! its unmet dependencies are dropped. Every round admits at least one task,
//! so the phase count never exceeds the task count.

use std::collections::HashSet;

use crate::state::schema::AgentTask;

/// One scheduled phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase<'a> {
    /// 1-based, contiguous.
    pub number: u32,
    pub tasks: Vec<&'a AgentTask>,
    /// Set when this phase was force-admitted; lists the dropped dependencies.
    pub forced: Option<Vec<String>>,
}

impl Phase<'_> {
    pub fn parallel(&self) -> bool {
        self.tasks.len() > 1
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Schedule tasks into phases. Members of a phase keep their input order.
pub fn schedule(tasks: &[AgentTask]) -> Vec<Phase<'_>> {
    let mut remaining: Vec<&AgentTask> = tasks.iter().collect();
    let mut scheduled: HashSet<&str> = HashSet::new();
    let mut phases = Vec::new();

    while !remaining.is_empty() {
        let number = phases.len() as u32 + 1;

        let (ready, blocked): (Vec<&AgentTask>, Vec<&AgentTask>) = remaining
            .iter()
            .partition(|t| t.dependencies.iter().all(|d| scheduled.contains(d.as_str())));

        let phase = if ready.is_empty() {
            let first = blocked[0];
            let unmet: Vec<String> = first
                .dependencies
                .iter()
                .filter(|d| !scheduled.contains(d.as_str()))
                .cloned()
                .collect();
            remaining = blocked[1..].to_vec();
            Phase {
                number,
                tasks: vec![first],
                forced: Some(unmet),
            }
        } else {
            remaining = blocked;
            Phase {
                number,
                tasks: ready,
                forced: None,
            }
        };

        scheduled.extend(phase.tasks.iter().map(|&t| t.id.as_str()));
        phases.push(phase);
    }

    phases
}
