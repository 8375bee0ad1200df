//! Durable per-mission store.
//!
//! Layout under the missions root:
//!
//! ```text
//! <root>/<mission_id>/
//!     mission.json          root document
//!     execution_plan.json   immutable plan
//!     agents/<agent>.json   agent task records
//!     outputs/<agent>.md    artifacts, written by the execution backend
//!     logs/execution.jsonl  event log
//!     execute_commands.md   saved dispatch script
//!     FINAL_REPORT.md       default consolidated report
//! ```
//!
//! # Concurrency hazard
//!
//! Every mission update is a full read-modify-write of `mission.json` with
//! no locking. Two invocations updating the same mission at the same time
//! can silently lose one of the updates (last writer wins). Invocations are
//! human-paced, so this is accepted; a caller that needs stronger guarantees
//! must add a version field and reject stale writers.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{MissionError, Result};
use crate::plan::schema::ExecutionPlan;
use crate::state::events::EventLog;
use crate::state::schema::{AgentTask, Mission, MissionStatus};

/// Paths of a single mission directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionLayout {
    dir: PathBuf,
}

impl MissionLayout {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mission_file(&self) -> PathBuf {
        self.dir.join("mission.json")
    }

    pub fn plan_file(&self) -> PathBuf {
        self.dir.join("execution_plan.json")
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.dir.join("agents")
    }

    pub fn agent_file(&self, agent_id: &str) -> PathBuf {
        self.agents_dir().join(format!("{}.json", agent_id))
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.dir.join("outputs")
    }

    /// Conventional artifact location for a task.
    pub fn artifact_path(&self, agent_id: &str) -> PathBuf {
        self.outputs_dir().join(format!("{}.md", agent_id))
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join("logs").join("execution.jsonl")
    }

    pub fn commands_script(&self) -> PathBuf {
        self.dir.join("execute_commands.md")
    }

    pub fn default_report(&self) -> PathBuf {
        self.dir.join("FINAL_REPORT.md")
    }
}

/// Store rooted at `<workspace>/avengers-missions`.
#[derive(Debug, Clone)]
pub struct MissionStore {
    root: PathBuf,
}

impl MissionStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self, mission_id: &str) -> MissionLayout {
        MissionLayout::new(self.root.join(mission_id))
    }

    pub fn event_log(&self, mission_id: &str) -> EventLog {
        EventLog::new(self.layout(mission_id).log_file())
    }

    /// Append to the mission's event log. Failures are logged, not returned.
    pub fn record_event(&self, mission_id: &str, event: &str, data: Value) {
        if let Err(e) = self.event_log(mission_id).append(event, data) {
            warn!(mission = %mission_id, event, error = %e, "failed to append event");
        }
    }

    /// Create a new mission stamped with the current time.
    pub fn create(&self, task: &str) -> Result<Mission> {
        self.create_at(task, Utc::now())
    }

    /// Create a new mission. The id is the local creation time
    /// (`%Y%m%d_%H%M%S`), suffixed with `_<n>` when that id is taken.
    pub fn create_at(&self, task: &str, now: DateTime<Utc>) -> Result<Mission> {
        let base_id = now.with_timezone(&Local).format("%Y%m%d_%H%M%S").to_string();
        let mut id = base_id.clone();
        let mut n = 2;
        while self.layout(&id).mission_file().exists() {
            id = format!("{}_{}", base_id, n);
            n += 1;
        }

        let layout = self.layout(&id);
        for dir in [
            layout.agents_dir(),
            layout.outputs_dir(),
            layout.dir().join("logs"),
        ] {
            fs::create_dir_all(&dir).map_err(|e| MissionError::io(&dir, e))?;
        }

        let mission = Mission::new(&id, layout.dir().to_path_buf(), task, now);
        write_document(&layout.mission_file(), &mission)?;
        info!(mission = %id, dir = %layout.dir().display(), "created mission");

        self.record_event(&id, "mission_created", serde_json::json!({ "mission_id": &id }));
        Ok(mission)
    }

    /// Load a mission document.
    pub fn load(&self, mission_id: &str) -> Result<Mission> {
        check_mission_id(mission_id)?;
        read_document(&self.layout(mission_id).mission_file(), || {
            MissionError::MissionNotFound(mission_id.to_string())
        })
    }

    /// Persist the execution plan for its mission.
    pub fn save_plan(&self, plan: &ExecutionPlan) -> Result<PathBuf> {
        check_mission_id(&plan.mission_id)?;
        let path = self.layout(&plan.mission_id).plan_file();
        write_document(&path, plan)?;
        info!(mission = %plan.mission_id, phases = plan.phases.len(), "saved execution plan");
        Ok(path)
    }

    /// Write one record per agent task under `agents/`.
    pub fn save_tasks(&self, mission_id: &str, tasks: &[AgentTask]) -> Result<()> {
        check_mission_id(mission_id)?;
        let layout = self.layout(mission_id);
        for task in tasks {
            write_document(&layout.agent_file(&task.id), task)?;
        }
        debug!(mission = %mission_id, count = tasks.len(), "saved agent tasks");
        Ok(())
    }

    /// Agent task records, ordered by id. A mission without records yields
    /// an empty list.
    pub fn load_tasks(&self, mission_id: &str) -> Result<Vec<AgentTask>> {
        check_mission_id(mission_id)?;
        let dir = self.layout(mission_id).agents_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MissionError::io(&dir, e)),
        };

        let mut tasks = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| MissionError::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let task: AgentTask = read_document(&path, || {
                MissionError::invalid_state(&path, "agent record vanished while reading")
            })?;
            tasks.push(task);
        }
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }

    /// Load the execution plan. Absent plan is `PlanNotFound`.
    pub fn load_plan(&self, mission_id: &str) -> Result<ExecutionPlan> {
        check_mission_id(mission_id)?;
        read_document(&self.layout(mission_id).plan_file(), || {
            MissionError::PlanNotFound(mission_id.to_string())
        })
    }

    /// Load the execution plan if one has been written.
    pub fn load_plan_optional(&self, mission_id: &str) -> Result<Option<ExecutionPlan>> {
        match self.load_plan(mission_id) {
            Ok(plan) => Ok(Some(plan)),
            Err(MissionError::PlanNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a new status and shallow-merge `updates` into the mission document.
    pub fn update_status(
        &self,
        mission_id: &str,
        status: MissionStatus,
        updates: Option<Map<String, Value>>,
    ) -> Result<Mission> {
        self.update_status_at(mission_id, status, updates, Utc::now())
    }

    /// [`update_status`](Self::update_status) with an explicit clock value.
    ///
    /// Reads the whole document, sets `status` and `updated_at`, overwrites
    /// top-level keys from `updates`, checks the result is still a valid
    /// mission and writes the whole document back. Last writer wins.
    pub fn update_status_at(
        &self,
        mission_id: &str,
        status: MissionStatus,
        updates: Option<Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> Result<Mission> {
        check_mission_id(mission_id)?;
        let path = self.layout(mission_id).mission_file();

        let document: Value =
            read_document(&path, || MissionError::MissionNotFound(mission_id.to_string()))?;
        let Value::Object(mut fields) = document else {
            return Err(MissionError::invalid_state(&path, "mission document is not an object"));
        };

        fields.insert("status".to_string(), to_value(&path, &status)?);
        fields.insert("updated_at".to_string(), to_value(&path, &now)?);
        if let Some(updates) = updates {
            for (key, value) in updates {
                fields.insert(key, value);
            }
        }

        let mission: Mission = serde_json::from_value(Value::Object(fields))
            .map_err(|e| MissionError::invalid_state(&path, format!("update rejected: {}", e)))?;
        write_document(&path, &mission)?;
        debug!(mission = %mission_id, status = %status, "updated mission");
        Ok(mission)
    }

    /// All readable missions, newest first. Unreadable entries are skipped.
    pub fn list(&self) -> Result<Vec<Mission>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut missions = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| MissionError::io(&self.root, e))? {
            let entry = entry.map_err(|e| MissionError::io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            match self.load(&id) {
                Ok(mission) => missions.push(mission),
                Err(MissionError::MissionNotFound(_)) => {}
                Err(e) => warn!(mission = %id, error = %e, "skipping unreadable mission"),
            }
        }

        missions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(missions)
    }
}

/// Reject ids that would escape the missions root.
fn check_mission_id(mission_id: &str) -> Result<()> {
    let valid = !mission_id.is_empty()
        && mission_id != "."
        && mission_id != ".."
        && !mission_id.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(MissionError::MissionNotFound(mission_id.to_string()))
    }
}

fn read_document<T: DeserializeOwned>(
    path: &Path,
    not_found: impl FnOnce() -> MissionError,
) -> Result<T> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(MissionError::io(path, e)),
    };
    serde_json::from_str(&contents).map_err(|e| MissionError::invalid_state(path, e))
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MissionError::io(parent, e))?;
    }
    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| MissionError::invalid_state(path, format!("serialization error: {}", e)))?;
    fs::write(path, contents).map_err(|e| MissionError::io(path, e))
}

fn to_value<T: Serialize>(path: &Path, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| MissionError::invalid_state(path, e))
}
