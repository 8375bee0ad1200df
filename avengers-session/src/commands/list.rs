use avengers_session::config::AppConfig;

const TASK_COLUMN: usize = 40;

pub fn run(config: &AppConfig) -> anyhow::Result<u8> {
    let store = super::store(config);
    let missions = store.list()?;

    if missions.is_empty() {
        println!("No missions under {}.", store.root().display());
        return Ok(0);
    }

    println!("{:<20} {:<14} {:<20} TASK", "MISSION", "STATUS", "CREATED");
    println!("{}", "-".repeat(96));

    for mission in missions {
        let task = if mission.task.chars().count() > TASK_COLUMN {
            let cut: String = mission.task.chars().take(TASK_COLUMN - 3).collect();
            format!("{}...", cut)
        } else {
            mission.task.clone()
        };
        println!(
            "{:<20} {:<14} {:<20} {}",
            mission.id,
            mission.status.to_string(),
            mission.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            task
        );
    }

    Ok(0)
}
