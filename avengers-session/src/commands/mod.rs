pub mod assemble;
pub mod consolidate;
pub mod execute;
pub mod list;
pub mod status;

use avengers_session::config::AppConfig;
use avengers_session::state::MissionStore;

fn store(config: &AppConfig) -> MissionStore {
    MissionStore::new(config.missions_root())
}
