use std::path::{Path, PathBuf};
use std::process::Command;

pub fn avengers_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_avengers"))
}

/// Command isolated to `workspace`, ignoring any user config file.
pub fn avengers(workspace: &Path) -> Command {
    let mut cmd = Command::new(avengers_bin());
    cmd.env("AVENGERS_WORKSPACE", workspace)
        .env("AVENGERS_CONFIG", workspace.join("no-such-config.toml"))
        .env_remove("RUST_LOG");
    cmd
}
