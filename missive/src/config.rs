use std::path::PathBuf;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "MISSIVE_CONFIG";

/// Find the configuration file using the following precedence:
/// 1. `MISSIVE_CONFIG` environment variable
/// 2. ./missive.config.ron (current working directory)
/// 3. /etc/missive/missive.config.ron (system-wide config)
///
/// # Errors
/// Returns an error if `MISSIVE_CONFIG` names a missing file, or no
/// candidate exists
pub fn find_config_file() -> anyhow::Result<PathBuf> {
    locate(
        std::env::var(CONFIG_ENV).ok(),
        &[
            PathBuf::from("./missive.config.ron"),
            PathBuf::from("/etc/missive/missive.config.ron"),
        ],
    )
}

fn locate(from_env: Option<String>, default_paths: &[PathBuf]) -> anyhow::Result<PathBuf> {
    if let Some(env_path) = from_env {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "{CONFIG_ENV} points to non-existent file: {}",
            path.display()
        );
    }

    if let Some(path) = default_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )
}
