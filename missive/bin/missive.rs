#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = missive::find_config_file()?;
    let missive = missive::Missive::from_file(&config_path)?;

    missive.run().await
}
