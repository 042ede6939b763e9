use std::path::Path;

use cog_core::CONFIG_FILE;

const COG_TOML: &str = r#"# Configuration for cog
predict = "predict.py:Predictor"

[build]
# gpu = false
# python_version = "3.8"
# python_requirements = "requirements.txt"
# python_packages = ["torch==1.7.1"]
# system_packages = ["ffmpeg"]
# cuda = "11.0"
# cudnn = "8"
"#;

/// Write a starter cog.toml into the current directory.
pub fn init_project() -> anyhow::Result<()> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        eprintln!("{CONFIG_FILE} already exists, skipping");
        return Ok(());
    }

    std::fs::write(config_path, COG_TOML)?;
    println!("Created {CONFIG_FILE}");
    println!();
    println!("Next steps:");
    println!();
    println!("  1. Point `predict` at your predictor class");
    println!("  2. List your dependencies under [build]");
    println!("  3. Preview the image:");
    println!("     cog debug dockerfile");

    Ok(())
}
