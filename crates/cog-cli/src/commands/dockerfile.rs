use std::path::Path;

use cog_build::DockerfileGenerator;
use cog_build::context::{missing_paths, stage_wheel};
use cog_core::CogConfig;
use serde::Serialize;

#[derive(Serialize)]
struct DockerfileReport<'a> {
    dockerfile: &'a str,
    generated_paths: &'a [String],
}

pub fn dockerfile(wheel: Option<&Path>, output: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let project_dir = Path::new(".");
    let config = CogConfig::load(project_dir)?;
    let build = config.validate_and_complete()?;

    if let Some(wheel) = wheel {
        let staged = stage_wheel(project_dir, wheel)?;
        tracing::info!(path = %staged.display(), "staged cog wheel");
    }

    let generated = DockerfileGenerator::new(&build, project_dir).generate()?;

    for path in missing_paths(project_dir, &generated.generated_paths) {
        tracing::warn!(%path, "referenced file is missing from the build context; pass --wheel to stage it");
    }

    let rendered = if json {
        serde_json::to_string_pretty(&DockerfileReport {
            dockerfile: &generated.dockerfile,
            generated_paths: &generated.generated_paths,
        })?
    } else {
        generated.dockerfile
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
