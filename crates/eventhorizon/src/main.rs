mod cli;
mod paths;
mod run;

use std::fs;

use anyhow::{bail, Context, Result};
use cli::{Command, SceneAction};
use paths::AppPaths;
use sceneconfig::{SceneConfig, DEFAULT_SCENE_TOML};

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Scene(scene_cmd)) => handle_scene_command(scene_cmd.action),
        None => run::run(cli.run),
    }
}

fn handle_scene_command(action: SceneAction) -> Result<()> {
    let paths = AppPaths::discover()?;

    match action {
        SceneAction::Where => run_scene_where(&paths),
        SceneAction::Init { force } => run_scene_init(&paths, force),
    }
}

fn run_scene_where(paths: &AppPaths) -> Result<()> {
    let scene_file = paths.scene_file();
    println!("Config directory: {}", paths.config_dir().display());
    if scene_file.is_file() {
        println!("Scene file: {}", scene_file.display());
        match SceneConfig::load(&scene_file) {
            Ok(scene) => {
                let params = scene.params();
                println!(
                    "  rs={} distance={} disk={}..{} inclination={}°",
                    params.schwarzschild_radius,
                    params.camera_distance,
                    params.disk_inner,
                    params.disk_outer,
                    scene.camera.inclination
                );
            }
            Err(err) => println!("  (invalid: {err})"),
        }
    } else {
        println!(
            "Scene file: {} (not present; built-in defaults apply)",
            scene_file.display()
        );
    }
    Ok(())
}

fn run_scene_init(paths: &AppPaths, force: bool) -> Result<()> {
    let scene_file = paths.scene_file();
    if scene_file.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            scene_file.display()
        );
    }

    fs::create_dir_all(paths.config_dir()).with_context(|| {
        format!(
            "failed to create config directory {}",
            paths.config_dir().display()
        )
    })?;
    fs::write(&scene_file, DEFAULT_SCENE_TOML)
        .with_context(|| format!("failed to write {}", scene_file.display()))?;
    println!("Wrote {}", scene_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scene_init_refuses_to_clobber_without_force() {
        let temp = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(temp.path().join("config"));

        run_scene_init(&paths, false).unwrap();
        let written = fs::read_to_string(paths.scene_file()).unwrap();
        assert_eq!(written, DEFAULT_SCENE_TOML);

        fs::write(paths.scene_file(), "version = 1\n").unwrap();
        assert!(run_scene_init(&paths, false).is_err());
        assert_eq!(
            fs::read_to_string(paths.scene_file()).unwrap(),
            "version = 1\n"
        );

        run_scene_init(&paths, true).unwrap();
        assert_eq!(
            fs::read_to_string(paths.scene_file()).unwrap(),
            DEFAULT_SCENE_TOML
        );
    }
}
