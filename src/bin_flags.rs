use crate::error::Result;
use crate::global_config::GlobalConfig;
use crate::installer::{Action, ActionGraph, Category, Installer, INSTALL_ALIAS};
use crate::utils::{log, InstallConfig, LogLevel, Manifest};
use itertools::Itertools;
use std::path::Path;

/// Layers the configuration sources, lowest precedence first:
/// the global default prefix, the manifest's `[install]` table, then command line flags
pub fn layer_config(
    global: &GlobalConfig,
    manifest: &InstallConfig,
    cli: &InstallConfig,
) -> InstallConfig {
    let base = InstallConfig {
        prefix: global.get_default_prefix().map(str::to_string),
        ..Default::default()
    };
    base.overridden_by(manifest.clone()).overridden_by(cli.clone())
}

/// Reads the manifest and stages every request in it
/// # Arguments
/// * `manifest_path` - The install manifest
/// * `cli` - Directories given on the command line
/// * `global` - The user's global defaults
/// * `base` - Directory relative install directories are anchored at
pub fn stage(
    manifest_path: &Path,
    cli: &InstallConfig,
    global: &GlobalConfig,
    base: &Path,
) -> Result<Installer<ActionGraph>> {
    let manifest = Manifest::from_file(manifest_path)?;
    let config = layer_config(global, &manifest.config, cli);
    log(LogLevel::Debug, &format!("Install config: {:#?}", config));

    let mut installer = Installer::new(&config, base, ActionGraph::new())?;
    manifest.stage_into(&mut installer)?;
    log(
        LogLevel::Info,
        &format!(
            "Staged {} files from {}",
            installer.graph().copies().count(),
            manifest_path.display()
        ),
    );
    Ok(installer)
}

///Prints the resolved directories and every registered action
/// # Arguments
/// * `installer` - The installer holding the staged requests
pub fn plan(installer: &Installer<ActionGraph>) {
    let dirs = installer.dirs();
    log(
        LogLevel::Log,
        &format!("prefix   {}", dirs.prefix.display()),
    );
    log(
        LogLevel::Log,
        &format!("eprefix  {}", dirs.eprefix.display()),
    );
    for category in Category::ALL {
        let dir = dirs.dir(category).display();
        log(LogLevel::Log, &format!("{:<8} {}", category, dir));
    }
    let alias_dirs = installer
        .graph()
        .alias_dirs(INSTALL_ALIAS)
        .iter()
        .map(|d| d.display())
        .join(", ");
    log(
        LogLevel::Info,
        &format!("{} depends on: {}", INSTALL_ALIAS, alias_dirs),
    );

    let actions = installer.graph().actions();
    if actions.is_empty() {
        log(LogLevel::Warn, "Nothing to install");
        return;
    }
    for action in actions {
        match action {
            Action::Copy { source, target } => log(
                LogLevel::Log,
                &format!("copy  {} -> {}", source.display(), target.display()),
            ),
            Action::Chmod { target, mode } => log(
                LogLevel::Log,
                &format!("chmod {:o} {}", mode, target.display()),
            ),
        }
    }
}

///Runs the install phase
/// # Arguments
/// * `installer` - The installer holding the staged requests
/// * `dry_run` - Only print what would be done
pub fn install(installer: &Installer<ActionGraph>, dry_run: bool) -> Result<()> {
    let report = installer.graph().execute(dry_run)?;
    if !dry_run {
        log(
            LogLevel::Log,
            &format!(
                "Installed {} files ({} up to date, {} permission changes)",
                report.copied, report.up_to_date, report.chmodded
            ),
        );
    }
    Ok(())
}

///Removes installed files
/// # Arguments
/// * `installer` - The installer holding the staged requests
/// * `dry_run` - Only print what would be removed
pub fn uninstall(installer: &Installer<ActionGraph>, dry_run: bool) -> Result<()> {
    let removed = installer.graph().uninstall(dry_run)?;
    if !dry_run {
        log(LogLevel::Log, &format!("Removed {} files", removed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn cli_beats_manifest_beats_global() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        GlobalConfig::set_defaults(&path, "default_prefix", "/global").unwrap();
        let global = GlobalConfig::from_file(&path).unwrap();

        let manifest = InstallConfig {
            prefix: Some("/manifest".to_string()),
            libdir: Some("/manifest/lib64".to_string()),
            ..Default::default()
        };
        let cli = InstallConfig::with_prefix("/cli");

        let layered = layer_config(&global, &manifest, &cli);
        assert_eq!(layered.prefix.as_deref(), Some("/cli"));
        assert_eq!(layered.libdir.as_deref(), Some("/manifest/lib64"));

        let unset = InstallConfig::default();
        let layered = layer_config(&global, &unset, &unset);
        assert_eq!(layered.prefix.as_deref(), Some("/global"));
    }

    #[test]
    fn stage_reads_manifest_relative_to_its_directory() {
        let project = tempfile::Builder::new().prefix("proj").tempdir().unwrap();
        fs::create_dir_all(project.path().join("casa/Arrays")).unwrap();
        fs::write(project.path().join("casa/Arrays/Array.h"), "").unwrap();
        fs::write(project.path().join("casa/Arrays/Array.tcc"), "").unwrap();
        fs::write(
            project.path().join("install.toml"),
            r#"
libraries = ["build/libcasa_casa.a"]

[[headers]]
parent = "casa"
pattern = "*.h"
basedir = "casacore/casa"
recursive = true

[[headers]]
parent = "casa"
pattern = "*.tcc"
basedir = "casacore/casa"
recursive = true
"#,
        )
        .unwrap();

        let installer = stage(
            &project.path().join("install.toml"),
            &InstallConfig::with_prefix("/opt/casa"),
            &GlobalConfig::default(),
            Path::new("/"),
        )
        .unwrap();
        let targets: Vec<_> = installer
            .graph()
            .copies()
            .map(|(_, t)| t.to_path_buf())
            .sorted()
            .collect();
        assert_eq!(
            targets,
            vec![
                Path::new("/opt/casa/include/casacore/casa/Arrays/Array.h").to_path_buf(),
                Path::new("/opt/casa/include/casacore/casa/Arrays/Array.tcc").to_path_buf(),
                Path::new("/opt/casa/lib/libcasa_casa.a").to_path_buf(),
            ]
        );
    }
}
