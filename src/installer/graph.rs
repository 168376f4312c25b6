//! The build graph staging requests are registered against, and the install
//! phase that later carries them out.
use crate::error::{InstallError, Result};
use crate::hasher;
use crate::utils::{log, LogLevel};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Receiver of install registrations.
/// Nothing registered here touches the filesystem until the graph is executed.
pub trait BuildGraph {
    /// Adds `dir` as a dependency of the aggregate target `name`
    fn alias(&mut self, name: &str, dir: &Path);
    /// Registers a copy of `source` into `dest_dir` and returns the target path
    fn install(&mut self, dest_dir: &Path, source: &Path) -> PathBuf;
    /// Registers a permission change of `target` to run after it is copied
    fn chmod(&mut self, target: &Path, mode: u32);
}

/// A single registered install action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Copy { source: PathBuf, target: PathBuf },
    Chmod { target: PathBuf, mode: u32 },
}

/// Counts of what an install phase did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    pub copied: usize,
    pub up_to_date: usize,
    pub chmodded: usize,
}

/// Records actions in registration order. Duplicates are kept.
#[derive(Debug, Default)]
pub struct ActionGraph {
    actions: Vec<Action>,
    aliases: BTreeMap<String, Vec<PathBuf>>,
}

impl BuildGraph for ActionGraph {
    fn alias(&mut self, name: &str, dir: &Path) {
        let dirs = self.aliases.entry(name.to_string()).or_default();
        if !dirs.iter().any(|d| d == dir) {
            dirs.push(dir.to_path_buf());
        }
    }

    fn install(&mut self, dest_dir: &Path, source: &Path) -> PathBuf {
        let target = match source.file_name() {
            Some(name) => dest_dir.join(name),
            None => dest_dir.to_path_buf(),
        };
        self.actions.push(Action::Copy {
            source: source.to_path_buf(),
            target: target.clone(),
        });
        target
    }

    fn chmod(&mut self, target: &Path, mode: u32) {
        self.actions.push(Action::Chmod {
            target: target.to_path_buf(),
            mode,
        });
    }
}

impl ActionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Directories registered under the aggregate target `name`
    pub fn alias_dirs(&self, name: &str) -> &[PathBuf] {
        self.aliases.get(name).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// (source, target) of every copy action, in registration order
    pub fn copies(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.actions.iter().filter_map(|action| match action {
            Action::Copy { source, target } => Some((source.as_path(), target.as_path())),
            Action::Chmod { .. } => None,
        })
    }

    /// (target, mode) of every permission change, in registration order
    pub fn chmods(&self) -> impl Iterator<Item = (&Path, u32)> {
        self.actions.iter().filter_map(|action| match action {
            Action::Chmod { target, mode } => Some((target.as_path(), *mode)),
            Action::Copy { .. } => None,
        })
    }

    /// Runs the install phase.
    /// Copies run in parallel; a target registered more than once is copied once.
    /// Permission changes are applied after every copy finished.
    pub fn execute(&self, dry_run: bool) -> Result<InstallReport> {
        let copies = self.distinct_copies();
        let chmods: Vec<(&Path, u32)> = self.chmods().unique().collect();

        if dry_run {
            for (source, target) in &copies {
                log(
                    LogLevel::Log,
                    &format!("Would install {} -> {}", source.display(), target.display()),
                );
            }
            for (target, mode) in &chmods {
                log(
                    LogLevel::Log,
                    &format!("Would chmod {:o} {}", mode, target.display()),
                );
            }
            return Ok(InstallReport::default());
        }

        let progress_bar = ProgressBar::new(copies.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);

        let outcomes = copies
            .par_iter()
            .map(|(source, target)| {
                let copied = install_file(source, target)?;
                progress_bar.inc(1);
                Ok(copied)
            })
            .collect::<Result<Vec<bool>>>();
        progress_bar.finish_and_clear();
        let outcomes = outcomes?;

        let copied = outcomes.iter().filter(|copied| **copied).count();
        let mut report = InstallReport {
            copied,
            up_to_date: outcomes.len() - copied,
            chmodded: 0,
        };

        for (target, mode) in chmods {
            set_mode(target, mode)?;
            report.chmodded += 1;
        }
        Ok(report)
    }

    /// Copy actions with one entry per target, first registration first.
    /// A target registered again from a different source keeps the first source.
    pub fn distinct_copies(&self) -> Vec<(&Path, &Path)> {
        let mut sources: HashMap<&Path, &Path> = HashMap::new();
        let mut copies = Vec::new();
        for (source, target) in self.copies() {
            match sources.get(target) {
                None => {
                    sources.insert(target, source);
                    copies.push((source, target));
                }
                Some(first) if *first != source => log(
                    LogLevel::Warn,
                    &format!(
                        "{} is staged from both {} and {}, skipping the second",
                        target.display(),
                        first.display(),
                        source.display()
                    ),
                ),
                Some(_) => {}
            }
        }
        copies
    }

    /// Removes every registered target that exists. Returns how many were removed.
    pub fn uninstall(&self, dry_run: bool) -> Result<usize> {
        let mut removed = 0;
        for target in self.copies().map(|(_, target)| target).unique() {
            if !target.exists() {
                log(
                    LogLevel::Debug,
                    &format!("Not installed: {}", target.display()),
                );
                continue;
            }
            if dry_run {
                log(LogLevel::Log, &format!("Would remove {}", target.display()));
            } else {
                fs::remove_file(target).map_err(|e| io_error("remove", target, e))?;
                log(LogLevel::Info, &format!("Removed: {}", target.display()));
            }
            removed += 1;
        }
        Ok(removed)
    }
}

// Returns false when the target already holds the source's content
fn install_file(source: &Path, target: &Path) -> Result<bool> {
    if target.is_file() && hasher::same_content(source, target)? {
        log(LogLevel::Info, &format!("Up to date: {}", target.display()));
        return Ok(false);
    }
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir).map_err(|e| io_error("create", dir, e))?;
    }
    fs::copy(source, target).map_err(|e| io_error("copy", source, e))?;
    log(
        LogLevel::Info,
        &format!("Installed {} -> {}", source.display(), target.display()),
    );
    Ok(true)
}

#[cfg(unix)]
fn set_mode(target: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(target, fs::Permissions::from_mode(mode))
        .map_err(|e| io_error("chmod", target, e))?;
    log(
        LogLevel::Debug,
        &format!("Changed mode of {} to {:o}", target.display(), mode),
    );
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(target: &Path, mode: u32) -> Result<()> {
    log(
        LogLevel::Warn,
        &format!(
            "Permission modes are not supported here, skipping {:o} for {}",
            mode,
            target.display()
        ),
    );
    Ok(())
}

fn io_error(action: &'static str, path: &Path, source: std::io::Error) -> InstallError {
    InstallError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}
