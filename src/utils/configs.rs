use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};
use crate::installer::{BuildGraph, Category, Installer};

/// Installation prefix used when nothing else names one
pub const DEFAULT_PREFIX: &str = "/usr/local";

//Toml utils
/// Installation directories as given on the command line or in a manifest.
/// Every field is optional; unset category directories are derived from the prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallConfig {
    pub prefix: Option<String>,
    #[serde(alias = "exec_prefix")]
    pub eprefix: Option<String>,
    pub bindir: Option<String>,
    pub libdir: Option<String>,
    pub includedir: Option<String>,
    pub sharedir: Option<String>,
}

impl InstallConfig {
    pub fn with_prefix(prefix: &str) -> Self {
        InstallConfig {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        }
    }

    /// Layers `other` on top of `self`: every field set in `other` wins
    pub fn overridden_by(self, other: InstallConfig) -> InstallConfig {
        InstallConfig {
            prefix: other.prefix.or(self.prefix),
            eprefix: other.eprefix.or(self.eprefix),
            bindir: other.bindir.or(self.bindir),
            libdir: other.libdir.or(self.libdir),
            includedir: other.includedir.or(self.includedir),
            sharedir: other.sharedir.or(self.sharedir),
        }
    }
}

/// Raw `[[headers]]` / `[[shares]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct StageEntry {
    file: Option<String>,
    parent: Option<String>,
    pattern: Option<String>,
    #[serde(default)]
    basedir: String,
    #[serde(default)]
    recursive: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    install: InstallConfig,
    #[serde(default)]
    programs: Vec<String>,
    #[serde(default)]
    libraries: Vec<String>,
    #[serde(default)]
    headers: Vec<StageEntry>,
    #[serde(default)]
    shares: Vec<StageEntry>,
}

/// What a header or share entry stages.
/// A directory `parent` is kept as written, relative to the manifest root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSource {
    File(PathBuf),
    Directory {
        parent: PathBuf,
        pattern: String,
        recursive: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub source: StageSource,
    pub basedir: String,
}

/// A parsed install manifest.
/// Relative file paths are already anchored at `root`, the manifest's directory.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub root: PathBuf,
    pub config: InstallConfig,
    pub programs: Vec<PathBuf>,
    pub libraries: Vec<PathBuf>,
    pub headers: Vec<StageRequest>,
    pub shares: Vec<StageRequest>,
}

impl Manifest {
    /// Reads and validates the manifest at `path`
    pub fn from_file(path: &Path) -> Result<Manifest> {
        let contents = std::fs::read_to_string(path).map_err(|e| InstallError::Manifest {
            path: path.to_path_buf(),
            message: format!("could not read: {}", e),
        })?;
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Manifest::parse(&contents, path, &root)
    }

    /// Parses manifest text; `root` anchors relative source paths
    pub fn parse(contents: &str, path: &Path, root: &Path) -> Result<Manifest> {
        let raw: ManifestFile = toml::from_str(contents).map_err(|e| InstallError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let to_request = |entry: StageEntry, table: &str| -> Result<StageRequest> {
            let source = match (entry.file, entry.parent) {
                (Some(file), None) => StageSource::File(root.join(file)),
                (None, Some(parent)) => {
                    let pattern = entry.pattern.ok_or_else(|| InstallError::Manifest {
                        path: path.to_path_buf(),
                        message: format!("{} entry for `{}` has no pattern", table, parent),
                    })?;
                    StageSource::Directory {
                        parent: PathBuf::from(parent),
                        pattern,
                        recursive: entry.recursive,
                    }
                }
                _ => {
                    return Err(InstallError::Manifest {
                        path: path.to_path_buf(),
                        message: format!(
                            "{} entries need exactly one of `file` or `parent`",
                            table
                        ),
                    })
                }
            };
            Ok(StageRequest {
                source,
                basedir: entry.basedir,
            })
        };

        let headers = raw
            .headers
            .into_iter()
            .map(|entry| to_request(entry, "headers"))
            .collect::<Result<Vec<_>>>()?;
        let shares = raw
            .shares
            .into_iter()
            .map(|entry| to_request(entry, "shares"))
            .collect::<Result<Vec<_>>>()?;

        Ok(Manifest {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
            config: raw.install,
            programs: raw.programs.iter().map(|p| root.join(p)).collect(),
            libraries: raw.libraries.iter().map(|p| root.join(p)).collect(),
            headers,
            shares,
        })
    }

    /// Issues every staging request of the manifest against `installer`
    pub fn stage_into<G: BuildGraph>(&self, installer: &mut Installer<G>) -> Result<()> {
        for program in &self.programs {
            installer.add_program(program);
        }
        for library in &self.libraries {
            installer.add_library(library);
        }
        for request in &self.headers {
            match &request.source {
                StageSource::File(file) => installer.add_header(file, &request.basedir),
                StageSource::Directory {
                    parent,
                    pattern,
                    recursive,
                } => installer.stage_directory_under(
                    Category::Header,
                    &self.root,
                    parent,
                    pattern,
                    &request.basedir,
                    *recursive,
                )?,
            }
        }
        for request in &self.shares {
            match &request.source {
                StageSource::File(file) => installer.add_share(file, &request.basedir),
                StageSource::Directory {
                    parent,
                    pattern,
                    recursive,
                } => installer.stage_directory_under(
                    Category::Share,
                    &self.root,
                    parent,
                    pattern,
                    &request.basedir,
                    *recursive,
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Manifest> {
        Manifest::parse(text, Path::new("install.toml"), Path::new("/src/casacore"))
    }

    #[test]
    fn later_layer_wins() {
        let base = InstallConfig {
            prefix: Some("/opt".to_string()),
            libdir: Some("/opt/lib64".to_string()),
            ..Default::default()
        };
        let merged = base.overridden_by(InstallConfig::with_prefix("/usr"));
        assert_eq!(merged.prefix.as_deref(), Some("/usr"));
        assert_eq!(merged.libdir.as_deref(), Some("/opt/lib64"));
        assert_eq!(merged.bindir, None);
    }

    #[test]
    fn parses_full_manifest() {
        let manifest = parse(
            r#"
programs = ["build/tablecheck"]
libraries = ["build/libcasa_tables.a"]

[install]
prefix = "/opt/casacore"
exec_prefix = "/opt/casacore"
includedir = "/opt/include"

[[headers]]
parent = "tables"
pattern = "*.h"
basedir = "casacore/tables"
recursive = true

[[shares]]
file = "data/leap.dat"
"#,
        )
        .unwrap();

        assert_eq!(manifest.config.prefix.as_deref(), Some("/opt/casacore"));
        assert_eq!(manifest.config.eprefix.as_deref(), Some("/opt/casacore"));
        assert_eq!(manifest.config.includedir.as_deref(), Some("/opt/include"));
        let program = PathBuf::from("/src/casacore/build/tablecheck");
        assert_eq!(manifest.programs, vec![program]);
        assert_eq!(
            manifest.headers,
            vec![StageRequest {
                source: StageSource::Directory {
                    parent: PathBuf::from("tables"),
                    pattern: "*.h".to_string(),
                    recursive: true,
                },
                basedir: "casacore/tables".to_string(),
            }]
        );
        assert_eq!(
            manifest.shares[0].source,
            StageSource::File(PathBuf::from("/src/casacore/data/leap.dat"))
        );
        assert_eq!(manifest.shares[0].basedir, "");
    }

    #[test]
    fn empty_manifest_is_valid() {
        let manifest = parse("").unwrap();
        assert_eq!(manifest.config, InstallConfig::default());
        assert!(manifest.headers.is_empty());
    }

    #[test]
    fn entry_needs_exactly_one_source() {
        let both = parse("[[headers]]\nfile = \"a.h\"\nparent = \"inc\"\npattern = \"*.h\"\n");
        assert!(matches!(both, Err(InstallError::Manifest { .. })));
        let neither = parse("[[shares]]\nbasedir = \"x\"\n");
        assert!(matches!(neither, Err(InstallError::Manifest { .. })));
    }

    #[test]
    fn directory_entry_needs_pattern() {
        let err = parse("[[headers]]\nparent = \"inc\"\n").unwrap_err();
        assert!(err.to_string().contains("no pattern"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("[install]\nprefx = \"/opt\"\n").is_err());
    }
}
