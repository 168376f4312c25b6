//! A minimal installer for C and C++ build trees.
//!
//! The installer resolves the four install roots once, at construction, and
//! then turns staging requests into registrations on a [`BuildGraph`].
//! Nothing is copied while staging; copies happen when the graph is executed.
use crate::error::{InstallError, Result};
use crate::utils::{log, InstallConfig, LogLevel, DEFAULT_PREFIX};
use glob::Pattern;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Contains the build graph and the install phase
pub mod graph;

pub use graph::{Action, ActionGraph, BuildGraph, InstallReport};

/// Aggregate target every install root is registered under
pub const INSTALL_ALIAS: &str = "install";

/// Mode given to installed programs
pub const PROGRAM_MODE: u32 = 0o755;

/// Destination category of a staged file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Program,
    Library,
    Header,
    Share,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Program,
        Category::Library,
        Category::Header,
        Category::Share,
    ];

    /// Directory name under the prefix when no explicit directory is configured
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Program => "bin",
            Category::Library => "lib",
            Category::Header => "include",
            Category::Share => "share",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Program => "program",
            Category::Library => "library",
            Category::Header => "header",
            Category::Share => "share",
        };
        f.write_str(name)
    }
}

/// The resolved install roots. Every path is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallDirs {
    pub prefix: PathBuf,
    pub eprefix: PathBuf,
    pub bindir: PathBuf,
    pub libdir: PathBuf,
    pub includedir: PathBuf,
    pub sharedir: PathBuf,
}

impl InstallDirs {
    /// Resolves `config`, anchoring relative paths at `base`.
    /// An unset prefix means `/usr/local`;
    /// an unset or empty category directory means `prefix/<name>`.
    pub fn resolve(config: &InstallConfig, base: &Path) -> Result<InstallDirs> {
        let prefix = config.prefix.as_deref().unwrap_or(DEFAULT_PREFIX);
        if prefix.trim().is_empty() {
            return Err(InstallError::Configuration(
                "installation prefix is empty".to_string(),
            ));
        }
        let prefix = anchor(prefix, base)?;
        let eprefix = match non_empty(&config.eprefix) {
            Some(eprefix) => anchor(eprefix, base)?,
            None => prefix.clone(),
        };

        let category_dir = |value: &Option<String>, category: Category| -> Result<PathBuf> {
            match non_empty(value) {
                Some(dir) => anchor(dir, base),
                None => Ok(prefix.join(category.dir_name())),
            }
        };

        Ok(InstallDirs {
            bindir: category_dir(&config.bindir, Category::Program)?,
            libdir: category_dir(&config.libdir, Category::Library)?,
            includedir: category_dir(&config.includedir, Category::Header)?,
            sharedir: category_dir(&config.sharedir, Category::Share)?,
            prefix,
            eprefix,
        })
    }

    pub fn dir(&self, category: Category) -> &Path {
        match category {
            Category::Program => &self.bindir,
            Category::Library => &self.libdir,
            Category::Header => &self.includedir,
            Category::Share => &self.sharedir,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn anchor(dir: &str, base: &Path) -> Result<PathBuf> {
    let path = base.join(dir);
    if !path.is_absolute() {
        return Err(InstallError::Configuration(format!(
            "cannot resolve `{}` to an absolute directory",
            dir
        )));
    }
    Ok(path)
}

// Rewrites an fnmatch pattern into one `glob::Pattern` accepts: an unclosed `[`
// is a literal and runs of `*` collapse into one.
fn fnmatch_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while i + 1 < chars.len() && chars[i + 1] == '*' {
                    i += 1;
                }
            }
            '[' => {
                let mut j = i + 1;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("[[]");
                } else {
                    out.extend(&chars[i..=j]);
                    i = j;
                }
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Stages files into the install roots of a build graph
pub struct Installer<G: BuildGraph> {
    dirs: InstallDirs,
    graph: G,
}

impl<G: BuildGraph> Installer<G> {
    /// Resolves the install roots and registers each one under the `install` alias of `graph`.
    /// Relative directories in `config` are anchored at `base`.
    pub fn new(config: &InstallConfig, base: &Path, mut graph: G) -> Result<Self> {
        let dirs = InstallDirs::resolve(config, base)?;
        for category in Category::ALL {
            graph.alias(INSTALL_ALIAS, dirs.dir(category));
        }
        Ok(Installer { dirs, graph })
    }

    pub fn dirs(&self) -> &InstallDirs {
        &self.dirs
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn into_graph(self) -> G {
        self.graph
    }

    /// Registers a copy of `source` into `<category dir>/<basedir>`, keeping its file name.
    /// With a `mode`, a permission change to exactly that mode follows the copy.
    pub fn stage_file(
        &mut self,
        category: Category,
        source: impl AsRef<Path>,
        basedir: &str,
        mode: Option<u32>,
    ) {
        let source = source.as_ref();
        let destination = self.dirs.dir(category).join(basedir);
        let target = self.graph.install(&destination, source);
        log(
            LogLevel::Debug,
            &format!(
                "Staged {} {} -> {}",
                category,
                source.display(),
                target.display()
            ),
        );
        if let Some(mode) = mode {
            self.graph.chmod(&target, mode);
        }
    }

    /// Stages every file of `parent` whose name matches the glob `pattern`.
    /// With `recursive`, subdirectories are staged under `basedir/<name>`.
    /// Any directory whose path contains "test" is skipped along with everything below it.
    pub fn stage_directory(
        &mut self,
        category: Category,
        parent: impl AsRef<Path>,
        pattern: &str,
        basedir: &str,
        recursive: bool,
    ) -> Result<()> {
        self.stage_directory_under(
            category,
            Path::new(""),
            parent.as_ref(),
            pattern,
            basedir,
            recursive,
        )
    }

    /// Like [`Installer::stage_directory`] with `parent` read relative to `root`.
    /// Only `parent` and the directories below it are checked for "test", never `root`.
    pub fn stage_directory_under(
        &mut self,
        category: Category,
        root: &Path,
        parent: &Path,
        pattern: &str,
        basedir: &str,
        recursive: bool,
    ) -> Result<()> {
        let matcher = Pattern::new(&fnmatch_pattern(pattern)).map_err(|source| {
            InstallError::Pattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        let basedir = Path::new(basedir);
        self.walk(category, root, parent, &matcher, basedir, recursive)
    }

    fn walk(
        &mut self,
        category: Category,
        root: &Path,
        parent: &Path,
        pattern: &Pattern,
        basedir: &Path,
        recursive: bool,
    ) -> Result<()> {
        if parent.to_string_lossy().contains("test") {
            log(
                LogLevel::Info,
                &format!("Skipping test directory: {}", parent.display()),
            );
            return Ok(());
        }

        let dir = root.join(parent);
        let entries = fs::read_dir(&dir).map_err(|source| InstallError::Traversal {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| InstallError::Traversal {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            // follows symlinks; a dangling link is a traversal error
            let metadata = fs::metadata(&path).map_err(|source| InstallError::Traversal {
                path: path.clone(),
                source,
            })?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if metadata.is_file() && pattern.matches(&name) {
                let basedir = basedir.to_string_lossy();
                self.stage_file(category, &path, &basedir, None);
            } else if metadata.is_dir() && recursive {
                let parent = parent.join(&*name);
                let basedir = basedir.join(&*name);
                self.walk(category, root, &parent, pattern, &basedir, recursive)?;
            }
        }
        Ok(())
    }

    /// Installs a program into the bin directory with mode 0755
    pub fn add_program(&mut self, program: impl AsRef<Path>) {
        self.stage_file(Category::Program, program, "", Some(PROGRAM_MODE));
    }

    /// Installs a library into the lib directory
    pub fn add_library(&mut self, library: impl AsRef<Path>) {
        self.stage_file(Category::Library, library, "", None);
    }

    pub fn add_header(&mut self, header: impl AsRef<Path>, basedir: &str) {
        self.stage_file(Category::Header, header, basedir, None);
    }

    /// Installs a set of headers.
    /// # Arguments
    /// * `parent` - The directory holding the headers
    /// * `pattern` - Glob identifying the header files, e.g. `*.h`
    /// * `basedir` - Subdirectory of the include directory to install into
    /// * `recursive` - Search subdirectories too
    pub fn add_headers(
        &mut self,
        parent: impl AsRef<Path>,
        pattern: &str,
        basedir: &str,
        recursive: bool,
    ) -> Result<()> {
        self.stage_directory(Category::Header, parent, pattern, basedir, recursive)
    }

    pub fn add_share(&mut self, share: impl AsRef<Path>, basedir: &str) {
        self.stage_file(Category::Share, share, basedir, None);
    }

    pub fn add_shares(
        &mut self,
        parent: impl AsRef<Path>,
        pattern: &str,
        basedir: &str,
        recursive: bool,
    ) -> Result<()> {
        self.stage_directory(Category::Share, parent, pattern, basedir, recursive)
    }
}
