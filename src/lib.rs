//! A minimal installer for C and C++ projects.
//!
//! Programs, libraries, headers and shared data are staged into the install
//! roots derived from a prefix (`bin`, `lib`, `include`, `share`). Staging only
//! registers copy and permission actions on a build graph; the install phase
//! carries them out later.
//!
//! # Examples
//! To get the various flags that can be passed to installer_cpp
//! ```text
//! installer_cpp -h
//! ```
//!
//! # Sample manifest
//! ```toml
//! # install.toml
//! programs = ["build/tablecheck"]
//! libraries = ["build/libcasa_tables.a", "build/libcasa_tables.so"]
//!
//! [install]
//! prefix = "/opt/casacore"
//!
//! [[headers]]
//! parent = "tables"
//! pattern = "*.h"
//! basedir = "casacore/tables"
//! recursive = true
//!
//! [[headers]]
//! parent = "tables"
//! pattern = "*.tcc"
//! basedir = "casacore/tables"
//! recursive = true
//! ```
//!
//! Any source directory whose path contains `test` is never installed.

/// Contains the functions behind the command line subcommands
pub mod bin_flags;
/// Installer error type
pub mod error;
/// Handles global config
pub mod global_config;
/// Contains hashing related functions
pub mod hasher;
/// Contains the installer and its build graph
pub mod installer;
/// Contains logger and config parser
pub mod utils;

pub use error::{InstallError, Result};
pub use installer::{ActionGraph, BuildGraph, Category, InstallDirs, Installer};
