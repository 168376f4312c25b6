use installer_cpp::installer::InstallReport;
use installer_cpp::utils::{InstallConfig, Manifest};
use installer_cpp::{ActionGraph, Category, Installer};
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn installs_a_source_tree_under_a_prefix() {
    let src = tempfile::Builder::new().prefix("casacore").tempdir().unwrap();
    let dest = tempfile::Builder::new().prefix("prefix").tempdir().unwrap();
    write(src.path(), "tables/x.h", "// x");
    write(src.path(), "tables/sub/y.h", "// y");
    write(src.path(), "tables/sub/y.cc", "int y;");
    write(src.path(), "tables/sub/test/z.h", "// z");
    write(src.path(), "build/tablecheck", "#!/bin/sh\n");
    write(src.path(), "build/libcasa_tables.a", "!<arch>\n");

    let config = InstallConfig::with_prefix(&dest.path().to_string_lossy());
    let mut installer = Installer::new(&config, Path::new("/"), ActionGraph::new()).unwrap();
    installer.add_program(src.path().join("build/tablecheck"));
    installer.add_library(src.path().join("build/libcasa_tables.a"));
    installer
        .add_headers(src.path().join("tables"), "*.h", "casacore/tables", true)
        .unwrap();

    let report = installer.graph().execute(false).unwrap();
    assert_eq!(
        report,
        InstallReport {
            copied: 4,
            up_to_date: 0,
            chmodded: 1
        }
    );

    let prefix = dest.path();
    assert!(prefix.join("include/casacore/tables/x.h").is_file());
    assert!(prefix.join("include/casacore/tables/sub/y.h").is_file());
    assert!(!prefix.join("include/casacore/tables/sub/test").exists());
    assert!(!prefix.join("include/casacore/tables/sub/y.cc").exists());
    assert_eq!(
        fs::read_to_string(prefix.join("lib/libcasa_tables.a")).unwrap(),
        "!<arch>\n"
    );
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(prefix.join("bin/tablecheck"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    // a changed source is copied again, the rest is current
    write(src.path(), "tables/x.h", "// x, edited");
    let report = installer.graph().execute(false).unwrap();
    assert_eq!(report.copied, 1);
    assert_eq!(report.up_to_date, 3);
    assert_eq!(
        fs::read_to_string(prefix.join("include/casacore/tables/x.h")).unwrap(),
        "// x, edited"
    );

    assert_eq!(installer.graph().uninstall(false).unwrap(), 4);
    assert!(!prefix.join("bin/tablecheck").exists());
}

#[test]
fn manifest_drives_the_installer() {
    let src = tempfile::Builder::new().prefix("casacore").tempdir().unwrap();
    let dest = tempfile::Builder::new().prefix("prefix").tempdir().unwrap();
    write(src.path(), "data/ephemerides/DE200", "ephem");
    write(src.path(), "data/ephemerides/README", "readme");
    write(src.path(), "casa/version.h", "#define V 1");
    write(
        src.path(),
        "install.toml",
        &format!(
            r#"
[install]
sharedir = "{share}"

[[headers]]
file = "casa/version.h"
basedir = "casacore/casa"

[[shares]]
parent = "data"
pattern = "DE*"
basedir = "casacore/data"
recursive = true
"#,
            share = dest.path().join("share").display()
        ),
    );

    let manifest = Manifest::from_file(&src.path().join("install.toml")).unwrap();
    let config = manifest
        .config
        .clone()
        .overridden_by(InstallConfig::with_prefix("/opt/casa"));
    let mut installer = Installer::new(&config, Path::new("/"), ActionGraph::new()).unwrap();
    manifest.stage_into(&mut installer).unwrap();

    let sharedir = dest.path().join("share");
    assert_eq!(installer.dirs().dir(Category::Share), sharedir);
    let targets: Vec<_> = installer
        .graph()
        .copies()
        .map(|(_, t)| t.to_path_buf())
        .collect();
    assert_eq!(targets.len(), 2);
    let version = Path::new("/opt/casa/include/casacore/casa/version.h");
    assert!(targets.contains(&version.to_path_buf()));
    let ephemeris = sharedir.join("casacore/data/ephemerides/DE200");
    assert!(targets.contains(&ephemeris));
}

#[test]
fn manifest_location_does_not_change_what_is_staged() {
    let ci = tempfile::Builder::new().prefix("ci").tempdir().unwrap();
    let checkout = ci.path().join("latest/casacore");
    write(&checkout, "tables/Table.h", "// table");
    write(&checkout, "tables/unittest/tTable.h", "// unit test");
    write(
        &checkout,
        "install.toml",
        r#"
[[headers]]
parent = "tables"
pattern = "*.h"
basedir = "casacore/tables"
recursive = true
"#,
    );

    let staged = |manifest_path: &Path| -> Vec<std::path::PathBuf> {
        let manifest = Manifest::from_file(manifest_path).unwrap();
        let config = InstallConfig::with_prefix("/opt/casa");
        let mut installer = Installer::new(&config, Path::new("/"), ActionGraph::new()).unwrap();
        manifest.stage_into(&mut installer).unwrap();
        installer
            .graph()
            .copies()
            .map(|(_, target)| target.to_path_buf())
            .collect()
    };

    let expected = vec![Path::new("/opt/casa/include/casacore/tables/Table.h").to_path_buf()];
    assert_eq!(staged(&checkout.join("install.toml")), expected);

    #[cfg(unix)]
    {
        let plain = ci.path().join("casacore");
        std::os::unix::fs::symlink(&checkout, &plain).unwrap();
        assert_eq!(staged(&plain.join("install.toml")), expected);
    }
}
