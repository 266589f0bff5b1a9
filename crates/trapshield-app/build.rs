//! Embeds the workspace `VERSION` file as `TRAPSHIELD_VERSION`.

use std::path::PathBuf;

fn main() {
    let manifest_dir =
        PathBuf::from(std::env::var_os("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR"));
    let version_file = manifest_dir
        .ancestors()
        .nth(2)
        .expect("crate lives two levels below the workspace root")
        .join("VERSION");

    println!("cargo:rerun-if-changed={}", version_file.display());

    let contents = std::fs::read_to_string(&version_file)
        .unwrap_or_else(|error| panic!("cannot read {}: {error}", version_file.display()));
    let version = contents.trim();
    assert!(!version.is_empty(), "VERSION must not be blank");

    println!("cargo:rustc-env=TRAPSHIELD_VERSION={version}");
}
