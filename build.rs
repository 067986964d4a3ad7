use rustc_version::{version_meta, Channel};

// Exposes `cfg(rustc_nightly)` so the `#[bench]` harness is only
// compiled where `feature(test)` is available.
fn main() {
    let meta = match version_meta() {
        Ok(meta) => meta,
        Err(_) => return,
    };
    assert!(meta.semver.major >= 1);

    if let Channel::Nightly = meta.channel {
        println!("cargo:rustc-cfg=rustc_nightly");
    }
}
