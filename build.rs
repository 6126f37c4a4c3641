use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Files the default scene cannot start without.
const REQUIRED_ASSETS: [&str; 3] = ["firetruck.obj", "BodyNormalMap.png", "kloppenheim_06_4k.hdr"];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");
    println!("cargo:rerun-if-env-changed=BINDLESS_ASSET_ROOT");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        println!(
            "cargo:warning=no assets/ directory; set BINDLESS_ASSET_ROOT before running the sample"
        );
        return Ok(());
    }
    for name in REQUIRED_ASSETS {
        if !assets_src.join(name).exists() {
            println!("cargo:warning=assets/{name} is missing");
        }
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], out_dir, &copy_options)?;

    Ok(())
}
