//! Build script for storefront crate.
//!
//! Hashes static assets so templates can reference them with a cache-busting
//! `?v=` query and the static handler can serve them as immutable.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// (path under `static/`, env var exposed to the crate)
const HASHED_ASSETS: [(&str, &str); 2] = [("css/main.css", "CSS_HASH"), ("js/app.js", "JS_HASH")];

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, asset hashes disabled");
        for (_, var) in HASHED_ASSETS {
            println!("cargo:rustc-env={var}=dev");
        }
        return;
    };

    for (asset, var) in HASHED_ASSETS {
        let path = Path::new(&manifest_dir).join("static").join(asset);
        println!("cargo:rerun-if-changed={}", path.display());
        println!("cargo:rustc-env={var}={}", short_hash(&path));
    }
}

/// First 8 hex chars of the file's SHA-256, or `dev` if it can't be read.
fn short_hash(path: &Path) -> String {
    match fs::read(path) {
        Ok(content) => {
            let digest = format!("{:x}", Sha256::digest(&content));
            digest.chars().take(8).collect()
        }
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", path.display());
            "dev".to_owned()
        }
    }
}
