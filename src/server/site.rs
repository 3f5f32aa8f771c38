// server/site.rs

use crate::analyzer::TrackAnalyzer;
use crate::config::AssetsConfig;
use crate::server::page::render_page;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Creates the static tree and copies the header image and social icons into it.
/// Missing sources are skipped, so this is safe to run on every start.
pub fn ensure_static_files(static_dir: &Path, assets: &AssetsConfig) -> io::Result<()> {
    for sub in ["img", "icons", "visualization"] {
        fs::create_dir_all(static_dir.join(sub))?;
    }

    let copies = assets
        .images
        .iter()
        .map(|name| ("img", name))
        .chain(assets.icons.iter().map(|name| ("icons", name)));
    for (kind, name) in copies {
        let source = assets.project_dir.join(kind).join(name);
        if !source.is_file() {
            debug!("Asset {} not found, skipping", source.display());
            continue;
        }
        let target = static_dir.join(kind).join(name);
        fs::copy(&source, &target)?;
        info!("Copied {} to {}", name, target.display());
    }
    Ok(())
}

/// Recreates `site_dir` with the static tree under `static/` and the rendered page as `index.html`.
pub fn export_static_site(analyzer: &TrackAnalyzer, static_dir: &Path, site_dir: &Path) -> io::Result<PathBuf> {
    if site_dir.exists() {
        fs::remove_dir_all(site_dir)?;
    }
    fs::create_dir_all(site_dir)?;

    let target_root = site_dir.join("static");
    if static_dir.is_dir() {
        copy_tree(static_dir, &target_root)?;
    } else {
        fs::create_dir_all(&target_root)?;
    }

    let index = site_dir.join("index.html");
    fs::write(&index, render_page(analyzer))?;
    info!("Static site generated in {}", site_dir.display());
    Ok(index)
}

fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
