use std::fs::File;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::error::ClassifierError;

/// Extracts the model file from a downloaded archive into `dest_dir`.
///
/// Entries are matched by extension, earlier extensions winning over later ones.
/// Only the entry's file name is kept, so archive paths never escape `dest_dir`.
pub fn extract_model(
    archive_path: &Path,
    extensions: &[String],
    dest_dir: &Path,
) -> Result<PathBuf, ClassifierError> {
    let file = File::open(archive_path).map_err(|e| {
        ClassifierError::RemoteDownload(format!("cannot open downloaded archive: {}", e))
    })?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ClassifierError::RemoteDownload(format!("invalid archive: {}", e)))?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(zip_error)?;
        if entry.is_dir() {
            continue;
        }
        if let Some(name) = entry.enclosed_name() {
            entries.push((i, name));
        }
    }

    let (index, name) = pick_entry(&entries, extensions).ok_or_else(|| {
        ClassifierError::RemoteDownload(format!(
            "archive contains no model file with extension {}",
            extensions.join(" or ")
        ))
    })?;
    let file_name = name
        .file_name()
        .ok_or_else(|| ClassifierError::RemoteDownload("model entry has no file name".into()))?;

    let out_path = dest_dir.join(file_name);
    let mut entry = archive.by_index(index).map_err(zip_error)?;
    let mut out = File::create(&out_path).map_err(|e| {
        ClassifierError::RemoteDownload(format!("cannot write {}: {}", out_path.display(), e))
    })?;
    std::io::copy(&mut entry, &mut out).map_err(|e| {
        ClassifierError::RemoteDownload(format!("failed to extract {}: {}", name.display(), e))
    })?;

    log::info!("Extracted {} from archive", name.display());
    Ok(out_path)
}

fn pick_entry(entries: &[(usize, PathBuf)], extensions: &[String]) -> Option<(usize, PathBuf)> {
    for extension in extensions {
        let wanted = extension.trim_start_matches('.');
        let mut matches = entries.iter().filter(|(_, name)| {
            name.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
        });
        if let Some(found) = matches.next() {
            let extra = matches.count();
            if extra > 0 {
                log::warn!(
                    "Archive holds {} more .{} files, using {}",
                    extra,
                    wanted,
                    found.1.display()
                );
            }
            return Some(found.clone());
        }
    }
    None
}

fn zip_error(err: zip::result::ZipError) -> ClassifierError {
    ClassifierError::RemoteDownload(format!("invalid archive: {}", err))
}
