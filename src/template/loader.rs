//! Loads template files from a directory into a [`FragmentStore`]

use std::path::{Path, PathBuf};

use crate::error::TemplateError;

use super::store::FragmentStore;

/// Register every file under `dir` whose extension is in `extensions`
///
/// A file's identifier is its path relative to `dir` without the extension,
/// with `/` separators: `pages/root.tpl` registers as `pages/root`. Returns the
/// registered identifiers in sorted order.
pub fn load_dir(
    store: &FragmentStore,
    dir: &Path,
    extensions: &[String],
) -> Result<Vec<String>, TemplateError> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    let mut ids = Vec::new();
    for path in files {
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let Some(id) = template_id(dir, &path) else {
            continue;
        };
        let source = std::fs::read_to_string(&path).map_err(|e| TemplateError::Load {
            path: path.clone(),
            message: e.to_string(),
        })?;
        store.register(id.clone(), source);
        ids.push(id);
    }

    tracing::debug!(dir = %dir.display(), count = ids.len(), "loaded template directory");
    Ok(ids)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), TemplateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| TemplateError::Load {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| TemplateError::Load {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Identifier for `path` relative to `base`
fn template_id(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?.with_extension("");
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
