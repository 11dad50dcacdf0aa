// Classpath assembly. Ordering is part of the contract: sorted library
// walk, client jar last, so two runs over the same tree always produce
// the same string.

use std::path::{Path, PathBuf};

use crate::error::{LauncherError, LauncherResult};

#[cfg(windows)]
pub const CLASSPATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const CLASSPATH_SEPARATOR: &str = ":";

fn collect_jars(dir: &Path, out: &mut Vec<PathBuf>) -> LauncherResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| LauncherError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| LauncherError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_jars(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "jar") {
            out.push(path);
        }
    }
    Ok(())
}

/// Every jar under `libraries_dir` in sorted order, then the client jar
/// exactly once. A missing libraries directory yields a classpath of
/// just the client.
pub fn build_classpath(libraries_dir: &Path, client_jar: &Path) -> LauncherResult<String> {
    let mut jars = Vec::new();
    if libraries_dir.is_dir() {
        collect_jars(libraries_dir, &mut jars)?;
    }
    jars.sort();
    jars.retain(|jar| jar != client_jar);
    jars.push(client_jar.to_path_buf());

    Ok(jars
        .iter()
        .map(|jar| jar.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(CLASSPATH_SEPARATOR))
}
