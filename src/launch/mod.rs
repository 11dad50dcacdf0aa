// ─── Launch Argument Synthesis ───

pub mod classpath;
pub mod synthesize;

pub use classpath::{build_classpath, CLASSPATH_SEPARATOR};
pub use synthesize::synthesize;

use std::path::Path;

use crate::error::{LauncherError, LauncherResult};

/// Fully substituted launch arguments, one per line: JVM flags, `-cp`
/// and its value, the main class, then game arguments. The file form
/// follows the java `@argfile` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpecification {
    lines: Vec<String>,
}

impl LaunchSpecification {
    pub(crate) fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Ordered argument list for the process-launch collaborator.
    pub fn args(&self) -> &[String] {
        &self.lines
    }

    pub async fn write(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut body = self.lines.join("\n");
        body.push('\n');
        tokio::fs::write(path, body)
            .await
            .map_err(|e| LauncherError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn written_file_is_newline_joined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vanilla").join("java_args_1.21.1.txt");
        let spec = LaunchSpecification::new(vec![
            "-Xmx2G".to_string(),
            "net.minecraft.client.main.Main".to_string(),
        ]);
        spec.write(&path).await.unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(body, "-Xmx2G\nnet.minecraft.client.main.Main\n");
    }
}
