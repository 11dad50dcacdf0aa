// Placeholder substitution over the version descriptor's argument
// templates. One pass, one fixed token table: unknown tokens fail the
// whole synthesis instead of leaking `${...}` into a launch command.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{LauncherError, LauncherResult};
use crate::paths::Layout;
use crate::version::VersionDescriptor;

use super::classpath::{build_classpath, CLASSPATH_SEPARATOR};
use super::LaunchSpecification;

const LAUNCHER_NAME: &str = "WildcatLauncher";
const LAUNCHER_VERSION: &str = "1.0.0";

/// Fixed substitution table for one synthesis run.
struct TokenTable {
    values: HashMap<&'static str, String>,
}

impl TokenTable {
    fn build(
        descriptor: &VersionDescriptor,
        version_id: &str,
        layout: &Layout,
        config: &SessionConfig,
        classpath: String,
    ) -> LauncherResult<Self> {
        if config.player_name.trim().is_empty() {
            return Err(LauncherError::MissingConfig("player name"));
        }
        let game_dir = config
            .game_dir_override
            .clone()
            .unwrap_or_else(|| layout.instance_dir(version_id));
        if game_dir.as_os_str().is_empty() {
            return Err(LauncherError::MissingConfig("game directory"));
        }

        let assets_index_name = descriptor
            .asset_index
            .as_ref()
            .map(|index| index.id.clone())
            .unwrap_or_default();

        let mut values: HashMap<&'static str, String> = HashMap::new();
        // Identity.
        values.insert("auth_player_name", config.player_name.clone());
        values.insert("auth_uuid", config.player_uuid.to_string());
        values.insert("auth_access_token", config.access_token.clone());
        values.insert("user_type", config.user_type.clone());
        values.insert("version_type", config.version_type.clone());
        values.insert("auth_xuid", String::new());
        values.insert("clientid", String::new());
        // Structure.
        values.insert("version_name", version_id.to_string());
        values.insert("game_directory", path_string(&game_dir));
        values.insert("assets_root", path_string(&layout.assets_dir(version_id)));
        values.insert("assets_index_name", assets_index_name);
        values.insert("classpath", classpath);
        values.insert("classpath_separator", CLASSPATH_SEPARATOR.to_string());
        values.insert(
            "natives_directory",
            path_string(&layout.version_root(version_id).join("natives")),
        );
        values.insert(
            "library_directory",
            path_string(&layout.libraries_dir(version_id)),
        );
        values.insert("launcher_name", LAUNCHER_NAME.to_string());
        values.insert("launcher_version", LAUNCHER_VERSION.to_string());

        Ok(Self { values })
    }

    /// Single left-to-right pass; substituted values are emitted as-is,
    /// never re-scanned.
    fn substitute(&self, template: &str) -> LauncherResult<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(LauncherError::Synthesis(format!(
                    "Unterminated placeholder in '{template}'"
                )));
            };
            let token = &after[..end];
            let value = self
                .values
                .get(token)
                .ok_or_else(|| LauncherError::UnresolvedToken(token.to_string()))?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Loaders ship their own classpath flags in some descriptors; those are
/// dropped since the classpath is injected here.
fn strip_classpath_flags(templates: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(templates.len());
    let mut skip_next = false;
    for arg in templates {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "-cp" || arg == "-classpath" {
            skip_next = true;
            continue;
        }
        out.push(arg);
    }
    out
}

/// Produce the complete, substituted launch argument list for one
/// version: JVM flags, classpath, main class, game arguments.
pub fn synthesize(
    descriptor: &VersionDescriptor,
    version_id: &str,
    layout: &Layout,
    config: &SessionConfig,
) -> LauncherResult<LaunchSpecification> {
    let classpath = build_classpath(
        &layout.libraries_dir(version_id),
        &layout.client_jar(version_id),
    )?;
    let table = TokenTable::build(descriptor, version_id, layout, config, classpath.clone())?;

    let mut lines = Vec::new();
    for template in strip_classpath_flags(descriptor.jvm_arg_templates()) {
        lines.push(table.substitute(&template)?);
    }
    lines.push("-cp".to_string());
    lines.push(classpath);
    lines.push(descriptor.main_class.clone());
    for template in descriptor.game_arg_templates() {
        lines.push(table.substitute(&template)?);
    }

    debug!(
        "Synthesized {} launch arguments for {version_id}",
        lines.len()
    );
    Ok(LaunchSpecification::new(lines))
}
