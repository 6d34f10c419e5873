//! Select role: open the editor at the location of a selected block.

use anyhow::{Context, Result, bail};

use crate::block::{FileLocation, get_location};
use crate::config::{EditorConfig, TuickConfig};
use crate::utils::exec::Cmd;
use crate::{debug, log};

pub fn run(selection: &str, config: &TuickConfig) -> Result<i32> {
    let location = match get_location(selection) {
        Ok(location) => location,
        Err(err) => {
            debug!("warn"; "{err}");
            return Ok(0);
        }
    };

    let argv = editor_command(&config.editor, &location, |name| std::env::var(name).ok())?;
    let cmd = Cmd::from_slice(&argv);
    debug!("$"; "{}", cmd.display());

    let status = cmd
        .command()
        .status()
        .with_context(|| format!("Failed to run editor `{}`", cmd.program_name()))?;
    if !status.success() {
        log!("error"; "editor exited with {status}");
        bail!("Editor `{}` failed with {status}", cmd.program_name());
    }
    Ok(0)
}

/// Editor argv for `location`.
///
/// The `[editor]` template wins; otherwise `$VISUAL` or `$EDITOR` is run as
/// `<editor> +<line> <path>`. Missing line or column numbers become 1.
pub fn editor_command(
    config: &EditorConfig,
    location: &FileLocation,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<String>> {
    let line = location.line.unwrap_or(1).to_string();
    let column = location.column.unwrap_or(1).to_string();

    if let Some(template) = &config.command {
        return Ok(template
            .iter()
            .map(|word| {
                word.replace("{path}", &location.path)
                    .replace("{line}", &line)
                    .replace("{column}", &column)
            })
            .collect());
    }

    let Some(editor) = ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(&lookup)
        .find(|value| !value.trim().is_empty())
    else {
        bail!("No editor configured: set $EDITOR or [editor] command in tuick.toml");
    };

    let mut argv: Vec<String> = editor.split_whitespace().map(String::from).collect();
    argv.push(format!("+{line}"));
    argv.push(location.path.clone());
    Ok(argv)
}
