//! Shell resolution and the launch script run inside the pseudo-terminal.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::errors::BridgeError;

#[cfg(unix)]
const DEFAULT_SHELL: &str = "/bin/sh";
#[cfg(not(unix))]
const DEFAULT_SHELL: &str = "cmd.exe";

/// Shells whose startup can be redirected to a generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
    Other,
}

impl ShellKind {
    pub fn of(program: &str) -> Self {
        let base = Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match base.as_str() {
            "bash" => ShellKind::Bash,
            "zsh" => ShellKind::Zsh,
            _ => ShellKind::Other,
        }
    }
}

/// Configured program, else `$SHELL`, else the platform default.
pub fn resolve_shell(configured: Option<&str>) -> String {
    configured
        .filter(|p| !p.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

/// Single-quote a value for POSIX `sh`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn write_file(path: &Path, content: &str) -> Result<(), BridgeError> {
    fs::write(path, content).map_err(|source| BridgeError::StartupFiles {
        path: path.to_path_buf(),
        source,
    })
}

/// Write prompt-tagging startup files for bash or zsh into `dir` and return
/// the `exec` line that starts the shell with them. Other shells start
/// unmodified and nothing is written.
pub fn prepare_startup(
    program: &str,
    dir: Option<&Path>,
    prompt_tag: &str,
) -> Result<String, BridgeError> {
    let plain = format!("exec {}", shell_quote(program));
    let Some(dir) = dir else {
        return Ok(plain);
    };

    match ShellKind::of(program) {
        ShellKind::Bash => {
            fs::create_dir_all(dir).map_err(|source| BridgeError::StartupFiles {
                path: dir.to_path_buf(),
                source,
            })?;
            let rc = dir.join("bashrc");
            write_file(
                &rc,
                &format!(
                    "[ -f ~/.bashrc ] && . ~/.bashrc\nPS1=\"\\[\\033[32m\\][{prompt_tag}]\\[\\033[0m\\] $PS1\"\n"
                ),
            )?;
            debug!(event = "core.terminal.startup_files_written", shell = "bash", dir = %dir.display());
            Ok(format!(
                "exec {} --rcfile {}",
                shell_quote(program),
                shell_quote(&rc.to_string_lossy())
            ))
        }
        ShellKind::Zsh => {
            let zdotdir: PathBuf = dir.join("zsh");
            fs::create_dir_all(&zdotdir).map_err(|source| BridgeError::StartupFiles {
                path: zdotdir.clone(),
                source,
            })?;
            write_file(
                &zdotdir.join(".zshenv"),
                "[ -f \"$HOME/.zshenv\" ] && . \"$HOME/.zshenv\"\n",
            )?;
            write_file(
                &zdotdir.join(".zshrc"),
                &format!(
                    "[ -f \"$HOME/.zshrc\" ] && . \"$HOME/.zshrc\"\nPS1=\"%F{{green}}[{prompt_tag}]%f $PS1\"\n"
                ),
            )?;
            debug!(event = "core.terminal.startup_files_written", shell = "zsh", dir = %dir.display());
            Ok(format!(
                "ZDOTDIR={} exec {}",
                shell_quote(&zdotdir.to_string_lossy()),
                shell_quote(program)
            ))
        }
        ShellKind::Other => Ok(plain),
    }
}

/// Script for `sh -c`: print and delete the banner passed as `$1`, set the
/// terminal title, then replace itself with the shell.
pub fn build_launch_script(with_banner: bool, title: &str, exec_line: &str) -> String {
    let mut parts = Vec::new();
    if with_banner {
        parts.push(r#"cat "$1"; rm -f "$1""#.to_string());
    }
    if !title.is_empty() {
        parts.push(format!(r"printf '\033]0;%s\007' {}", shell_quote(title)));
    }
    parts.push(exec_line.to_string());
    parts.join("; ")
}

/// Command line for `cmd.exe /k`: show and delete the banner, set the title.
pub fn build_cmd_script(banner: Option<&Path>, title: &str) -> String {
    let mut parts = Vec::new();
    if let Some(banner) = banner {
        let path = banner.to_string_lossy();
        parts.push(format!("type \"{path}\""));
        parts.push(format!("del \"{path}\""));
    }
    if !title.is_empty() {
        parts.push(format!("title {}", title.replace(['&', '|', '<', '>', '^'], "")));
    }
    parts.join(" & ")
}
