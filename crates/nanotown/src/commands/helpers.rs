use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::error;

use nanotown_core::vcs::{self, VcsBackend};
use nanotown_core::{Config, NanotownConfig, SessionStore, SystemInspector};

/// Everything a command needs to touch the session store and processes.
pub struct CommandContext {
    pub config: Config,
    pub settings: NanotownConfig,
    pub store: SessionStore,
    pub inspector: SystemInspector,
}

impl CommandContext {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::resolve()?;
        let settings = NanotownConfig::load_hierarchy().inspect_err(|e| {
            error!(event = "cli.config.load_failed", error = %e);
        })?;
        let store = SessionStore::open(&config)?;
        Ok(Self {
            config,
            settings,
            store,
            inspector: SystemInspector::new(),
        })
    }
}

/// Backend and repository root for the current directory.
pub fn current_repo() -> Result<(&'static dyn VcsBackend, PathBuf), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    Ok(vcs::discover_repo(&cwd)?)
}

/// Print `prompt`, read one line from stdin and accept `y` or `yes`.
///
/// Prints "Aborted." on any other answer. End of input declines silently.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    confirm_from(prompt, &mut io::stdin().lock(), &mut io::stdout())
}

fn confirm_from(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }

    let accepted = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");
    if !accepted {
        writeln!(out, "Aborted.")?;
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answer: &str) -> (bool, String) {
        let mut input = io::Cursor::new(answer.as_bytes().to_vec());
        let mut out = Vec::new();
        let accepted = confirm_from("Continue?", &mut input, &mut out).unwrap();
        (accepted, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_confirm_accepts_y_and_yes() {
        assert!(ask("y\n").0);
        assert!(ask("YES\n").0);
        assert!(ask("  yes  \n").0);
    }

    #[test]
    fn test_confirm_declines_and_prints_aborted() {
        let (accepted, out) = ask("n\n");
        assert!(!accepted);
        assert_eq!(out, "Continue? [y/N] Aborted.\n");

        assert!(!ask("\n").0);
        assert!(!ask("yep\n").0);
    }

    #[test]
    fn test_confirm_end_of_input_declines_silently() {
        let (accepted, out) = ask("");
        assert!(!accepted);
        assert!(!out.contains("Aborted."));
    }
}
