use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("nt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run parallel agent sessions in isolated worktrees of one repository")
        .long_about("nanotown launches interactive shells in disposable git worktrees under <repo>/.nanotown/. Each session is recorded so `nt status` can show which agents are active, idle or exited, and finished worktrees can be merged back or cleaned up.")
        .override_usage(
            "nt <desc>...\n       nt -w <worktree-id> [desc]...\n       nt <COMMAND>",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("worktree")
                .short('w')
                .long("worktree")
                .value_name("WORKTREE_ID")
                .help("Launch on this worktree id instead of a generated nt-<n> (reused if it exists)"),
        )
        .arg(
            Arg::new("description")
                .help("What the session is for (shown in the banner, title and status)")
                .num_args(1..)
                .trailing_var_arg(true)
                .value_name("DESC"),
        )
        .arg_required_else_help(true)
        .subcommand(Command::new("status").about("Show all sessions (live-updating)"))
        .subcommand(
            Command::new("merge")
                .about("Merge a worktree into your current branch and clean up")
                .arg(worktree_id_arg("Worktree to merge")),
        )
        .subcommand(
            Command::new("stop")
                .about("Stop all running sessions on a worktree")
                .arg(worktree_id_arg("Worktree whose sessions to stop")),
        )
        .subcommand(Command::new("stopall").about("Stop all running sessions of this repository"))
        .subcommand(Command::new("clean").about("Remove stopped sessions and orphaned worktrees"))
        .subcommand(
            Command::new("delete")
                .about("Delete a worktree and its sessions")
                .arg(worktree_id_arg("Worktree to delete")),
        )
        .subcommand(
            Command::new("deleteall").about("Delete all sessions and worktrees of this repository"),
        )
}

fn worktree_id_arg(help: &'static str) -> Arg {
    Arg::new("worktree-id").help(help).required(true).index(1)
}
