use clap::ArgMatches;

use nanotown_core::events;

pub mod helpers;

mod clean;
mod delete;
mod merge;
mod start;
mod status;
mod stop;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let command = matches.subcommand_name().unwrap_or("start");
    events::log_command_started(command);

    let result = match matches.subcommand() {
        Some(("status", _)) => status::handle_status_command(),
        Some(("merge", sub_matches)) => merge::handle_merge_command(sub_matches),
        Some(("stop", sub_matches)) => stop::handle_stop_command(sub_matches),
        Some(("stopall", _)) => stop::handle_stopall_command(),
        Some(("clean", _)) => clean::handle_clean_command(),
        Some(("delete", sub_matches)) => delete::handle_delete_command(sub_matches),
        Some(("deleteall", _)) => delete::handle_deleteall_command(),
        _ => start::handle_start_command(matches),
    };

    events::log_command_finished(command, result.is_ok());
    result
}
