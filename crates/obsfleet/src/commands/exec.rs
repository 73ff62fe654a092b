//! Remote shell command handler.

use obsfleet_core::FleetController;

use crate::cli::{ExecArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &FleetController,
    args: ExecArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    controller.unit(&args.unit)?;
    let command = args.command.join(" ");

    if !util::confirm(&format!("Run '{command}' on {}?", args.unit), global.yes)? {
        return Ok(());
    }

    let result = controller.send_remote_command(&args.unit, &command).await?;
    if !result.stderr.is_empty() && !global.quiet {
        eprint!("{}", result.stderr);
    }

    let out = output::render_single(
        global.output,
        &result,
        |r| r.stdout.trim_end().to_owned(),
        |r| r.stdout.trim_end().to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
