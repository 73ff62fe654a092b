//! Config subcommand handlers.

use obsfleet_config::{Config, ConfigError};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(
    args: ConfigArgs,
    config: Result<Config, ConfigError>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&util::config_file(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let config = config?;
            let text = toml::to_string_pretty(&config).map_err(|e| CliError::Render(e.to_string()))?;
            let out = output::render_single(
                global.output,
                &config,
                |_| text.trim_end().to_owned(),
                |_| text.trim_end().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = util::config_file(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            obsfleet_config::save_config(&Config::starter(), &path)?;
            util::note(
                global,
                &format!("Wrote starter config to {}\nEdit the [[units]] entries, then run: obsfleet status", path.display()),
            );
            Ok(())
        }
    }
}
