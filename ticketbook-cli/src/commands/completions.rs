//! Shell completion generation command.

use crate::cli::Cli;
use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;

const BIN_NAME: &str = "ticketbook";

/// Generate shell completion scripts
#[derive(Parser)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Execute the completions command.
    pub fn execute(&self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut cmd = Cli::command();

        if !global.quiet {
            match self.shell {
                Shell::Bash => eprintln!("# eval \"$(ticketbook completions bash)\""),
                Shell::Zsh => {
                    eprintln!("# ticketbook completions zsh > ~/.zsh/completions/_ticketbook");
                }
                Shell::Fish => eprintln!("# ticketbook completions fish | source"),
                _ => {}
            }
        }

        generate(self.shell, &mut cmd, BIN_NAME, &mut io::stdout());
        Ok(())
    }
}
