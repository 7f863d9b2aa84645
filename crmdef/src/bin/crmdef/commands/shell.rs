use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use crmdef::MetadataRegistry;

use crate::commands::{RegistryCommands, execute};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Interactive Session",
    commands: &[
        "crmdef shell",
        "crmdef› objects create Project__c --label Project",
        r#"crmdef› fields create Project__c '{"apiName":"Code__c","label":"Code","type":"Text"}'"#,
        "crmdef› exit",
    ],
}];

/// One line typed into the shell
#[derive(Parser)]
#[command(name = "crmdef", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: RegistryCommands,
}

/// Run an interactive session. Changes live for the session only.
pub fn handle_shell(registry: &mut MetadataRegistry, output: &OutputManager) -> Result<()> {
    output.info("Type a command (e.g. 'objects list'), 'help' or 'exit'.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", output.prompt());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;

        let tokens = match split_line(&line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output.error(&err.to_string());
                continue;
            }
        };
        match tokens.first().map(String::as_str) {
            None => continue,
            Some("exit" | "quit") => break,
            Some("help") => {
                if let Err(err) = ShellLine::try_parse_from(["--help"]) {
                    let _ = err.print();
                }
                continue;
            }
            Some(_) => {}
        }

        match ShellLine::try_parse_from(&tokens) {
            Ok(parsed) => {
                if let Err(err) = execute(parsed.command, registry, output) {
                    output.error(&format!("{err:#}"));
                }
            }
            Err(err) => {
                let _ = err.print();
            }
        }
    }

    output.verbose(&format!("session ended with {} object(s)", registry.len()));
    Ok(())
}

/// Split a line into arguments with POSIX shell quoting rules.
fn split_line(line: &str) -> Result<Vec<String>> {
    shlex::split(line).context("unterminated quote or trailing backslash")
}
