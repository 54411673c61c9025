//! The interactive shell: a rustyline loop feeding lines through the same
//! command enum the one-shot CLI uses.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

use crate::cli_style::{self, print_error};
use crate::commands::{execute, Command, CommandExecutionResult};
use crate::session::Session;

#[derive(Parser)]
#[command(styles=cli_style::get_styles(), name = "")]
struct ShellCli {
    #[command(subcommand)]
    command: Command,
}

/// One shell line parsed into a command. Empty input parses to `None`;
/// anything else that does not parse is a clap error carrying usage text.
pub fn parse_line(line: &str) -> Result<Option<Command>, clap::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let args = shlex::split(trimmed)
        .unwrap_or_else(|| trimmed.split_whitespace().map(String::from).collect());
    let cli =
        ShellCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)))?;
    Ok(Some(cli.command))
}

pub fn run_shell(session: &mut Session) -> Result<()> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::<ShellHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(ShellHelper::new()));

    println!("Type 'help' for commands, 'exit' to leave.");

    loop {
        let prompt = build_prompt(session);
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match parse_line(&line) {
                    Ok(Some(command)) => match execute(command, session) {
                        CommandExecutionResult::Ok => {}
                        CommandExecutionResult::Exit => break,
                        CommandExecutionResult::Error(message) => print_error(&message),
                    },
                    Ok(None) => {}
                    Err(error) => {
                        if error.print().is_err() {
                            println!("{}", error);
                        }
                    }
                }
            }
            // Ctrl-C drops the line and keeps the shell alive
            Err(rustyline::error::ReadlineError::Interrupted) => continue,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(error) => {
                print_error(&format!("{:?}", error));
                break;
            }
        }
    }
    Ok(())
}

/// Room and transport state when a speaker is selected, degrading to the
/// room alone when the state fetch fails.
fn build_prompt(session: &Session) -> String {
    match session.current_speaker() {
        Some(speaker) => {
            let state = speaker
                .transport_state()
                .ok()
                .map(|state| cli_style::transport_label(state.as_device_str()));
            cli_style::prompt(Some(speaker.zone_name()), state.as_deref())
        }
        None => cli_style::prompt(None, None),
    }
}

#[derive(rustyline_derive::Hinter)]
struct ShellHelper {
    command_names: Vec<String>,
}

impl ShellHelper {
    fn new() -> Self {
        let command_names: Vec<String> = ShellCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();
        ShellHelper { command_names }
    }
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .command_names
            .iter()
            .filter(|name| name.starts_with(line))
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        Ok((0, matches))
    }
}

impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl Helper for ShellHelper {}
