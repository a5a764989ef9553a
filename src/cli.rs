//! Command line flags and the interactive shell's command grammar

use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, Subcommand};

use crate::prompts::{AnalysisMode, Modality};

/// Terminal learning assistant: text questions, image analysis and voice
#[derive(Debug, Parser)]
#[command(name = "skillsnap", version, about)]
pub struct Cli {
    /// Skip the launch splash
    #[arg(long)]
    pub no_splash: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// One-shot commands; without one the interactive shell starts
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask a text question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Analyze a still image
    Image {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = AnalysisMode::Identify)]
        mode: AnalysisMode,
    },
    /// Transcribe a WAV clip and answer it
    Voice { path: PathBuf },
}

pub const SHELL_HELP: &str = "\
Commands:
  mode text|image|voice          switch input mode
  analysis identify|extract|search
                                 choose how images are analyzed
  ask <question>                 ask a text question (plain lines work too)
  capture <image path>           take a still frame
  analyze                        analyze the captured frame
  reset                          discard the captured frame
  record <wav path>              start recording
  stop                           stop recording
  send                           transcribe and answer the recording
  status                         show the session state
  help                           show this help
  quit                           leave";

/// A line typed into the interactive shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Mode(Modality),
    Analysis(AnalysisMode),
    Ask(String),
    Capture(PathBuf),
    Analyze,
    Reset,
    Record(PathBuf),
    Stop,
    Send,
    Status,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let require = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{word}' needs {what}"))
            } else {
                Ok(rest)
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err("empty command".to_string()),
            "mode" => require("a mode")?.parse().map(ShellCommand::Mode),
            "analysis" => require("an analysis mode")?
                .parse()
                .map(ShellCommand::Analysis),
            "ask" => Ok(ShellCommand::Ask(require("a question")?.to_string())),
            "capture" => Ok(ShellCommand::Capture(PathBuf::from(require("an image path")?))),
            "analyze" => Ok(ShellCommand::Analyze),
            "reset" => Ok(ShellCommand::Reset),
            "record" => Ok(ShellCommand::Record(PathBuf::from(require("a WAV path")?))),
            "stop" => Ok(ShellCommand::Stop),
            "send" => Ok(ShellCommand::Send),
            "status" => Ok(ShellCommand::Status),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            _ => Ok(ShellCommand::Ask(line.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            "mode image".parse::<ShellCommand>().unwrap(),
            ShellCommand::Mode(Modality::Image)
        );
        assert_eq!(
            "analysis  extract".parse::<ShellCommand>().unwrap(),
            ShellCommand::Analysis(AnalysisMode::Extract)
        );
        assert_eq!(
            "capture ./shots/desk.jpg".parse::<ShellCommand>().unwrap(),
            ShellCommand::Capture(PathBuf::from("./shots/desk.jpg"))
        );
        assert_eq!("QUIT".parse::<ShellCommand>().unwrap(), ShellCommand::Quit);
    }

    #[test]
    fn test_plain_line_is_a_question() {
        assert_eq!(
            "What is a borrow checker?".parse::<ShellCommand>().unwrap(),
            ShellCommand::Ask("What is a borrow checker?".to_string())
        );
    }

    #[test]
    fn test_missing_argument() {
        assert!("record".parse::<ShellCommand>().is_err());
        assert!("mode".parse::<ShellCommand>().is_err());
        assert!("mode video".parse::<ShellCommand>().is_err());
        assert!("   ".parse::<ShellCommand>().is_err());
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::try_parse_from(["skillsnap", "image", "desk.png", "--mode", "search"]).unwrap();
        match cli.command {
            Some(Command::Image { path, mode }) => {
                assert_eq!(path, PathBuf::from("desk.png"));
                assert_eq!(mode, AnalysisMode::Search);
            }
            other => panic!("unexpected {other:?}"),
        }

        let cli = Cli::try_parse_from(["skillsnap", "-vv", "--no-splash"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.no_splash);
        assert_eq!(cli.log_filter(), "debug");
    }
}
