use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "camdict", version, about = "Look words up in the Cambridge dictionary")]
pub struct Cli {
    /// Configuration file; skipped when it does not exist.
    #[arg(long, short = 'c', global = true, env = "CAMDICT_CONFIG", default_value = "camdict.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a query to an entry id, or list suggestions.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Fetch an entry by id and print its lemmas.
    Lemma { id: String },
    /// Extract lemmas from a saved entry page.
    Parse {
        #[arg(long, short = 'f')]
        file: PathBuf,
    },
    /// Download the entry page for a word, optionally keeping the HTML.
    Fetch {
        #[arg(long, short = 'w')]
        word: String,
        #[arg(long, short = 's')]
        save: Option<PathBuf>,
    },
    /// Run the JSON front-end.
    Serve {
        /// Overrides `listen` from the configuration.
        #[arg(long, short = 'l')]
        listen: Option<String>,
    },
}

impl Command {
    /// Logging goes to stderr too for the long-running server.
    pub fn is_server(&self) -> bool {
        matches!(self, Command::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_keeps_every_word() {
        let cli = Cli::try_parse_from(["camdict", "search", "look", "up"]).unwrap();
        match cli.command {
            Command::Search { query } => assert_eq!(query, vec!["look", "up"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("camdict.yaml"));
    }

    #[test]
    fn fetch_takes_word_and_optional_save() {
        let cli = Cli::try_parse_from([
            "camdict", "--config", "other.yaml", "fetch", "--word", "run", "--save", "run.html",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("other.yaml"));
        match cli.command {
            Command::Fetch { word, save } => {
                assert_eq!(word, "run");
                assert_eq!(save, Some(PathBuf::from("run.html")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_requires_a_query() {
        assert!(Cli::try_parse_from(["camdict", "search"]).is_err());
        assert!(Cli::try_parse_from(["camdict", "parse"]).is_err());
    }

    #[test]
    fn only_serve_is_a_server() {
        let cli = Cli::try_parse_from(["camdict", "serve", "--listen", "0.0.0.0:1"]).unwrap();
        assert!(cli.command.is_server());
        let cli = Cli::try_parse_from(["camdict", "lemma", "run"]).unwrap();
        assert!(!cli.command.is_server());
    }
}
