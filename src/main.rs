use std::io;
use std::process::ExitCode;

use anki_quick_search::config::Config;
use anki_quick_search::output::Feedback;
use anki_quick_search::rpc::{AnkiClient, RpcError};
use anki_quick_search::search::{SearchError, Searcher};
use anki_quick_search::types::CardId;

const USAGE: &str = "\
usage: anki-quick-search <command> [args]

commands:
  findNotes <query>    search notes, print launcher feedback
  findCards <query>    search cards, print launcher feedback
  cardsInfo <id>...    look up specific cards by id
  getTags [query]      list tags, optionally filtered by substring
  guiBrowse <query>    open the Anki card browser on a query";

/// Subcommands are named after the bridge actions they drive, which is also
/// what the launcher workflow scripts invoke.
#[derive(Debug)]
enum Command {
    FindNotes { query: String },
    FindCards { query: String },
    CardsInfo { cards: Vec<CardId> },
    GetTags { filter: Option<String> },
    GuiBrowse { query: String },
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let action = args.next().ok_or("missing command")?;
        match action.as_str() {
            "findNotes" => Ok(Self::FindNotes {
                query: require_query(args, "findNotes")?,
            }),
            "findCards" => Ok(Self::FindCards {
                query: require_query(args, "findCards")?,
            }),
            "cardsInfo" => {
                let cards = args
                    .map(|raw| {
                        raw.parse::<CardId>()
                            .map_err(|_| format!("not a card id: {raw}"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if cards.is_empty() {
                    return Err("cardsInfo requires at least one card id".to_string());
                }
                Ok(Self::CardsInfo { cards })
            }
            "getTags" => {
                let rest: Vec<String> = args.collect();
                let filter = (!rest.is_empty()).then(|| rest.join(" "));
                Ok(Self::GetTags { filter })
            }
            "guiBrowse" => Ok(Self::GuiBrowse {
                query: require_query(args, "guiBrowse")?,
            }),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

/// Collect the remaining words into one query string. The launcher passes
/// the query as a single argument, but joining keeps manual shell use sane.
fn require_query(args: impl Iterator<Item = String>, command: &str) -> Result<String, String> {
    let words: Vec<String> = args.collect();
    if words.is_empty() {
        return Err(format!("{command} requires a query"));
    }
    Ok(words.join(" "))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // stdout belongs to the launcher payload; every diagnostic goes to
    // stderr.
    #[cfg(debug_assertions)]
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    #[cfg(not(debug_assertions))]
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(io::stderr)
        .init();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = Config::from_env();
    tracing::debug!(
        url = %config.connect_url,
        front = ?config.prefs.front,
        back = ?config.prefs.back,
        "configuration loaded"
    );

    match run(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "invocation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let client = AnkiClient::new(&config.connect_url, config.timeout)?;
    let searcher = Searcher::new(client, config.prefs);
    let stdout = io::stdout();

    match command {
        Command::FindNotes { query } => match searcher.search(&query).await {
            Ok(results) if results.is_empty() => Feedback::not_found().write_to(stdout)?,
            Ok(results) => Feedback::from_notes(&results).write_to(stdout)?,
            Err(error) => feedback_for(&error).write_to(stdout)?,
        },
        Command::FindCards { query } => match searcher.search_cards(&query).await {
            Ok(results) if results.is_empty() => Feedback::not_found().write_to(stdout)?,
            Ok(results) => Feedback::from_cards(&results).write_to(stdout)?,
            Err(error) => feedback_for(&error).write_to(stdout)?,
        },
        Command::CardsInfo { cards } => match searcher.cards_info(&cards).await {
            Ok(results) if results.is_empty() => Feedback::not_found().write_to(stdout)?,
            Ok(results) => Feedback::from_cards(&results).write_to(stdout)?,
            Err(error) => feedback_for(&error).write_to(stdout)?,
        },
        Command::GetTags { filter } => match searcher.list_tags(filter.as_deref()).await {
            Ok(tags) if tags.is_empty() => Feedback::not_found().write_to(stdout)?,
            Ok(tags) => Feedback::from_tags(&tags).write_to(stdout)?,
            Err(error) => feedback_for(&error).write_to(stdout)?,
        },
        // An action, not a filter: nothing is printed on success.
        Command::GuiBrowse { query } => {
            if let Err(error) = searcher.open_browser(&query).await {
                feedback_for(&error).write_to(stdout)?;
            }
        }
    }

    Ok(())
}

/// Map a pipeline failure onto the single item the launcher shows. The full
/// error always lands in the stderr log first; the item wording matches
/// what a user can act on.
fn feedback_for(error: &SearchError) -> Feedback {
    tracing::error!(%error, "bridge call failed");
    match error {
        SearchError::Rpc(RpcError::Connection { .. }) => Feedback::message(
            "Is Anki running?",
            "Start Anki and make sure the AnkiConnect add-on is installed",
        ),
        SearchError::Rpc(RpcError::Application(message)) => {
            Feedback::message("Anki rejected the request", message)
        }
        SearchError::Rpc(RpcError::Protocol(_)) | SearchError::ResultMismatch { .. } => {
            Feedback::message("Unexpected response from Anki", "See the log for details")
        }
    }
}
