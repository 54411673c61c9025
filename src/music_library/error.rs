//! Caller-visible failures of the music library.
//!
//! Query and queue validation errors carry the exact wording the shell
//! prints; store and device failures pass through opaquely. Nothing here
//! is retried internally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Not indexed, run 'index' first")]
    NotIndexed,

    #[error(
        "Search term missing. Can be on the form 'field=text' or 'text' \
         e.g. 'artist=Metallica'. If no field is given 'title' field is used."
    )]
    MissingSearchTerm,

    #[error("= signs are not allowed in the search string")]
    MalformedQuery,

    #[error("The search field '{field}' is unknown. Only {} is allowed", .allowed.join(", "))]
    UnknownField { field: String, allowed: Vec<String> },

    #[error(
        "Incorrect play syntax, must be 'search action number' \
         e.g. 'artist=Metallica add 7'. Action can be 'add' or 'replace'"
    )]
    PlaySyntax,

    #[error("Action must be 'add' or 'replace'")]
    InvalidAction,

    #[error("Play number must be parseable as integer")]
    InvalidNumber,

    #[error("{}", play_range_message(.result_count))]
    NumberOutOfRange { result_count: usize },

    #[error("Library store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Device error: {0}")]
    Device(#[source] anyhow::Error),
}

fn play_range_message(result_count: &usize) -> String {
    match result_count {
        0 => "No results to play from".to_string(),
        1 => "Play number can only be 1".to_string(),
        n => format!("Play number has to be in the range from 1 to {n}"),
    }
}
