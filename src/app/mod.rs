pub mod run;
pub mod token;

pub use run::{run, store_session, Deps, RunOutcome};
pub use token::{validate_token, PromptTokenSource, TokenSource};
