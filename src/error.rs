use thiserror::Error;

use crate::tubes::Tube;

/// Failures surfaced by the simulation core.
///
/// Hand-size and ledger errors are defects: they abort the current call and the
/// run that made it. Configuration errors are raised before any round starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("expected a 5-card hand, found {found} cards")]
    InvalidHandSize { found: usize },

    #[error("deck exhausted: requested {requested} cards, {remaining} remaining")]
    DeckExhausted { requested: usize, remaining: usize },

    #[error(
        "{tube} reserve out of balance: funded {funded} - taken {taken} != balance {balance}"
    )]
    LedgerInvariant {
        tube: Tube,
        funded: u64,
        taken: u64,
        balance: u64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not load configuration: {0}")]
    ConfigFile(String),
}

pub type SimResult<T> = Result<T, SimError>;
