use thiserror::Error;

/// Rejected user actions. None of these leave a partial mutation behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PetError {
    #[error("not enough coins: costs {cost}, have {coins}")]
    InsufficientFunds { cost: u32, coins: u32 },

    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("{0} is not something Bloop can eat")]
    NotFood(&'static str),

    #[error("{0} is not sold in the boutique")]
    NotForSale(&'static str),

    #[error("{0} is already in the wardrobe")]
    AlreadyOwned(&'static str),

    #[error("{0} is not in the wardrobe")]
    NotOwned(String),

    #[error("voice input is not supported here")]
    VoiceUnsupported,

    #[error("the mini-game is still running")]
    GameNotFinished,

    #[error("no mini-game is active")]
    NoActiveGame,
}
