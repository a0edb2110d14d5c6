use thiserror::Error;

pub type Result<T> = std::result::Result<T, EscrowError>;

#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("Invalid game key")]
    InvalidKey,

    #[error("Invalid delta height: {0}")]
    InvalidDelta(u64),

    #[error("Wrong stake: expected {expected}, got {got}")]
    WrongStake { expected: u64, got: u64 },

    #[error("Stake {stake} exceeds the maximum of {max}")]
    StakeTooLarge { stake: u64, max: u64 },

    #[error("Game already exists")]
    GameAlreadyExists,

    #[error("Game not found")]
    NotFound,

    #[error("Game expired at height {expiry}, current height is {height}")]
    Expired { expiry: u64, height: u64 },

    #[error("Game does not expire until after height {expiry}, current height is {height}")]
    NotYetExpired { expiry: u64, height: u64 },

    #[error("Game already has a second player")]
    AlreadyJoined,

    #[error("Game is still waiting for a second player")]
    AwaitingOpponent,

    #[error("Player one cannot join their own game")]
    SelfPlay,

    #[error("Move already revealed")]
    AlreadyRevealed,

    #[error("Game already settled")]
    AlreadySettled,

    #[error("Invalid move: {0}")]
    InvalidMove(u8),

    #[error("Revealed move and secret do not match the commitment")]
    CommitmentMismatch,

    #[error("Caller is not a player of this game")]
    UnknownCaller,

    #[error("No funds to withdraw")]
    NoFunds,

    #[error("Caller is not the controller")]
    Unauthorized,

    #[error("Engine is paused")]
    Paused,

    #[error("Engine is already paused")]
    AlreadyPaused,

    #[error("Engine is not paused")]
    NotPaused,

    #[error("Balance overflow")]
    BalanceOverflow,

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Account not found: {name}")]
    AccountNotFound { name: String },

    #[error("Account already exists: {name}")]
    AccountExists { name: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EscrowError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::TransferFailed(msg.into())
    }
}
