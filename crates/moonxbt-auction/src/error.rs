use alloy::primitives::TxHash;

#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("Contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("Transaction failed: {0}")]
    Transaction(#[from] alloy::providers::PendingTransactionError),

    #[error("Transaction {0} reverted")]
    Reverted(TxHash),

    #[error("Invalid bid: {0}")]
    InvalidBid(String),

    /// The bid would revert; it was never sent.
    #[error("Bid simulation failed: {0}")]
    Simulation(String),

    #[error("{0}")]
    Rpc(String),
}
