use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use async_trait::async_trait;

use crate::contracts::IMoonAuction;
use crate::data::BidInfo;
use crate::error::AuctionError;

/// Read side of the auction contract.
#[async_trait]
pub trait AuctionSource: Send + Sync {
    async fn current_auction_id(&self) -> Result<U256, AuctionError>;

    /// Seconds left in the current auction.
    async fn time_remaining(&self) -> Result<U256, AuctionError>;

    async fn last_auction_winner(&self) -> Result<BidInfo, AuctionError>;

    async fn get_bid(&self, auction_id: U256) -> Result<BidInfo, AuctionError>;
}

/// [`AuctionSource`] backed by `eth_call`s against the deployed contract.
pub struct ContractAuctionSource<P> {
    contract: IMoonAuction::IMoonAuctionInstance<P>,
}

impl<P: Provider> ContractAuctionSource<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            contract: IMoonAuction::new(address, provider),
        }
    }

    pub fn address(&self) -> &Address {
        self.contract.address()
    }
}

#[async_trait]
impl<P: Provider> AuctionSource for ContractAuctionSource<P> {
    async fn current_auction_id(&self) -> Result<U256, AuctionError> {
        Ok(self.contract.currentAuctionId().call().await?)
    }

    async fn time_remaining(&self) -> Result<U256, AuctionError> {
        Ok(self.contract.getTimeRemaining().call().await?)
    }

    async fn last_auction_winner(&self) -> Result<BidInfo, AuctionError> {
        let winner = self.contract.getLastAuctionWinner().call().await?;
        Ok(BidInfo {
            bidder: winner.winner,
            amount: winner.amount,
            resource_value: winner.resourceValue,
        })
    }

    async fn get_bid(&self, auction_id: U256) -> Result<BidInfo, AuctionError> {
        let bid = self.contract.getBid(auction_id).call().await?;
        Ok(BidInfo {
            bidder: bid.bidder,
            amount: bid.amount,
            resource_value: bid.resourceValue,
        })
    }
}
