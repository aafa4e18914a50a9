use alloy::primitives::{utils::parse_ether, Address, TxHash, U256};
use alloy::providers::{PendingTransactionBuilder, Provider};
use async_trait::async_trait;
use moonxbt_core::validation::is_valid_url;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::contracts::IMoonAuction;
use crate::data::ResourceValue;
use crate::error::AuctionError;

/// Metadata stored with a bid when the bidder gives none.
pub const DEFAULT_RESOURCE_METADATA: &str = "N/A";

/// A validated bid: amount in wei and the encoded resource value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidRequest {
    amount: U256,
    resource_value: String,
}

impl BidRequest {
    /// `amount` is in whole tokens (`"1.5"`), `resource_url` must be an absolute
    /// http(s) URL.
    pub fn new(
        amount: &str,
        resource_url: &str,
        metadata: Option<&str>,
    ) -> Result<Self, AuctionError> {
        let raw = amount.trim();
        // parse_ether keeps only the magnitude of a signed value.
        if raw.starts_with('-') {
            return Err(AuctionError::InvalidBid(
                "amount must be greater than zero".to_string(),
            ));
        }
        let amount = parse_ether(raw)
            .map_err(|e| AuctionError::InvalidBid(format!("amount {:?}: {}", amount, e)))?;
        if amount.is_zero() {
            return Err(AuctionError::InvalidBid(
                "amount must be greater than zero".to_string(),
            ));
        }
        if !is_valid_url(resource_url) {
            return Err(AuctionError::InvalidBid(
                "resource URL must be an absolute http(s) URL".to_string(),
            ));
        }

        let resource = ResourceValue {
            url: resource_url.to_string(),
            metadata: Some(
                metadata
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_RESOURCE_METADATA)
                    .to_string(),
            ),
        };
        let resource_value = serde_json::to_string(&resource)
            .map_err(|e| AuctionError::InvalidBid(e.to_string()))?;

        Ok(Self {
            amount,
            resource_value,
        })
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    pub fn resource_value(&self) -> &str {
        &self.resource_value
    }
}

/// Progress of a bid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BidStatus {
    /// Nothing in progress, or simulated and ready to send.
    #[default]
    Idle,
    Simulating,
    /// The bid would revert; sending is blocked.
    SimulationError,
    /// Waiting for the signer to send.
    Prompting,
    /// Sent, waiting for the receipt.
    Pending,
    Success,
    /// Rejected, reverted or not confirmed.
    Error,
}

impl BidStatus {
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            BidStatus::Simulating | BidStatus::Prompting | BidStatus::Pending
        )
    }
}

impl Display for BidStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BidStatus::Idle => write!(f, "idle"),
            BidStatus::Simulating => write!(f, "simulating"),
            BidStatus::SimulationError => write!(f, "simulation_error"),
            BidStatus::Prompting => write!(f, "prompting"),
            BidStatus::Pending => write!(f, "pending"),
            BidStatus::Success => write!(f, "success"),
            BidStatus::Error => write!(f, "error"),
        }
    }
}

/// The three chain steps of placing a bid.
#[async_trait]
pub trait BidExecutor: Send + Sync {
    /// Dry-run `placeBid`; an error means the bid would revert.
    async fn simulate(&self, bid: &BidRequest) -> Result<(), AuctionError>;

    async fn send(&self, bid: &BidRequest) -> Result<TxHash, AuctionError>;

    /// Wait for the receipt; `false` when the transaction reverted.
    async fn confirm(&self, tx_hash: TxHash) -> Result<bool, AuctionError>;
}

/// [`BidExecutor`] for the auction contract. The provider must carry a wallet
/// able to sign for `sender`.
pub struct ContractBidExecutor<P> {
    contract: IMoonAuction::IMoonAuctionInstance<P>,
    sender: Option<Address>,
    confirm_timeout: Option<Duration>,
}

impl<P: Provider> ContractBidExecutor<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            contract: IMoonAuction::new(address, provider),
            sender: None,
            confirm_timeout: Some(Duration::from_secs(120)),
        }
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

#[async_trait]
impl<P: Provider> BidExecutor for ContractBidExecutor<P> {
    async fn simulate(&self, bid: &BidRequest) -> Result<(), AuctionError> {
        let call = self
            .contract
            .placeBid(bid.amount(), bid.resource_value().to_string());
        let call = match self.sender {
            Some(from) => call.from(from),
            None => call,
        };
        call.call()
            .await
            .map(|_| ())
            .map_err(|e| AuctionError::Simulation(e.to_string()))
    }

    async fn send(&self, bid: &BidRequest) -> Result<TxHash, AuctionError> {
        let call = self
            .contract
            .placeBid(bid.amount(), bid.resource_value().to_string());
        let call = match self.sender {
            Some(from) => call.from(from),
            None => call,
        };
        let pending = call.send().await?;
        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<bool, AuctionError> {
        let receipt = PendingTransactionBuilder::new(self.contract.provider().root().clone(), tx_hash)
            .with_timeout(self.confirm_timeout)
            .get_receipt()
            .await?;
        Ok(receipt.status())
    }
}

/// Places bids and publishes their [`BidStatus`].
pub struct BidService {
    executor: Arc<dyn BidExecutor>,
    status: watch::Sender<BidStatus>,
    last_error: Mutex<Option<String>>,
}

impl BidService {
    pub fn new(executor: Arc<dyn BidExecutor>) -> Self {
        let (status, _) = watch::channel(BidStatus::Idle);
        Self {
            executor,
            status,
            last_error: Mutex::new(None),
        }
    }

    pub fn status(&self) -> BidStatus {
        *self.status.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<BidStatus> {
        self.status.subscribe()
    }

    /// Message of the last simulation or transaction failure.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        self.set_error(None);
        self.status.send_replace(BidStatus::Idle);
    }

    fn set_error(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    fn fail(&self, status: BidStatus, err: AuctionError) -> AuctionError {
        tracing::warn!(%status, error = %err, "Bid failed");
        self.set_error(Some(err.to_string()));
        self.status.send_replace(status);
        err
    }

    /// Dry-run the bid. On success the status returns to `Idle`, ready to send.
    pub async fn simulate(&self, bid: &BidRequest) -> Result<(), AuctionError> {
        self.set_error(None);
        self.status.send_replace(BidStatus::Simulating);
        match self.executor.simulate(bid).await {
            Ok(()) => {
                self.status.send_replace(BidStatus::Idle);
                Ok(())
            }
            Err(AuctionError::Simulation(message)) => Err(self.fail(
                BidStatus::SimulationError,
                AuctionError::Simulation(message),
            )),
            Err(err) => Err(self.fail(
                BidStatus::SimulationError,
                AuctionError::Simulation(err.to_string()),
            )),
        }
    }

    /// Simulate, send and wait for the receipt. A failed simulation stops before
    /// anything is sent.
    pub async fn place_bid(&self, bid: &BidRequest) -> Result<TxHash, AuctionError> {
        self.simulate(bid).await?;

        self.status.send_replace(BidStatus::Prompting);
        let tx_hash = self
            .executor
            .send(bid)
            .await
            .map_err(|e| self.fail(BidStatus::Error, e))?;

        self.status.send_replace(BidStatus::Pending);
        tracing::info!(%tx_hash, amount = %bid.amount(), "Bid sent");

        match self.executor.confirm(tx_hash).await {
            Ok(true) => {
                self.status.send_replace(BidStatus::Success);
                tracing::info!(%tx_hash, "Bid confirmed");
                Ok(tx_hash)
            }
            Ok(false) => Err(self.fail(BidStatus::Error, AuctionError::Reverted(tx_hash))),
            Err(err) => Err(self.fail(BidStatus::Error, err)),
        }
    }
}
