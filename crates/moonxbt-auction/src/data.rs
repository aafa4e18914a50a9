use alloy::primitives::{utils::format_ether, Address, U256};
use serde::{Deserialize, Serialize};

/// Symbol of the token bids are paid in.
pub const TOKEN_SYMBOL: &str = "A0X";

/// What a bid points at. Stored on-chain as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceValue {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl ResourceValue {
    /// Parse the on-chain string. Gives `None` for anything but a JSON object
    /// with a string `url` and, when present, a string `metadata`; valid JSON of
    /// another shape is treated like a malformed value.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(error = %err, "Failed to parse resource value");
                None
            }
        }
    }
}

/// A bid as returned by `getBid` and `getLastAuctionWinner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidInfo {
    pub bidder: Address,
    pub amount: U256,
    pub resource_value: String,
}

/// Read model of the auction. Fields are `None` until read, and again after a
/// failed read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionData {
    pub current_auction_id: Option<U256>,
    pub time_remaining: Option<U256>,
    pub current_bidder: Option<Address>,
    pub current_bid_amount: Option<U256>,
    pub current_resource_value: Option<String>,
    pub last_auction_winner: Option<Address>,
    pub last_auction_amount: Option<U256>,
    pub last_auction_resource_value: Option<String>,
    pub is_loading: bool,
}

impl AuctionData {
    pub fn formatted_time_left(&self) -> String {
        format_time_left(self.time_remaining.map(|t| t.saturating_to::<u64>()).unwrap_or(0))
    }

    /// `"<amount> A0X"`, or `"0 A0X"` when there is no bid.
    pub fn formatted_bid_amount(&self) -> String {
        match self.current_bid_amount {
            Some(amount) if !amount.is_zero() => {
                format!("{} {}", format_token_amount(amount), TOKEN_SYMBOL)
            }
            _ => format!("0 {}", TOKEN_SYMBOL),
        }
    }

    pub fn parsed_resource_value(&self) -> Option<ResourceValue> {
        self.current_resource_value
            .as_deref()
            .and_then(ResourceValue::parse)
    }

    pub(crate) fn set_current_bid(&mut self, bid: Option<BidInfo>) {
        self.current_bidder = bid.as_ref().map(|b| b.bidder);
        self.current_bid_amount = bid.as_ref().map(|b| b.amount);
        self.current_resource_value = bid.map(|b| b.resource_value);
    }

    pub(crate) fn set_last_winner(&mut self, bid: Option<BidInfo>) {
        self.last_auction_winner = bid.as_ref().map(|b| b.bidder);
        self.last_auction_amount = bid.as_ref().map(|b| b.amount);
        self.last_auction_resource_value = bid.map(|b| b.resource_value);
    }
}

/// `HH:MM:SS`; hours are not capped at 99.
pub fn format_time_left(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Token amount (18 decimals) without trailing zeros: `1.5`, `2`, `0.000001`.
pub fn format_token_amount(amount: U256) -> String {
    let formatted = format_ether(amount);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}
