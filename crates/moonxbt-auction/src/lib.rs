//! MoonXBT auction access
//!
//! Reads the auction contract into an [`AuctionData`] snapshot, keeps a local
//! countdown ticking between reads, and places bids (simulate, send, confirm).

pub mod bid;
pub mod contracts;
pub mod countdown;
pub mod data;
pub mod error;
pub mod reader;
pub mod source;
pub mod token;

pub use bid::{BidExecutor, BidRequest, BidService, BidStatus, ContractBidExecutor};
pub use countdown::Countdown;
pub use data::{
    format_time_left, format_token_amount, AuctionData, BidInfo, ResourceValue, TOKEN_SYMBOL,
};
pub use error::AuctionError;
pub use reader::AuctionReader;
pub use source::{AuctionSource, ContractAuctionSource};
pub use token::TokenClient;
