//! Data models shared between the proxy, the client and the services,
//! organized by feature area.

mod airdrop;
mod asset;
mod async_request;
mod video;

pub use airdrop::*;
pub use asset::*;
pub use async_request::*;
pub use video::*;
