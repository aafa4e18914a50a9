//! MoonXBT client-side services
//!
//! - [`assets`]: keyed cache of signed asset URLs with single-flight fetching,
//!   background refresh before expiry and per-key subscribers.
//! - [`async_request`]: submits work that may finish later and polls its ticket
//!   until a terminal status or a wall-clock budget runs out.

pub mod assets;
pub mod async_request;

pub use assets::{
    AssetError, AssetManager, AssetManagerConfig, AssetSigner, HttpAssetSigner, Subscription,
};
pub use async_request::{
    AsyncRequestPoller, HttpTaskBackend, PollError, PollOptions, TaskBackend,
};
