//! Route handlers. Each one validates its input, forwards to a backend and
//! maps the answer onto the proxy's response shape.

pub mod airdrop;
pub mod assets;
pub mod health;
pub mod video;
