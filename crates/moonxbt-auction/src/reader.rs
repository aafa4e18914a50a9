use std::sync::Arc;
use tokio::sync::watch;

use crate::countdown::Countdown;
use crate::data::AuctionData;
use crate::error::AuctionError;
use crate::source::AuctionSource;

fn read_or_warn<T>(what: &str, result: Result<T, AuctionError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(read = what, error = %err, "Auction read failed");
            None
        }
    }
}

/// Auction read model with a local countdown.
///
/// Never refreshes on its own: call [`AuctionReader::refetch_auction_data`] or
/// [`AuctionReader::refetch_bid`] to resync, for example after placing a bid.
pub struct AuctionReader {
    source: Arc<dyn AuctionSource>,
    data: watch::Sender<AuctionData>,
    countdown: Countdown,
}

impl AuctionReader {
    pub fn new(source: Arc<dyn AuctionSource>) -> Self {
        let (data, _) = watch::channel(AuctionData::default());
        Self {
            source,
            data,
            countdown: Countdown::new(),
        }
    }

    pub fn data(&self) -> AuctionData {
        self.data.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AuctionData> {
        self.data.subscribe()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Read auction id, remaining time and last winner together, then the
    /// current bid once the id is known.
    pub async fn refetch_auction_data(&self) -> AuctionData {
        self.data.send_modify(|data| data.is_loading = true);

        let (auction_id, time_remaining, last_winner) = tokio::join!(
            self.source.current_auction_id(),
            self.source.time_remaining(),
            self.source.last_auction_winner(),
        );
        let auction_id = read_or_warn("currentAuctionId", auction_id);
        let time_remaining = read_or_warn("getTimeRemaining", time_remaining);
        let last_winner = read_or_warn("getLastAuctionWinner", last_winner);

        if let Some(seconds) = time_remaining {
            self.countdown.seed(seconds.saturating_to::<u64>());
        }
        self.data.send_modify(|data| {
            data.current_auction_id = auction_id;
            data.time_remaining = time_remaining;
            data.set_last_winner(last_winner);
        });

        if auction_id.is_some() {
            self.refetch_bid().await
        } else {
            self.data.send_modify(|data| {
                data.set_current_bid(None);
                data.is_loading = false;
            });
            self.data()
        }
    }

    /// Re-read the bid of the known auction id. No-op before the id is known.
    pub async fn refetch_bid(&self) -> AuctionData {
        let auction_id = self.data.borrow().current_auction_id;
        let Some(auction_id) = auction_id else {
            return self.data();
        };

        self.data.send_modify(|data| data.is_loading = true);
        let bid = read_or_warn("getBid", self.source.get_bid(auction_id).await);
        self.data.send_modify(|data| {
            data.set_current_bid(bid);
            data.is_loading = false;
        });

        let data = self.data();
        tracing::debug!(
            auction_id = %auction_id,
            bid = %data.formatted_bid_amount(),
            time_left = %data.formatted_time_left(),
            "Auction data refreshed"
        );
        data
    }
}
