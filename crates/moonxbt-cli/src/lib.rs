use alloy::primitives::Address;
use moonxbt_auction::{format_token_amount, AuctionData, TOKEN_SYMBOL};
use serde::Serialize;
use serde_json::{json, Value};

/// Pretty-print a response on stdout.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{}", out);
    Ok(())
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn address_or_none(address: Option<Address>) -> Value {
    match address {
        Some(address) if address != Address::ZERO => json!(address.to_checksum(None)),
        _ => Value::Null,
    }
}

/// Printable view of an auction snapshot. Unread fields are `null`.
pub fn auction_summary(data: &AuctionData) -> Value {
    let resource = data.parsed_resource_value();
    json!({
        "auctionId": data.current_auction_id.map(|id| id.to_string()),
        "timeLeft": data.formatted_time_left(),
        "currentBid": {
            "bidder": address_or_none(data.current_bidder),
            "amount": data.formatted_bid_amount(),
            "url": resource.as_ref().map(|r| r.url.clone()),
            "metadata": resource.and_then(|r| r.metadata),
        },
        "lastAuction": {
            "winner": address_or_none(data.last_auction_winner),
            "amount": data
                .last_auction_amount
                .map(|amount| format!("{} {}", format_token_amount(amount), TOKEN_SYMBOL)),
        },
    })
}
