//! MoonXBT CLI: command-line client for the proxy routes and the auction contract.
//!
//! Proxy routes are reached through MOONXBT_API_URL (or API_URL). The auction
//! commands read RPC_URL and AUCTION_CONTRACT_ADDRESS; `bid` also needs PRIVATE_KEY.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use clap::{Parser, Subcommand};
use moonxbt_api_client::ApiClient;
use moonxbt_auction::{
    format_token_amount, AuctionReader, BidRequest, BidService, ContractAuctionSource,
    ContractBidExecutor, TokenClient, TOKEN_SYMBOL,
};
use moonxbt_cli::{auction_summary, print_json, truncate_string};
use moonxbt_core::models::{
    AssetRequest, AsyncTicket, CreateVideoRequest, ParticipantQuery, RequestStatus,
};
use moonxbt_infra::init_cli_tracing;
use moonxbt_services::{
    AssetManager, AsyncRequestPoller, HttpAssetSigner, HttpTaskBackend, PollOptions,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
const VIDEO_STATUS_PATH: &str = "/api/check-video-status?taskId={ticket}";

#[derive(Parser)]
#[command(name = "moonxbt", about = "MoonXBT CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get a signed URL for a stored asset
    Asset {
        /// Bucket holding the file
        bucket: String,
        /// Path of the file inside the bucket
        path: String,
        /// Lifetime of the URL in seconds
        #[arg(long, default_value_t = 3600)]
        expires_in: u64,
        /// Keep running and print the URL each time it is refreshed
        #[arg(long)]
        watch: bool,
    },
    /// Show the current auction and count down to its end
    Auction {
        #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
        rpc_url: Url,
        #[arg(long, env = "AUCTION_CONTRACT_ADDRESS")]
        contract: Address,
        /// Print the snapshot and exit
        #[arg(long)]
        once: bool,
    },
    /// Bid on the current auction
    Bid {
        /// Amount in whole tokens, e.g. 1.5
        amount: String,
        /// URL the bid points at
        url: String,
        #[arg(long)]
        metadata: Option<String>,
        #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
        rpc_url: Url,
        #[arg(long, env = "AUCTION_CONTRACT_ADDRESS")]
        contract: Address,
        /// Bid token; when set, the auction is approved for the amount first
        #[arg(long, env = "TOKEN_CONTRACT_ADDRESS")]
        token: Option<Address>,
        #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
        private_key: PrivateKeySigner,
    },
    /// Generate a promotional video and wait for the result
    CreateVideo {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        website_url: String,
        #[arg(long)]
        doc_url: Option<String>,
        /// Seconds between status checks
        #[arg(long, default_value_t = 2)]
        poll_interval: u64,
        /// Give up after this many seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,
        /// Print the task id and exit without polling
        #[arg(long)]
        no_wait: bool,
    },
    /// List videos generated for an influencer
    Videos {
        influencer_id: String,
    },
    /// List airdrop participants
    Participants {
        #[arg(long)]
        fid: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        start_after: Option<String>,
        /// Fetch every page
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_cli_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Asset {
            bucket,
            path,
            expires_in,
            watch,
        } => asset(bucket, path, expires_in, watch).await?,
        Commands::Auction {
            rpc_url,
            contract,
            once,
        } => auction(rpc_url, contract, once).await?,
        Commands::Bid {
            amount,
            url,
            metadata,
            rpc_url,
            contract,
            token,
            private_key,
        } => {
            let bid = BidRequest::new(&amount, &url, metadata.as_deref())?;
            place_bid(bid, rpc_url, contract, token, private_key).await?
        }
        Commands::CreateVideo {
            name,
            description,
            website_url,
            doc_url,
            poll_interval,
            timeout,
            no_wait,
        } => {
            let request = CreateVideoRequest {
                name,
                description,
                website_url,
                website_doc_url: doc_url,
            };
            let options = PollOptions::default()
                .with_poll_interval(Duration::from_secs(poll_interval.max(1)))
                .with_max_polling_time(Duration::from_secs(timeout));
            create_video(request, options, no_wait).await?
        }
        Commands::Videos { influencer_id } => {
            let response = api_client()?.get_videos(&influencer_id).await?;
            print_json(&response)?;
        }
        Commands::Participants {
            fid,
            username,
            task,
            status,
            platform,
            limit,
            start_after,
            all,
        } => {
            let query = ParticipantQuery {
                fid,
                username,
                task,
                status,
                platform,
                limit: limit.map(|l| l.to_string()),
                start_after,
                get_all: Some(all.to_string()),
            };
            let response = api_client()?.airdrop_participants(&query).await?;
            print_json(&response)?;
        }
    }

    Ok(())
}

fn api_client() -> anyhow::Result<ApiClient> {
    ApiClient::from_env().context("Failed to create API client. Set MOONXBT_API_URL (or API_URL)")
}

async fn asset(bucket: String, path: String, expires_in: u64, watch: bool) -> anyhow::Result<()> {
    let manager = AssetManager::with_defaults(Arc::new(HttpAssetSigner::new(api_client()?)));
    let request = AssetRequest::new(bucket.clone(), path.clone()).with_expires_in(expires_in);

    let asset = manager.fetch(request).await?;
    print_json(&asset)?;
    if !watch {
        return Ok(());
    }

    let _subscription = manager.subscribe(&bucket, &path, |state| {
        if let Some(error) = &state.error {
            tracing::warn!(%error, "Refresh failed");
        } else if let (Some(url), Some(expires_at)) = (&state.signed_url, state.expires_at) {
            println!("{}  (expires {})", url, expires_at.to_rfc3339());
        }
    });
    tracing::info!("Watching for refreshes, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    manager.dispose();
    Ok(())
}

async fn auction(rpc_url: Url, contract: Address, once: bool) -> anyhow::Result<()> {
    let provider = ProviderBuilder::new().connect_http(rpc_url);
    let reader = AuctionReader::new(Arc::new(ContractAuctionSource::new(contract, provider)));

    let data = reader.refetch_auction_data().await;
    print_json(&auction_summary(&data))?;

    let seconds_left = data
        .time_remaining
        .map(|t| t.saturating_to::<u64>())
        .unwrap_or(0);
    if once || seconds_left == 0 {
        return Ok(());
    }

    if let Some(resource) = data.parsed_resource_value() {
        println!("Leading: {}", truncate_string(&resource.url, 60));
    }

    let mut ticks = reader.countdown().subscribe();
    loop {
        tokio::select! {
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
                let left = ticks.borrow_and_update().clone();
                println!("{}", left);
                if left == moonxbt_auction::format_time_left(0) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    reader.countdown().stop();
    Ok(())
}

async fn place_bid(
    bid: BidRequest,
    rpc_url: Url,
    contract: Address,
    token: Option<Address>,
    signer: PrivateKeySigner,
) -> anyhow::Result<()> {
    let sender = signer.address();
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url);

    if let Some(token) = token {
        let token = TokenClient::new(token, provider.clone());
        let balance = token.balance_of(sender).await?;
        if balance < bid.amount() {
            anyhow::bail!(
                "Insufficient balance: have {} {}, bid needs {} {}",
                format_token_amount(balance),
                TOKEN_SYMBOL,
                format_token_amount(bid.amount()),
                TOKEN_SYMBOL
            );
        }
        let approval = token
            .ensure_allowance(sender, contract, bid.amount())
            .await?;
        if let Some(tx_hash) = approval {
            tracing::info!(%tx_hash, "Token approval confirmed");
        }
    }

    let executor = ContractBidExecutor::new(contract, provider).with_sender(sender);
    let service = BidService::new(Arc::new(executor));

    let mut status = service.watch();
    let progress = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            tracing::info!(status = %current, "Bid status");
        }
    });

    let result = service.place_bid(&bid).await;
    drop(service);
    let _ = progress.await;

    let tx_hash = result?;
    print_json(&serde_json::json!({
        "status": "success",
        "transactionHash": tx_hash.to_string(),
    }))
}

async fn create_video(
    request: CreateVideoRequest,
    options: PollOptions,
    no_wait: bool,
) -> anyhow::Result<()> {
    let client = api_client()?;
    let created = client.create_video(&request.normalized()).await?;
    print_json(&created)?;
    if no_wait {
        return Ok(());
    }

    let backend = HttpTaskBackend::new(client).with_status_path(VIDEO_STATUS_PATH);
    let poller = AsyncRequestPoller::new(Arc::new(backend), options);

    let mut updates = poller.watch();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            tracing::info!(status = %state.status, progress = state.progress, "Video task");
            if state.status.is_terminal() {
                break;
            }
        }
    });

    poller.track_ticket(AsyncTicket {
        ticket_id: created.task_id,
        status: RequestStatus::Pending,
        estimated_time: None,
    });
    let state = poller.wait_for_terminal().await;
    progress.abort();

    match state.status {
        RequestStatus::Completed => print_json(&state.result),
        _ => Err(anyhow::anyhow!(
            "Video generation failed: {}",
            state.error.as_deref().unwrap_or("unknown error")
        )),
    }
}
