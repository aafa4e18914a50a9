use chrono::Utc;
use futures::future::{try_join_all, BoxFuture, FutureExt, Shared};
use moonxbt_core::models::{
    AssetKey, AssetRequest, AssetState, SignedAsset, DEFAULT_EXPIRES_IN_SECS,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};

use super::{AssetError, AssetSigner};

/// Called with the new state of an entry whenever it changes.
pub type AssetCallback = Arc<dyn Fn(&AssetState) + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<SignedAsset, AssetError>>>;

#[derive(Debug, Clone)]
pub struct AssetManagerConfig {
    /// How long before expiry a URL is re-signed.
    pub refresh_margin: Duration,
    /// Lifetime requested when the caller does not name one, in seconds.
    pub default_expires_in: u64,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        Self {
            refresh_margin: Duration::from_secs(5 * 60),
            default_expires_in: DEFAULT_EXPIRES_IN_SECS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchMode {
    Load,
    Refresh,
}

struct Entry {
    state: AssetState,
    expires_in: u64,
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
    abort: AbortHandle,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<AssetKey, Entry>,
    subscribers: HashMap<AssetKey, Vec<(u64, AssetCallback)>>,
    refresh_timers: HashMap<AssetKey, JoinHandle<()>>,
    in_flight: HashMap<AssetKey, InFlight>,
    next_id: u64,
    disposed: bool,
}

impl CacheState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn callbacks_for(&self, key: &AssetKey) -> Vec<AssetCallback> {
        self.subscribers
            .get(key)
            .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }

    fn cancel_refresh(&mut self, key: &AssetKey) {
        if let Some(timer) = self.refresh_timers.remove(key) {
            timer.abort();
        }
    }
}

struct Inner {
    signer: Arc<dyn AssetSigner>,
    config: AssetManagerConfig,
    cache: Mutex<CacheState>,
}

fn notify(callbacks: &[AssetCallback], state: &AssetState) {
    for callback in callbacks {
        callback(state);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn get(self: &Arc<Self>, request: AssetRequest) -> Result<SignedAsset, AssetError> {
        let key = request.key();
        let (fetch, loading) = {
            let mut cache = self.lock();
            if cache.disposed {
                return Err(AssetError::Disposed);
            }
            if let Some(asset) = cache
                .entries
                .get(&key)
                .and_then(|entry| entry.state.valid_asset(Utc::now()))
            {
                return Ok(asset);
            }
            let existing = cache.in_flight.get(&key).map(|f| f.fetch.clone());
            match existing {
                Some(fetch) => (fetch, None),
                None => {
                    cache.entries.insert(
                        key.clone(),
                        Entry {
                            state: AssetState::loading(),
                            expires_in: request.expires_in,
                        },
                    );
                    let (fetch, start) = self.start_fetch(&mut cache, request, FetchMode::Load);
                    (fetch, Some((cache.callbacks_for(&key), start)))
                }
            }
        };

        if let Some((callbacks, start)) = loading {
            notify(&callbacks, &AssetState::loading());
            let _ = start.send(());
        }
        fetch.await
    }

    /// Spawn the signing call for `request` and register it as the key's in-flight
    /// fetch. The spawned task owns the cache update, so it completes even if every
    /// waiter goes away. Signing waits for the returned sender to fire (or drop),
    /// so a loading notification sent before that always precedes the result.
    fn start_fetch(
        self: &Arc<Self>,
        cache: &mut CacheState,
        request: AssetRequest,
        mode: FetchMode,
    ) -> (SharedFetch, oneshot::Sender<()>) {
        let id = cache.next_id();
        let key = request.key();
        let inner = Arc::clone(self);
        let (start, started) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let _ = started.await;
            inner.run_fetch(id, request, mode).await
        });
        let abort = handle.abort_handle();
        let fetch = async move { handle.await.unwrap_or(Err(AssetError::Aborted)) }
            .boxed()
            .shared();
        cache.in_flight.insert(
            key,
            InFlight {
                id,
                fetch: fetch.clone(),
                abort,
            },
        );
        (fetch, start)
    }

    async fn run_fetch(
        self: Arc<Self>,
        id: u64,
        request: AssetRequest,
        mode: FetchMode,
    ) -> Result<SignedAsset, AssetError> {
        let key = request.key();
        let result = match self.signer.sign(&request).await {
            Ok(asset) if asset.is_valid_at(Utc::now()) => Ok(asset),
            Ok(_) => Err(AssetError::AlreadyExpired(key.to_string())),
            Err(err) => Err(err),
        };

        let (callbacks, state) = {
            let mut cache = self.lock();
            let current = cache.in_flight.get(&key).is_some_and(|f| f.id == id);
            if !current || cache.disposed {
                // Cleared or superseded while the request was out.
                tracing::debug!(asset = %key, "Discarding signed URL for stale fetch");
                return result;
            }
            cache.in_flight.remove(&key);

            let state = match &result {
                Ok(asset) => {
                    tracing::debug!(asset = %key, expires_at = %asset.expires_at, "Signed URL cached");
                    self.schedule_refresh(&mut cache, &key, asset, mode);
                    AssetState::ready(asset)
                }
                Err(err) => {
                    tracing::warn!(asset = %key, error = %err, ?mode, "Failed to get signed URL");
                    match (mode, cache.entries.get(&key)) {
                        (FetchMode::Refresh, Some(previous)) => AssetState {
                            is_loading: false,
                            error: Some(err.to_string()),
                            ..previous.state.clone()
                        },
                        _ => AssetState::failed(err.to_string()),
                    }
                }
            };
            cache.entries.insert(
                key.clone(),
                Entry {
                    state: state.clone(),
                    expires_in: request.expires_in,
                },
            );
            (cache.callbacks_for(&key), state)
        };

        notify(&callbacks, &state);
        result
    }

    /// Time until the URL enters the refresh window; zero once it is inside.
    fn refresh_delay(&self, asset: &SignedAsset) -> Duration {
        let remaining = (asset.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        remaining.saturating_sub(self.config.refresh_margin)
    }

    fn schedule_refresh(
        self: &Arc<Self>,
        cache: &mut CacheState,
        key: &AssetKey,
        asset: &SignedAsset,
        mode: FetchMode,
    ) {
        cache.cancel_refresh(key);
        let delay = self.refresh_delay(asset);
        if delay.is_zero() && mode == FetchMode::Refresh {
            // A re-signed URL that is still inside the window would loop. The next
            // get after expiry fetches it again.
            tracing::debug!(asset = %key, "Signed URL lives shorter than the refresh margin");
            return;
        }
        let weak: Weak<Inner> = Arc::downgrade(self);
        let timer_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.refresh(&timer_key);
            }
        });
        cache.refresh_timers.insert(key.clone(), timer);
    }

    fn refresh(self: &Arc<Self>, key: &AssetKey) {
        let mut cache = self.lock();
        // Dropping our own handle detaches it; the task is about to finish anyway.
        cache.refresh_timers.remove(key);
        if cache.disposed || cache.in_flight.contains_key(key) {
            return;
        }
        let Some(entry) = cache.entries.get(key) else {
            return;
        };
        let request = AssetRequest {
            bucket_name: key.bucket_name.clone(),
            file_path: key.file_path.clone(),
            expires_in: entry.expires_in,
        };
        tracing::debug!(asset = %key, "Refreshing signed URL");
        let (_, start) = self.start_fetch(&mut cache, request, FetchMode::Refresh);
        let _ = start.send(());
    }

    fn unsubscribe(&self, key: &AssetKey, id: u64) {
        let mut cache = self.lock();
        if let Some(subs) = cache.subscribers.get_mut(key) {
            subs.retain(|(sub_id, _)| *sub_id != id);
            if subs.is_empty() {
                cache.subscribers.remove(key);
            }
        }
    }
}

/// Keyed cache of signed asset URLs.
///
/// One instance is shared by everything that renders assets (wrap it in an `Arc`).
/// Dropping it, or calling [`AssetManager::dispose`], stops every refresh timer.
pub struct AssetManager {
    inner: Arc<Inner>,
}

impl AssetManager {
    pub fn new(signer: Arc<dyn AssetSigner>, config: AssetManagerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                signer,
                config,
                cache: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn with_defaults(signer: Arc<dyn AssetSigner>) -> Self {
        Self::new(signer, AssetManagerConfig::default())
    }

    /// Signed URL for `bucket`/`path`. Served from cache while valid; otherwise
    /// fetched once no matter how many callers ask at the same time.
    pub async fn get_asset(
        &self,
        bucket_name: &str,
        file_path: &str,
        expires_in: Option<u64>,
    ) -> Result<String, AssetError> {
        let request = AssetRequest::new(bucket_name, file_path)
            .with_expires_in(expires_in.unwrap_or(self.inner.config.default_expires_in));
        self.fetch(request).await.map(|asset| asset.signed_url)
    }

    /// Like [`AssetManager::get_asset`], returning the expiry with the URL.
    pub async fn fetch(&self, request: AssetRequest) -> Result<SignedAsset, AssetError> {
        self.inner.get(request).await
    }

    /// Fetch several assets concurrently; fails if any of them fails.
    pub async fn get_assets(&self, requests: Vec<AssetRequest>) -> Result<Vec<String>, AssetError> {
        let assets = try_join_all(requests.into_iter().map(|request| self.inner.get(request))).await?;
        Ok(assets.into_iter().map(|asset| asset.signed_url).collect())
    }

    /// Current state of an entry; the empty state when nothing is cached.
    pub fn get_asset_state(&self, bucket_name: &str, file_path: &str) -> AssetState {
        let key = AssetKey::new(bucket_name, file_path);
        self.inner
            .lock()
            .entries
            .get(&key)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    /// Register `callback` for state changes of one key. The callback runs on the
    /// task that caused the change and must not block.
    pub fn subscribe(
        &self,
        bucket_name: &str,
        file_path: &str,
        callback: impl Fn(&AssetState) + Send + Sync + 'static,
    ) -> Subscription {
        let key = AssetKey::new(bucket_name, file_path);
        let mut cache = self.inner.lock();
        let id = cache.next_id();
        cache
            .subscribers
            .entry(key.clone())
            .or_default()
            .push((id, Arc::new(callback)));
        Subscription {
            inner: Arc::downgrade(&self.inner),
            key,
            id,
        }
    }

    /// Warm the cache in the background. Failures only land in the entry state.
    pub fn preload_asset(&self, request: AssetRequest) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let key = request.key();
            if let Err(err) = inner.get(request).await {
                tracing::debug!(asset = %key, error = %err, "Preload failed");
            }
        })
    }

    /// Drop one entry, or every entry when `key` is `None`, together with its
    /// refresh timer. A fetch already out for a cleared key still answers its
    /// waiters but no longer writes to the cache. Subscribers stay registered.
    pub fn clear_cache(&self, key: Option<&AssetKey>) {
        let mut cache = self.inner.lock();
        match key {
            Some(key) => {
                cache.entries.remove(key);
                cache.cancel_refresh(key);
                cache.in_flight.remove(key);
            }
            None => {
                cache.entries.clear();
                for (_, timer) in cache.refresh_timers.drain() {
                    timer.abort();
                }
                cache.in_flight.clear();
            }
        }
    }

    /// Stop all timers and fetches and forget every entry and subscriber. Later
    /// requests fail with [`AssetError::Disposed`].
    pub fn dispose(&self) {
        let mut cache = self.inner.lock();
        if cache.disposed {
            return;
        }
        cache.disposed = true;
        for (_, timer) in cache.refresh_timers.drain() {
            timer.abort();
        }
        for (_, in_flight) in cache.in_flight.drain() {
            in_flight.abort.abort();
        }
        cache.entries.clear();
        cache.subscribers.clear();
        tracing::debug!("Asset manager disposed");
    }
}

impl Drop for AssetManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Keeps a subscriber registered; dropping it unsubscribes.
pub struct Subscription {
    inner: Weak<Inner>,
    key: AssetKey,
    id: u64,
}

impl Subscription {
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.unsubscribe(&self.key, self.id);
        }
    }
}
