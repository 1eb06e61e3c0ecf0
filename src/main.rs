//! Memocache demo
//!
//! Memoizes a slow synchronous function and an async lookup, then shows
//! hits, bypass refreshes and TTL expiry along with the collected stats.

use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memocache::binder::BoundMethod;
use memocache::{AsyncMemoized, Memoized, MethodTable, Store, StoreOptions};

/// Entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load store options from environment variables
/// 3. Memoize a sync function and show a hit and a bypass refresh
/// 4. Memoize an async function and let its entry expire
/// 5. Call bound methods through a method table
/// 6. Print stats and stop the stores
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memocache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting memocache demo");

    let mut options = StoreOptions::from_env()?;
    if options.max_age.is_none() {
        options.max_age = Some(Duration::from_secs(1));
    }
    info!(
        "Options loaded: max_age={:?}, max_size={:?}",
        options.max_age, options.max_size
    );

    // == Sync ==
    let square = Memoized::new(
        |(x,): (u64,)| {
            std::thread::sleep(Duration::from_millis(200));
            x * x
        },
        options,
    )
    .with_resolver(|(x,)| format!("square:{x}"));

    info!("square(12) = {}", square.call((12,)));
    info!("square(12) = {} (cached)", square.call((12,)));
    info!("square(12) = {} (direct)", square.direct((12,)));

    // == Async ==
    let profile = AsyncMemoized::fallible(
        |(user,): (String,)| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if user.is_empty() {
                anyhow::bail!("empty user name");
            }
            Ok(format!("profile of {user}"))
        },
        options,
    );

    info!("{}", profile.try_call(("ada".to_string(),)).await?);
    info!("{}", profile.try_call(("ada".to_string(),)).await?);
    if let Err(err) = profile.try_call((String::new(),)).await {
        info!("lookup failed and was not cached: {err}");
    }

    if let Some(max_age) = options.ttl() {
        tokio::time::sleep(max_age + Duration::from_millis(100)).await;
        info!(
            "after {:?}: cached profile present = {}",
            max_age,
            profile.cache().has(r#"["ada"]"#)
        );
    }

    // == Method Table ==
    let mut methods: MethodTable<BoundMethod<(String,), usize>> = MethodTable::new();
    methods.bind("length", options, |(text,): (String,)| text.chars().count());
    info!("length = {}", methods.call("length", ("memo".to_string(),))?);
    info!("_length = {}", methods.call("_length", ("memo".to_string(),))?);

    // == Stats ==
    info!("square stats: {}", serde_json::to_string(&square.stats())?);
    info!("profile stats: {}", serde_json::to_string(&profile.stats())?);

    square.cache().stop();
    profile.cache().stop();
    info!("Demo complete");

    Ok(())
}
