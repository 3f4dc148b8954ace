//! Real-time viewing-session simulations against an in-memory store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use glimpse_core::{
    shared, ConversationId, CountdownDriver, ExpirationEngine, HoldController, MediaKind,
    MediaRef, MemoryStore, MessageKey, MessageStore, ProtectedMediaPolicy, SharedEngine,
    TapController, ViewerConfig, ViewerEvent, ViewingMode,
};

#[derive(Subcommand)]
pub enum SimulateAction {
    /// Tap-mode session: open, watch the countdown, close or expire
    Tap {
        /// Countdown seconds; 0 means view-once
        #[arg(long, default_value = "5")]
        timer: u32,
        /// Close the viewer after this many seconds instead of waiting
        /// for expiry (default for view-once: 2)
        #[arg(long)]
        close_after: Option<u64>,
    },
    /// Hold-mode session: one hold/release cycle, then a re-press
    Hold {
        /// Countdown seconds; 0 means view-once
        #[arg(long, default_value = "0")]
        timer: u32,
        /// How long the press is sustained, in milliseconds
        #[arg(long, default_value = "800")]
        hold_ms: u64,
    },
}

pub fn run(action: SimulateAction) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    match action {
        SimulateAction::Tap { timer, close_after } => {
            runtime.block_on(simulate_tap(timer, close_after))
        }
        SimulateAction::Hold { timer, hold_ms } => runtime.block_on(simulate_hold(timer, hold_ms)),
    }
}

fn seed(
    timer: u32,
    mode: ViewingMode,
) -> (Arc<MemoryStore>, SharedEngine, MessageKey, ViewerConfig) {
    let config = ViewerConfig::load_or_default();
    let store = Arc::new(MemoryStore::new());
    let key = store.insert(
        ConversationId::generate(),
        ProtectedMediaPolicy {
            timer_seconds: timer,
            viewing_mode: mode,
            media_kind: MediaKind::Photo,
            media_location: MediaRef("media://simulated".into()),
        },
    );
    let engine = shared(ExpirationEngine::with_config(store.clone(), &config));
    (store, engine, key, config)
}

fn print_event(event: &ViewerEvent) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn print_record(
    store: &MemoryStore,
    key: &MessageKey,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = store.get(key)?;
    println!("{}", serde_json::to_string(&record.state)?);
    Ok(())
}

async fn simulate_tap(
    timer: u32,
    close_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (store, engine, key, config) = seed(timer, ViewingMode::Tap);
    // A view-once session has no countdown to end it; close it ourselves.
    let close_after = close_after.or((timer == 0).then_some(2));

    let controller = Arc::new(Mutex::new(TapController::new(engine)));
    {
        let mut viewer = controller.lock().unwrap();
        let now = Utc::now();
        if let Some(event) = viewer.open(key, now)? {
            print_event(&event);
        }
        if let Some(event) = viewer.media_ready(now) {
            print_event(&event);
        }
    }

    let (_driver, mut events) = CountdownDriver::spawn(controller.clone(), config.tick_interval());
    if let Some(secs) = close_after {
        let closer = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            if let Some(event) = closer.lock().unwrap().close(Utc::now()) {
                print_event(&event);
            }
        });
    }
    while let Some(event) = events.recv().await {
        print_event(&event);
    }

    print_record(&store, &key)
}

async fn simulate_hold(timer: u32, hold_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
    let (store, engine, key, config) = seed(timer, ViewingMode::Hold);
    let controller = Arc::new(Mutex::new(HoldController::new(engine)));

    {
        let mut viewer = controller.lock().unwrap();
        let now = Utc::now();
        if let Some(event) = viewer.press(key, now)? {
            print_event(&event);
        }
        if let Some(event) = viewer.media_ready(now) {
            print_event(&event);
        }
    }

    let (driver, mut events) = CountdownDriver::spawn(controller.clone(), config.tick_interval());
    tokio::time::sleep(Duration::from_millis(hold_ms)).await;
    if let Some(event) = controller.lock().unwrap().release(Utc::now()) {
        print_event(&event);
    }
    while let Some(event) = events.recv().await {
        print_event(&event);
    }
    drop(driver);

    // Re-press: rejected for consumed view-once media, resumed for timed.
    if let Some(event) = controller.lock().unwrap().press(key, Utc::now())? {
        print_event(&event);
    }
    if controller.lock().unwrap().key().is_some() {
        let now = Utc::now();
        if let Some(event) = controller.lock().unwrap().media_ready(now) {
            print_event(&event);
        }
        if let Some(event) = controller.lock().unwrap().release(now) {
            print_event(&event);
        }
    }

    print_record(&store, &key)
}
