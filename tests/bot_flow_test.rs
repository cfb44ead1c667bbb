//! Bot controller integration tests
//! Run with: cargo test --test bot_flow_test

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;

use floorbot::application::errors::{LookupError, SendError};
use floorbot::application::messaging::{ChannelThrottle, CommandParser};
use floorbot::application::services::BotController;
use floorbot::domain::entities::{FloorPriceQuote, MessageEvent, ReadyInfo};
use floorbot::domain::traits::{EventHandler, FloorPriceSource, ReplySink};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

type QuoteFn = Box<dyn Fn() -> Result<FloorPriceQuote, LookupError> + Send + Sync>;

/// Lookup stub counting calls and answering from a fixed closure.
struct StubSource {
    calls: AtomicUsize,
    respond: QuoteFn,
}

impl StubSource {
    fn new(
        respond: impl Fn() -> Result<FloorPriceQuote, LookupError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            respond: Box::new(respond),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FloorPriceSource for StubSource {
    async fn fetch_floor_price(&self, _slug: &str) -> Result<FloorPriceQuote, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)()
    }
}

/// Reply sink recording everything the controller sends.
#[derive(Default)]
struct CapturingSink {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingSink {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl ReplySink for CapturingSink {
    fn send_reply(&self, channel_id: &str, text: &str) -> Result<(), SendError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

fn controller(source: Arc<StubSource>, sink: Arc<CapturingSink>) -> BotController {
    BotController::new(
        CommandParser::new("!floor"),
        source,
        sink,
        ChannelThrottle::new(5, 30),
    )
}

#[tokio::test]
async fn replies_with_quote_for_recognized_command() {
    ensure_init();
    let source = StubSource::new(|| Ok(FloorPriceQuote::new("boredapeyachtclub", 80.5, "ETH")));
    let sink = Arc::new(CapturingSink::default());
    let bot = controller(source.clone(), sink.clone());

    bot.on_message(MessageEvent::new(
        "m1",
        "C1",
        "U1",
        "!floor boredapeyachtclub",
    ))
    .await;

    let sent = sink.sent();
    assert_eq!(sent.len(), 1, "expected exactly one reply");
    let (channel, text) = &sent[0];
    assert_eq!(channel, "C1");
    assert!(text.contains("80.5"), "reply should carry the price: {text}");
    assert!(text.contains("ETH"), "reply should carry the currency: {text}");
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn unknown_collection_gets_a_not_found_reply() {
    ensure_init();
    let source = StubSource::new(|| Err(LookupError::NotFound));
    let sink = Arc::new(CapturingSink::default());
    let bot = controller(source, sink.clone());

    bot.on_message(MessageEvent::new(
        "m1",
        "C1",
        "U1",
        "!floor nonexistent-collection",
    ))
    .await;

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("not found"));
}

#[tokio::test]
async fn upstream_failure_gets_a_try_again_reply() {
    ensure_init();
    let source = StubSource::new(|| Err(LookupError::Upstream("connect timeout".to_string())));
    let sink = Arc::new(CapturingSink::default());
    let bot = controller(source, sink.clone());

    bot.on_message(MessageEvent::new("m1", "C1", "U1", "!floor doodles"))
        .await;

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("try again later"));
}

#[tokio::test]
async fn rate_limit_gets_a_try_again_reply() {
    ensure_init();
    let source = StubSource::new(|| {
        Err(LookupError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        })
    });
    let sink = Arc::new(CapturingSink::default());
    let bot = controller(source, sink.clone());

    bot.on_message(MessageEvent::new("m1", "C1", "U1", "!floor doodles"))
        .await;

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("try again later"));
}

#[tokio::test]
async fn non_command_text_is_ignored() {
    ensure_init();
    let source = StubSource::new(|| Ok(FloorPriceQuote::new("x", 1.0, "ETH")));
    let sink = Arc::new(CapturingSink::default());
    let bot = controller(source.clone(), sink.clone());

    bot.on_message(MessageEvent::new("m1", "C1", "U1", "gm frens"))
        .await;
    bot.on_message(MessageEvent::new("m2", "C1", "U1", "floor doodles"))
        .await;

    assert!(sink.sent().is_empty());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn bare_trigger_gets_a_usage_reply() {
    ensure_init();
    let source = StubSource::new(|| Ok(FloorPriceQuote::new("x", 1.0, "ETH")));
    let sink = Arc::new(CapturingSink::default());
    let bot = controller(source.clone(), sink.clone());

    bot.on_message(MessageEvent::new("m1", "C1", "U1", "!floor"))
        .await;

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Usage"));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn own_messages_are_ignored_after_ready() {
    ensure_init();
    let source = StubSource::new(|| Ok(FloorPriceQuote::new("x", 1.0, "ETH")));
    let sink = Arc::new(CapturingSink::default());
    let bot = controller(source.clone(), sink.clone());

    bot.on_ready(ReadyInfo {
        session_id: "sess".to_string(),
        bot_user_id: "BOT".to_string(),
    })
    .await;

    bot.on_message(MessageEvent::new("m1", "C1", "BOT", "!floor doodles"))
        .await;
    assert!(sink.sent().is_empty());
    assert_eq!(source.calls(), 0);

    // Other authors still get answered.
    bot.on_message(MessageEvent::new("m2", "C1", "U1", "!floor doodles"))
        .await;
    assert_eq!(sink.sent().len(), 1);
}

#[tokio::test]
async fn channel_cooldown_caps_lookups() {
    ensure_init();
    let source = StubSource::new(|| Ok(FloorPriceQuote::new("doodles", 3.2, "ETH")));
    let sink = Arc::new(CapturingSink::default());
    let bot = BotController::new(
        CommandParser::new("!floor"),
        source.clone(),
        sink.clone(),
        ChannelThrottle::new(1, 30),
    );

    bot.on_message(MessageEvent::new("m1", "C1", "U1", "!floor doodles"))
        .await;
    bot.on_message(MessageEvent::new("m2", "C1", "U1", "!floor doodles"))
        .await;

    let sent = sink.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.contains("3.2"));
    assert!(sent[1].1.contains("Slow down"));
    assert_eq!(source.calls(), 1);
}
