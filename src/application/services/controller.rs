//! Bot controller - composes parser, lookup client, and the reply capability

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::application::errors::LookupError;
use crate::application::messaging::{ChannelThrottle, CommandParser};
use crate::domain::entities::{FloorPriceQuote, MessageEvent, ReadyInfo};
use crate::domain::traits::{EventHandler, FloorPriceSource, ReplySink};

/// Handles inbound message events and turns recognized commands into
/// channel replies.
///
/// Lookup failures are converted to user-facing replies here and never
/// propagate further. Overlapping events are independent; the only shared
/// state between them is the reply capability and the throttle.
pub struct BotController {
    parser: CommandParser,
    source: Arc<dyn FloorPriceSource>,
    replies: Arc<dyn ReplySink>,
    throttle: ChannelThrottle,
    bot_user_id: RwLock<Option<String>>,
}

impl BotController {
    pub fn new(
        parser: CommandParser,
        source: Arc<dyn FloorPriceSource>,
        replies: Arc<dyn ReplySink>,
        throttle: ChannelThrottle,
    ) -> Self {
        Self {
            parser,
            source,
            replies,
            throttle,
            bot_user_id: RwLock::new(None),
        }
    }

    fn is_own_message(&self, author_id: &str) -> bool {
        match self.bot_user_id.read() {
            Ok(own) => own.as_deref() == Some(author_id),
            Err(_) => false,
        }
    }

    fn reply(&self, channel_id: &str, text: &str) {
        if let Err(e) = self.replies.send_reply(channel_id, text) {
            tracing::warn!("Failed to send reply to {}: {}", channel_id, e);
        }
    }

    fn format_quote(quote: &FloorPriceQuote) -> String {
        format!(
            "Floor price for {}: {} {}",
            quote.collection_slug, quote.floor_price, quote.currency
        )
    }
}

#[async_trait]
impl EventHandler for BotController {
    async fn on_ready(&self, info: ReadyInfo) {
        tracing::info!("Controller active as user {}", info.bot_user_id);
        if let Ok(mut own) = self.bot_user_id.write() {
            *own = Some(info.bot_user_id);
        }
    }

    async fn on_message(&self, event: MessageEvent) {
        // Reply-loop guard: never react to our own messages.
        if self.is_own_message(&event.author_id) {
            return;
        }

        // Not a command is not an error; the event is simply dropped.
        let Some(command) = self.parser.parse(&event.text) else {
            return;
        };

        if !command.has_argument() {
            self.reply(
                &event.channel_id,
                &format!("Usage: {} <collection-slug>", command.name),
            );
            return;
        }

        if let Err(retry_after) = self.throttle.check(&event.channel_id) {
            self.reply(
                &event.channel_id,
                &format!(
                    "Slow down - try again in {}s.",
                    retry_after.as_secs().max(1)
                ),
            );
            return;
        }

        tracing::info!(
            "Looking up floor price for \"{}\" (channel {})",
            command.argument,
            event.channel_id
        );

        match self.source.fetch_floor_price(&command.argument).await {
            Ok(quote) => self.reply(&event.channel_id, &Self::format_quote(&quote)),
            Err(LookupError::NotFound) => {
                self.reply(
                    &event.channel_id,
                    &format!("Collection \"{}\" not found.", command.argument),
                );
            }
            Err(e) => {
                tracing::warn!("Floor price lookup for \"{}\" failed: {}", command.argument, e);
                self.reply(
                    &event.channel_id,
                    "The marketplace is having trouble right now - try again later.",
                );
            }
        }
    }
}
