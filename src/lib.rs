use serenity::all::{Client, GatewayIntents};
use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod discord;
pub mod error;
pub mod ledger;
pub mod platform;
pub mod util;

use commands::attendance::AttendanceController;
use commands::ticket::TicketController;
use config::BotConfig;
use error::Result;
use ledger::LedgerStore;

/// Everything the event handler shares across events.
pub struct BotServices {
    pub config: Arc<BotConfig>,
    pub attendance: AttendanceController,
    pub tickets: TicketController,
}

impl BotServices {
    /// Open the ledger and build the controllers.
    pub async fn init(config: BotConfig) -> Result<Self> {
        let store = Arc::new(LedgerStore::open(&config.ledger_path).await?);
        let attendance = AttendanceController::new(store, config.attendance.board_recent_limit);
        let tickets = TicketController::new(
            &config.tickets.channel_prefix,
            config.tickets.category_id,
            config.tickets.authorized_role_ids.clone(),
        );
        Ok(Self {
            config: Arc::new(config),
            attendance,
            tickets,
        })
    }
}

/// Load configuration, open the ledger and run the gateway client until it stops.
pub async fn run() -> Result<()> {
    let config = BotConfig::load()?;
    let token = config::discord_token()?;
    let services = Arc::new(BotServices::init(config).await?);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let mut client = Client::builder(&token, intents)
        .event_handler(discord::Handler::new(services))
        .await?;

    client.start().await?;
    Ok(())
}
