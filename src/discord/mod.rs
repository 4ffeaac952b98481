use serenity::all::{
    ActionRowComponent, ChannelId, ComponentInteraction, Context, CreateInteractionResponse,
    CreateMessage, EventHandler, GuildId, Interaction, Member, Message, ModalInteraction, Ready,
    User,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod gateway;
pub mod render;

use crate::commands::{ButtonAction, FormAction};
use crate::error::{BotError, Result};
use crate::platform::{Actor, TicketChannel};
use crate::util::now_millis;
use crate::BotServices;
use gateway::DiscordGateway;

/// Routes gateway events to the attendance and ticket controllers.
pub struct Handler {
    services: Arc<BotServices>,
    panels: PanelLatch,
}

/// `ready` fires again after every fresh identify; panels go up once per process.
#[derive(Default)]
struct PanelLatch(AtomicBool);

impl PanelLatch {
    /// True for the first caller only, until released.
    fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    fn release(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Handler {
    pub fn new(services: Arc<BotServices>) -> Self {
        Self {
            services,
            panels: PanelLatch::default(),
        }
    }

    fn gateway(&self, ctx: &Context, guild_id: GuildId) -> DiscordGateway {
        DiscordGateway::new(
            ctx.http.clone(),
            ctx.cache.clone(),
            guild_id,
            self.services.config.clone(),
        )
    }

    /// Post the attendance panel, lookup instructions and ticket panel.
    async fn post_panels(&self, ctx: &Context) -> Result<()> {
        let config = &self.services.config;
        let offset = config.display_offset();
        let board = self
            .services
            .attendance
            .store()
            .board(config.attendance.board_recent_limit, now_millis())
            .await;

        gateway::post_attendance_panels(&ctx.http, config.attendance.panel_channel_id, &board, &offset)
            .await?;
        config
            .attendance
            .lookup_channel_id
            .send_message(&ctx.http, render::lookup_instructions(config.lookup_ttl().as_secs() / 60))
            .await?;
        config
            .tickets
            .panel_channel_id
            .send_message(&ctx.http, render::ticket_panel())
            .await?;
        Ok(())
    }

    async fn on_button(&self, ctx: &Context, component: &ComponentInteraction) -> Result<()> {
        let Some(action) = ButtonAction::parse(&component.data.custom_id) else {
            return Ok(());
        };
        let Some(guild_id) = component.guild_id else {
            return Ok(());
        };

        // The modal is the reply; the form submission is handled separately.
        let form = match action {
            ButtonAction::AddPerson => Some(FormAction::AddPerson),
            ButtonAction::RemovePerson => Some(FormAction::RemovePerson),
            _ => None,
        };
        if let Some(form) = form {
            component
                .create_response(&ctx.http, CreateInteractionResponse::Modal(render::person_form(form)))
                .await?;
            return Ok(());
        }

        let platform = self.gateway(ctx, guild_id);
        let actor = actor_from(&component.user, component.member.as_ref());
        let reply = match self.run_button(&platform, ctx, component, action, &actor).await {
            Ok(reply) => reply,
            Err(error) => Some(failure_reply(action.custom_id(), &error)),
        };
        // close-ticket deletes the channel the interaction came from; nothing left to answer.
        if let Some(reply) = reply {
            component
                .create_response(&ctx.http, render::ephemeral(reply))
                .await?;
        }
        Ok(())
    }

    async fn run_button(
        &self,
        platform: &DiscordGateway,
        ctx: &Context,
        component: &ComponentInteraction,
        action: ButtonAction,
        actor: &Actor,
    ) -> Result<Option<String>> {
        let services = &self.services;
        let reply = match action {
            ButtonAction::Start => {
                services.attendance.start(platform, actor, now_millis()).await?;
                "✅ Ponto iniciado com sucesso!".to_string()
            }
            ButtonAction::Stop => {
                services.attendance.stop(platform, actor, now_millis()).await?;
                "✅ Ponto encerrado com sucesso!".to_string()
            }
            ButtonAction::OpenTicket => {
                let channel = services.tickets.open(platform, actor).await?;
                format!("✅ Ticket criado: <#{}>", channel.id)
            }
            ButtonAction::CloseTicket => {
                let channel = current_channel(ctx, component.channel_id).await?;
                services.tickets.close(platform, actor, &channel).await?;
                return Ok(None);
            }
            ButtonAction::NotifyTicket => {
                let channel = current_channel(ctx, component.channel_id).await?;
                services.tickets.notify(platform, &channel).await?;
                "✅ Notificação enviada no privado.".to_string()
            }
            ButtonAction::AddPerson | ButtonAction::RemovePerson => return Ok(None),
        };
        Ok(Some(reply))
    }

    async fn on_form(&self, ctx: &Context, modal: &ModalInteraction) -> Result<()> {
        let Some(action) = FormAction::parse(&modal.data.custom_id) else {
            return Ok(());
        };
        let Some(guild_id) = modal.guild_id else {
            return Ok(());
        };
        let platform = self.gateway(ctx, guild_id);
        let raw = form_value(modal, FormAction::TARGET_FIELD).unwrap_or_default();
        let tickets = &self.services.tickets;

        let outcome = match action {
            FormAction::AddPerson => tickets
                .add_person(&platform, modal.channel_id, &raw)
                .await
                .map(|user| format!("✅ <@{user}> adicionado ao ticket.")),
            FormAction::RemovePerson => tickets
                .remove_person(&platform, modal.channel_id, &raw)
                .await
                .map(|user| format!("✅ <@{user}> removido do ticket.")),
        };
        let reply = match outcome {
            Ok(text) => text,
            Err(error) => failure_reply(action.custom_id(), &error),
        };
        modal
            .create_response(&ctx.http, render::ephemeral(reply))
            .await?;
        Ok(())
    }

    async fn on_lookup(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let Some(guild_id) = msg.guild_id else {
            return Ok(());
        };
        let platform = self.gateway(ctx, guild_id);
        let Some(report) = self
            .services
            .attendance
            .lookup(&platform, &msg.content, now_millis())
            .await?
        else {
            return Ok(());
        };

        let config = &self.services.config;
        let embed = render::lookup_embed(
            &report,
            config.attendance.lookup_history_limit,
            &config.display_offset(),
        );
        let reply = msg
            .channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await?;

        // Fire and forget: both messages go away after the TTL.
        let http = ctx.http.clone();
        let channel = msg.channel_id;
        let request = msg.id;
        tokio::spawn(delete_after(config.lookup_ttl(), move || async move {
            let _ = channel.delete_message(&http, reply.id).await;
            let _ = channel.delete_message(&http, request).await;
        }));
        Ok(())
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "bot online");
        if !self.panels.claim() {
            tracing::debug!("panels already posted; reconnect");
            return;
        }
        if let Err(error) = self.post_panels(&ctx).await {
            tracing::error!(%error, "failed to post startup panels");
            self.panels.release();
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let result = match &interaction {
            Interaction::Component(component) => self.on_button(&ctx, component).await,
            Interaction::Modal(modal) => self.on_form(&ctx, modal).await,
            _ => Ok(()),
        };
        if let Err(error) = result {
            tracing::error!(%error, "failed to answer interaction");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || msg.channel_id != self.services.config.attendance.lookup_channel_id {
            return;
        }
        if let Err(error) = self.on_lookup(&ctx, &msg).await {
            tracing::error!(%error, "failed to answer lookup");
        }
    }
}

fn actor_from(user: &User, member: Option<&Member>) -> Actor {
    match member {
        Some(member) => Actor {
            user_id: user.id,
            username: user.name.clone(),
            display_name: member.display_name().to_string(),
            avatar_url: Some(member.face()),
            roles: member.roles.clone(),
            is_admin: member.permissions.is_some_and(|p| p.administrator()),
        },
        None => Actor {
            user_id: user.id,
            username: user.name.clone(),
            display_name: user.display_name().to_string(),
            avatar_url: Some(user.face()),
            roles: Vec::new(),
            is_admin: false,
        },
    }
}

async fn current_channel(ctx: &Context, channel_id: ChannelId) -> Result<TicketChannel> {
    let name = channel_id
        .to_channel(&ctx.http)
        .await?
        .guild()
        .map(|c| c.name)
        .unwrap_or_else(|| channel_id.to_string());
    Ok(TicketChannel {
        id: channel_id,
        name,
    })
}

/// Wait out `ttl`, then run `delete`.
async fn delete_after<F, Fut>(ttl: Duration, delete: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::time::sleep(ttl).await;
    delete().await;
}

fn form_value(modal: &ModalInteraction, field: &str) -> Option<String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == field => input.value.clone(),
            _ => None,
        })
}

/// Rejections become a private reply; faults are logged and answered generically.
fn failure_reply(action: &str, error: &BotError) -> String {
    if error.is_rejection() {
        tracing::debug!(action, %error, "action rejected");
    } else {
        tracing::error!(action, %error, "action failed");
    }
    render::failure_message(error).to_string()
}
