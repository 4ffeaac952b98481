//! Embeds, buttons and reply texts shown on Discord.

use chrono::FixedOffset;
use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter, CreateInputText,
    CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage, CreateModal,
    InputTextStyle, Timestamp, UserId,
};

use crate::commands::{ButtonAction, FormAction};
use crate::error::BotError;
use crate::ledger::{Board, ShiftRecord};
use crate::platform::{AuditEntry, LookupReport, ShiftAction, TicketEvent};
use crate::util::{format_clock, format_duration, name_without_badge};

const BRAND: u32 = 0xdd0404;
const ON_DUTY: u32 = 0x04dd04;
const FOOTER: &str = "Sistema de Ponto";
/// Discord rejects embed field values and descriptions longer than these, in characters.
const FIELD_LIMIT: usize = 1024;
const DESCRIPTION_LIMIT: usize = 4096;
// Space kept for the `\n… +N` tail.
const TAIL_RESERVE: usize = 16;

// ── Text ────────────────────────────────────────────────────────────────────

/// `[01] [08:30] 137 - Petro • 1 hora 5 minutos`; open shifts show their running time in parentheses.
pub fn shift_line(position: usize, record: &ShiftRecord, now: i64, offset: &FixedOffset) -> String {
    let duration = format_duration(record.duration_at(now));
    let duration = if record.ended_at.is_some() {
        duration
    } else {
        format!("({duration})")
    };
    format!(
        "[{:02}] [{}] {} - {} • {}",
        position + 1,
        format_clock(record.started_at, offset),
        record.badge_number,
        name_without_badge(&record.display_label),
        duration
    )
}

fn numbered<'a>(
    records: impl Iterator<Item = &'a ShiftRecord>,
    now: i64,
    offset: &FixedOffset,
) -> Vec<String> {
    records
        .enumerate()
        .map(|(i, r)| shift_line(i, r, now, offset))
        .collect()
}

/// Join lines while they fit in `limit` characters; the rest collapse into `… +N`.
fn fit_lines(lines: &[String], limit: usize) -> String {
    let joined = lines.join("\n");
    if joined.chars().count() <= limit {
        return joined;
    }

    let budget = limit.saturating_sub(TAIL_RESERVE);
    let mut out = String::new();
    let mut used = 0;
    let mut shown = 0;
    for line in lines {
        let cost = line.chars().count() + usize::from(shown > 0);
        if used + cost > budget {
            break;
        }
        if shown > 0 {
            out.push('\n');
        }
        out.push_str(line);
        used += cost;
        shown += 1;
    }
    if shown > 0 {
        out.push('\n');
    }
    out.push_str(&format!("… +{}", lines.len() - shown));
    out
}

/// Body of the board embed: who is on duty, then the latest closed shifts.
pub fn board_description(board: &Board, offset: &FixedOffset) -> String {
    let frame = |active: &str, closed: &str| {
        format!("> 👮‍♂️ **Oficiais em Serviço:**\n{active}\n\n> 📜 **Últimos Pontos Encerrados:**\n{closed}")
    };

    let closed = numbered(board.recent_closed.iter(), board.now, offset);
    let closed = if closed.is_empty() {
        "❌ Nenhum ponto encerrado.".to_string()
    } else {
        fit_lines(&closed, FIELD_LIMIT)
    };

    let active = numbered(board.active.iter(), board.now, offset);
    let active = if active.is_empty() {
        "❌ Ninguém em serviço no momento.".to_string()
    } else {
        let room = DESCRIPTION_LIMIT.saturating_sub(frame("", &closed).chars().count());
        fit_lines(&active, room)
    };

    frame(&active, &closed)
}

/// The three fields of a lookup reply: history (most recent first), active shift, total.
pub fn lookup_fields(
    report: &LookupReport,
    history_limit: usize,
    offset: &FixedOffset,
) -> [(String, String); 3] {
    let summary = &report.summary;
    let history = numbered(
        summary.closed.iter().rev().take(history_limit),
        report.now,
        offset,
    );
    let history = if history.is_empty() {
        "❌ Nenhum ponto encontrado.".to_string()
    } else {
        fit_lines(&history, FIELD_LIMIT)
    };

    let active = match &summary.active {
        Some(record) => format!(
            "Em serviço desde **{}** • ({})",
            format_clock(record.started_at, offset),
            format_duration(record.duration_at(report.now))
        ),
        None => "❌ Nenhum ponto ativo.".to_string(),
    };

    let total = if summary.total.is_zero() {
        "❌ Nenhum tempo registrado.".to_string()
    } else {
        format!("**{}** somados em todos os pontos.", format_duration(summary.total))
    };

    [
        ("📜 Histórico:".to_string(), history),
        ("🟢 Ponto Ativo:".to_string(), active),
        ("⏳ Tempo Total Registrado:".to_string(), total),
    ]
}

pub fn ticket_audit_line(event: &TicketEvent) -> String {
    match event {
        TicketEvent::Opened { channel, by } => format!("📨 Ticket aberto: <#{channel}> por <@{by}>"),
        TicketEvent::Closed { channel_name, by } => {
            format!("🔒 Ticket fechado: {channel_name} por <@{by}>")
        }
    }
}

/// Private reply for an action that was refused or failed.
pub fn failure_message(error: &BotError) -> &'static str {
    match error {
        BotError::InvalidNameFormat => "❌ Seu nome precisa estar no formato `123 - Nome`!",
        BotError::AlreadyActive => "❌ Você já está em serviço.",
        BotError::NotActive => "❌ Você não está em serviço.",
        BotError::DuplicateTicket => "❌ Você já possui um ticket aberto.",
        BotError::Unauthorized => "❌ Você não tem permissão para fechar este ticket.",
        BotError::TargetNotFound => "❌ Usuário não encontrado.",
        BotError::DeliveryFailed => "❌ Não consegui enviar DM para o usuário.",
        _ => "❌ Algo deu errado. Tente novamente mais tarde.",
    }
}

// ── Builders ────────────────────────────────────────────────────────────────

fn footer(text: &str) -> CreateEmbedFooter {
    CreateEmbedFooter::new(text)
}

pub fn ephemeral(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

fn button(action: ButtonAction, label: &str, style: ButtonStyle) -> CreateButton {
    CreateButton::new(action.custom_id()).label(label).style(style)
}

pub fn attendance_panel() -> CreateMessage {
    let embed = CreateEmbed::new()
        .colour(BRAND)
        .title("📅 Sistema de Ponto")
        .description(
            "> 🔰 **Bem-vindo ao Sistema de Ponto da Organização!**\n\
             > Clique nos botões abaixo para **INICIAR** ou **ENCERRAR** seu ponto.",
        )
        .footer(footer(FOOTER))
        .timestamp(Timestamp::now());
    let row = CreateActionRow::Buttons(vec![
        button(ButtonAction::Start, "Iniciar Ponto", ButtonStyle::Success),
        button(ButtonAction::Stop, "Encerrar Ponto", ButtonStyle::Danger),
    ]);
    CreateMessage::new().embed(embed).components(vec![row])
}

pub fn board_message(board: &Board, offset: &FixedOffset) -> CreateMessage {
    let embed = CreateEmbed::new()
        .colour(BRAND)
        .title("📋 Histórico de Pontos")
        .description(board_description(board, offset))
        .footer(footer(FOOTER))
        .timestamp(Timestamp::now());
    CreateMessage::new().embed(embed)
}

pub fn audit_embed(entry: &AuditEntry, offset: &FixedOffset) -> CreateEmbed {
    let (colour, title, status_name, status_value, closing) = match entry.action {
        ShiftAction::Started => (
            ON_DUTY,
            "📑 Log de Ponto — Entrada",
            "🟢 Status",
            "Em serviço".to_string(),
            "Ponto Iniciado",
        ),
        ShiftAction::Ended => (
            BRAND,
            "📑 Log de Ponto — Saída",
            "🔴 Tempo Trabalhado",
            format_duration(entry.duration),
            "Ponto Encerrado",
        ),
    };

    let mut embed = CreateEmbed::new()
        .colour(colour)
        .title(title)
        .field("👤 Usuário", entry.actor_label.clone(), true)
        .field("🆔 ID", entry.actor_id.to_string(), true)
        .field("🔢 Passaporte", entry.badge_number.clone(), true)
        .field("⏰ Horário", format_clock(entry.started_at, offset), true)
        .field(status_name, status_value, true)
        .footer(footer(&format!("{FOOTER} • {closing}")))
        .timestamp(Timestamp::now());
    if let Some(url) = &entry.avatar_url {
        embed = embed.thumbnail(url.clone());
    }
    embed
}

pub fn lookup_embed(report: &LookupReport, history_limit: usize, offset: &FixedOffset) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .colour(BRAND)
        .title("📋 Consulta de Pontos")
        .footer(footer(FOOTER))
        .timestamp(Timestamp::now());
    if let Some(member) = &report.member {
        embed = embed.description(format!(
            "> 👤 **{}**\n> 🆔 **{}**\n\n",
            member.display_name, member.user_id
        ));
        if let Some(url) = &member.avatar_url {
            embed = embed.thumbnail(url.clone());
        }
    }
    embed.fields(
        lookup_fields(report, history_limit, offset)
            .into_iter()
            .map(|(name, value)| (name, value, false)),
    )
}

pub fn lookup_instructions(ttl_minutes: u64) -> CreateMessage {
    let embed = CreateEmbed::new()
        .colour(BRAND)
        .title("🔍 Consulta de Pontos")
        .description(format!(
            "> 📑 **Como funciona a consulta:**\n\n\
             > Digite o número que está **antes do hífen no seu nome do Discord.**\n\
             > ➕ Exemplo: Se seu nome for `137 - Petro K. Montserrat`, digite `137`.\n\n\
             > O sistema irá retornar seu histórico de pontos!\n\
             > 🔔 As consultas duram **{ttl_minutes} minutos** e serão apagadas automaticamente.\n\n\
             > ❗ **Dúvidas? Procure um superior.**"
        ))
        .footer(footer(FOOTER))
        .timestamp(Timestamp::now());
    CreateMessage::new().embed(embed)
}

pub fn ticket_panel() -> CreateMessage {
    let embed = CreateEmbed::new()
        .colour(BRAND)
        .title("🛡️ Atendimento Corregedoria")
        .description("Clique no botão abaixo para abrir um ticket privado com a corregedoria.");
    let row = CreateActionRow::Buttons(vec![button(
        ButtonAction::OpenTicket,
        "📨 Abrir Ticket - Corregedoria",
        ButtonStyle::Danger,
    )]);
    CreateMessage::new().embed(embed).components(vec![row])
}

pub fn ticket_controls(owner: UserId) -> CreateMessage {
    let embed = CreateEmbed::new()
        .colour(BRAND)
        .title("🛡️ Ticket - Corregedoria")
        .description(format!("Ticket aberto por <@{owner}>.\nAguarde atendimento."));
    let row = CreateActionRow::Buttons(vec![
        button(ButtonAction::CloseTicket, "🔒 Fechar", ButtonStyle::Secondary),
        button(ButtonAction::NotifyTicket, "📢 Notificar", ButtonStyle::Primary),
        button(ButtonAction::AddPerson, "➕ Adicionar Pessoa", ButtonStyle::Success),
        button(ButtonAction::RemovePerson, "➖ Remover Pessoa", ButtonStyle::Danger),
    ]);
    CreateMessage::new()
        .content(format!("<@{owner}>"))
        .embed(embed)
        .components(vec![row])
}

pub fn person_form(action: FormAction) -> CreateModal {
    let (title, label) = match action {
        FormAction::AddPerson => ("Adicionar Pessoa", "ID do usuário para adicionar"),
        FormAction::RemovePerson => ("Remover Pessoa", "ID do usuário para remover"),
    };
    let input = CreateInputText::new(InputTextStyle::Short, label, FormAction::TARGET_FIELD)
        .min_length(17)
        .max_length(20)
        .required(true);
    CreateModal::new(action.custom_id(), title).components(vec![CreateActionRow::InputText(input)])
}
