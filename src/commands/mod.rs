pub mod attendance;
pub mod ticket;

/// Custom ids carried by the buttons the bot posts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Start,
    Stop,
    OpenTicket,
    CloseTicket,
    NotifyTicket,
    AddPerson,
    RemovePerson,
}

impl ButtonAction {
    pub const ALL: [ButtonAction; 7] = [
        ButtonAction::Start,
        ButtonAction::Stop,
        ButtonAction::OpenTicket,
        ButtonAction::CloseTicket,
        ButtonAction::NotifyTicket,
        ButtonAction::AddPerson,
        ButtonAction::RemovePerson,
    ];

    pub fn custom_id(self) -> &'static str {
        match self {
            ButtonAction::Start => "start",
            ButtonAction::Stop => "stop",
            ButtonAction::OpenTicket => "open-ticket",
            ButtonAction::CloseTicket => "close-ticket",
            ButtonAction::NotifyTicket => "notify-ticket",
            ButtonAction::AddPerson => "add-person",
            ButtonAction::RemovePerson => "remove-person",
        }
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.custom_id() == custom_id)
    }
}

/// Modal forms carrying a single target id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormAction {
    AddPerson,
    RemovePerson,
}

impl FormAction {
    /// Text input holding the target user id.
    pub const TARGET_FIELD: &'static str = "target-id";

    pub fn custom_id(self) -> &'static str {
        match self {
            FormAction::AddPerson => "add-person-form",
            FormAction::RemovePerson => "remove-person-form",
        }
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        [FormAction::AddPerson, FormAction::RemovePerson]
            .into_iter()
            .find(|a| a.custom_id() == custom_id)
    }
}
