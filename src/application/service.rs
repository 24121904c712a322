use crate::application::engine::{Actor, LifecycleEngine};
use crate::application::wizard::CreationFlow;
use crate::config::Config;
use crate::domain::notification::{Notification, Template};
use crate::domain::ports::{DealStoreRef, NotificationDispatcher, UserStoreRef};
use crate::domain::user::{ActorProfile, ActorRole, User};
use crate::error::Result;

/// An inbound chat event, already stripped of transport framing.
#[derive(Debug, PartialEq, Clone)]
pub enum ChatEvent {
    /// First contact or deep link. A `join_<token>` payload joins a deal.
    Start { payload: Option<String> },
    /// Free text.
    Message { text: String },
    /// An inline action, e.g. `create_deal` or `confirm_sent:<token>`.
    Callback { data: String },
}

enum AdminCommand {
    Paid,
    Payout,
    Cancel,
}

/// Inbound entry point: classifies each event and routes it to the
/// creation wizard or the lifecycle engine, upserting the sender's user
/// record on every contact.
pub struct EscrowService {
    engine: LifecycleEngine,
    flow: CreationFlow,
    users: UserStoreRef,
    config: Config,
}

impl EscrowService {
    pub fn new(deals: DealStoreRef, users: UserStoreRef, config: Config) -> Self {
        Self {
            engine: LifecycleEngine::new(deals.clone(), config.clone()),
            flow: CreationFlow::new(deals),
            users,
            config,
        }
    }

    /// Handles one event and returns the notification intents it
    /// produced. Errors carry the failure taxonomy (`NotFound`,
    /// `Unauthorized`, ...) and imply that nothing was mutated.
    pub async fn handle_event(
        &self,
        profile: &ActorProfile,
        event: ChatEvent,
    ) -> Result<Vec<Notification>> {
        self.users
            .upsert(User::new(profile.id, profile.name.clone()))
            .await?;
        let actor = self.actor_for(profile.id);

        match event {
            ChatEvent::Start { payload: Some(p) } if p.starts_with("join_") => {
                let token = p.trim_start_matches("join_").to_string();
                self.engine.join(actor, &token).await
            }
            ChatEvent::Start { .. } => Ok(vec![Notification::new(actor.id, Template::Welcome)]),
            ChatEvent::Callback { data } => self.handle_callback(actor, &data).await,
            ChatEvent::Message { text } => self.handle_message(profile, actor, text.trim()).await,
        }
    }

    async fn handle_callback(&self, actor: Actor, data: &str) -> Result<Vec<Notification>> {
        if let Some(token) = data.strip_prefix("confirm_sent:") {
            return self.engine.confirm_sent(actor, token).await;
        }
        if let Some(token) = data.strip_prefix("confirm_received:") {
            return self.engine.confirm_received(actor, token).await;
        }
        if let Some(lang) = data.strip_prefix("setlang:") {
            self.users.set_lang(actor.id, lang).await?;
            return Ok(vec![
                Notification::new(
                    actor.id,
                    Template::LanguageSet {
                        lang: lang.to_string(),
                    },
                ),
                Notification::new(actor.id, Template::Menu),
            ]);
        }
        match data {
            "create_deal" => Ok(self.flow.start(actor.id).await),
            "my_deals" => self.engine.deals_for(actor).await,
            "change_lang" => Ok(vec![Notification::new(actor.id, Template::ChooseLanguage)]),
            // Unknown callbacks are transport noise.
            _ => Ok(Vec::new()),
        }
    }

    async fn handle_message(
        &self,
        profile: &ActorProfile,
        actor: Actor,
        text: &str,
    ) -> Result<Vec<Notification>> {
        if actor.role == ActorRole::Admin
            && let Some((command, token)) = parse_admin_command(text)
        {
            return match command {
                AdminCommand::Paid => self.engine.mark_paid(actor, token).await,
                AdminCommand::Payout => self.engine.payout(actor, token).await,
                AdminCommand::Cancel => self.engine.cancel(actor, token).await,
            };
        }

        if let Some(intents) = self.flow.handle_input(profile, text).await? {
            return Ok(intents);
        }

        // No open wizard and not a command: menu no-op.
        Ok(vec![Notification::new(actor.id, Template::Menu)])
    }

    fn actor_for(&self, id: i64) -> Actor {
        let role = if id == self.config.admin_id {
            ActorRole::Admin
        } else {
            ActorRole::Member
        };
        Actor::new(id, role)
    }
}

fn parse_admin_command(text: &str) -> Option<(AdminCommand, &str)> {
    let mut parts = text.trim_start_matches('/').split_whitespace();
    let command = match parts.next()? {
        "paid" => AdminCommand::Paid,
        "payout" => AdminCommand::Payout,
        "cancel" => AdminCommand::Cancel,
        _ => return None,
    };
    let token = parts.next()?;
    Some((command, token))
}

/// Delivers intents best-effort. Delivery failures are logged and never
/// fail the transition that already committed.
pub async fn dispatch_all(dispatcher: &dyn NotificationDispatcher, intents: &[Notification]) {
    for intent in intents {
        if let Err(e) = dispatcher.deliver(intent).await {
            tracing::warn!(recipient = intent.recipient, error = %e, "notification delivery failed");
        }
    }
}
