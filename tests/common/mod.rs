use giftbroker::application::service::{ChatEvent, EscrowService};
use giftbroker::config::Config;
use giftbroker::domain::notification::Template;
use giftbroker::domain::user::ActorProfile;
use giftbroker::infrastructure::in_memory::{InMemoryDealStore, InMemoryUserStore};
use rust_decimal_macros::dec;
use std::sync::Arc;

pub const ADMIN_ID: i64 = 1;

pub fn service() -> EscrowService {
    EscrowService::new(
        Arc::new(InMemoryDealStore::new()),
        Arc::new(InMemoryUserStore::new()),
        Config::new(ADMIN_ID, dec!(3.0), "WALLET"),
    )
}

pub fn message(text: &str) -> ChatEvent {
    ChatEvent::Message { text: text.into() }
}

pub fn callback(data: &str) -> ChatEvent {
    ChatEvent::Callback { data: data.into() }
}

/// Runs the full creation wizard and returns the new deal's token.
pub async fn create_deal(
    service: &EscrowService,
    seller: &ActorProfile,
    amount: &str,
    description: &str,
) -> String {
    service
        .handle_event(seller, callback("create_deal"))
        .await
        .unwrap();
    service.handle_event(seller, message(amount)).await.unwrap();
    let intents = service
        .handle_event(seller, message(description))
        .await
        .unwrap();
    match &intents[0].template {
        Template::DealCreated { token, .. } => token.clone(),
        other => panic!("expected DealCreated, got {other:?}"),
    }
}

/// Joins a deal through its deep-link reference.
pub async fn join(service: &EscrowService, buyer: &ActorProfile, token: &str) {
    service
        .handle_event(
            buyer,
            ChatEvent::Start {
                payload: Some(format!("join_{token}")),
            },
        )
        .await
        .unwrap();
}
