use crate::domain::deal::{Amount, Deal, generate_deal_token, generate_payment_token};
use crate::domain::notification::{Notification, Template};
use crate::domain::ports::DealStoreRef;
use crate::domain::user::ActorProfile;
use crate::error::{EscrowError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

/// Insert attempts before a token collision is reported to the caller.
const INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Step {
    AwaitingAmount,
    AwaitingDescription,
}

#[derive(Debug, Clone, Copy)]
struct CreationState {
    step: Step,
    pending_amount: Option<Amount>,
}

impl CreationState {
    fn new() -> Self {
        Self {
            step: Step::AwaitingAmount,
            pending_amount: None,
        }
    }
}

/// Two-step deal creation wizard.
///
/// Sessions live in an owned map keyed by actor id. One slot per actor:
/// starting the wizard again resets an in-progress session back to the
/// amount step. Sessions have no expiry; an abandoned one lingers until
/// the actor either finishes or restarts it.
pub struct CreationFlow {
    sessions: RwLock<HashMap<i64, CreationState>>,
    deals: DealStoreRef,
}

impl CreationFlow {
    pub fn new(deals: DealStoreRef) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            deals,
        }
    }

    /// Opens (or resets) the actor's session and prompts for the amount.
    pub async fn start(&self, actor_id: i64) -> Vec<Notification> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(actor_id, CreationState::new());
        vec![Notification::new(actor_id, Template::AskAmount)]
    }

    /// Feeds one free-text message into the actor's session. Returns
    /// `None` when the actor has no open session, so the caller can fall
    /// back to its default handling.
    pub async fn handle_input(
        &self,
        actor: &ActorProfile,
        text: &str,
    ) -> Result<Option<Vec<Notification>>> {
        let state = {
            let sessions = self.sessions.read().await;
            match sessions.get(&actor.id) {
                Some(state) => *state,
                None => return Ok(None),
            }
        };

        match state.step {
            Step::AwaitingAmount => Ok(Some(self.collect_amount(actor.id, text).await)),
            Step::AwaitingDescription => {
                let amount = state
                    .pending_amount
                    .ok_or_else(|| EscrowError::InvalidInput("missing pending amount".into()))?;
                let intents = self.create_deal(actor, amount, text).await?;
                Ok(Some(intents))
            }
        }
    }

    /// Parses the amount. Rejections re-prompt without advancing the
    /// step or touching any persisted state.
    async fn collect_amount(&self, actor_id: i64, text: &str) -> Vec<Notification> {
        let amount = Decimal::from_str(text.trim())
            .map_err(|e| EscrowError::InvalidInput(e.to_string()))
            .and_then(Amount::new);
        match amount {
            Ok(amount) => {
                let mut sessions = self.sessions.write().await;
                sessions.insert(
                    actor_id,
                    CreationState {
                        step: Step::AwaitingDescription,
                        pending_amount: Some(amount),
                    },
                );
                vec![Notification::new(actor_id, Template::AskDescription)]
            }
            Err(_) => vec![Notification::new(actor_id, Template::AskAmount)],
        }
    }

    /// Generates tokens, inserts the deal as `open` and clears the
    /// session. A token collision on insert is retried with freshly
    /// generated tokens.
    async fn create_deal(
        &self,
        actor: &ActorProfile,
        amount: Amount,
        description: &str,
    ) -> Result<Vec<Notification>> {
        let mut deal = Deal::new(actor.id, actor.name.clone(), amount, description.trim());
        for attempt in 1.. {
            match self.deals.insert(deal.clone()).await {
                Ok(()) => break,
                Err(EscrowError::Conflict(_)) if attempt < INSERT_ATTEMPTS => {
                    deal.token = generate_deal_token();
                    deal.payment_token = generate_payment_token(&deal.token);
                }
                Err(e) => return Err(e),
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.remove(&actor.id);

        Ok(vec![Notification::new(
            actor.id,
            Template::DealCreated {
                token: deal.token.clone(),
                payment_token: deal.payment_token.clone(),
                join_reference: deal.join_reference(),
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deal::DealStatus;
    use crate::domain::ports::DealStore;
    use crate::infrastructure::in_memory::InMemoryDealStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Store double that rejects the first `failures` inserts with
    /// `Conflict` and records the tokens of every attempt.
    struct CollidingDealStore {
        inner: InMemoryDealStore,
        failures: AtomicUsize,
        attempts: Mutex<Vec<(String, String)>>,
    }

    impl CollidingDealStore {
        fn new(failures: usize) -> Self {
            Self {
                inner: InMemoryDealStore::new(),
                failures: AtomicUsize::new(failures),
                attempts: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> Vec<(String, String)> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DealStore for CollidingDealStore {
        async fn insert(&self, deal: Deal) -> Result<()> {
            self.attempts
                .lock()
                .unwrap()
                .push((deal.token.clone(), deal.payment_token.clone()));
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(EscrowError::Conflict(deal.token));
            }
            self.inner.insert(deal).await
        }

        async fn get(&self, token: &str) -> Result<Option<Deal>> {
            self.inner.get(token).await
        }

        async fn update_status(&self, token: &str, status: DealStatus) -> Result<()> {
            self.inner.update_status(token, status).await
        }

        async fn set_buyer(&self, token: &str, buyer_id: i64) -> Result<()> {
            self.inner.set_buyer(token, buyer_id).await
        }

        async fn for_actor(&self, actor_id: i64) -> Result<Vec<Deal>> {
            self.inner.for_actor(actor_id).await
        }
    }

    fn flow() -> (CreationFlow, DealStoreRef) {
        let store: DealStoreRef = Arc::new(InMemoryDealStore::new());
        (CreationFlow::new(store.clone()), store)
    }

    fn alice() -> ActorProfile {
        ActorProfile::new(7, "alice")
    }

    #[tokio::test]
    async fn test_no_session_passes_through() {
        let (flow, _) = flow();
        let out = flow.handle_input(&alice(), "hello").await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_full_flow_creates_open_deal() {
        let (flow, store) = flow();
        let actor = alice();

        let prompts = flow.start(actor.id).await;
        assert_eq!(prompts, vec![Notification::new(7, Template::AskAmount)]);

        let prompts = flow.handle_input(&actor, "10.5").await.unwrap().unwrap();
        assert_eq!(prompts, vec![Notification::new(7, Template::AskDescription)]);

        let intents = flow
            .handle_input(&actor, "gift card")
            .await
            .unwrap()
            .unwrap();
        let token = match &intents[0].template {
            Template::DealCreated {
                token,
                payment_token,
                join_reference,
            } => {
                assert!(payment_token.contains(token.as_str()));
                assert_eq!(join_reference, &format!("join_{token}"));
                token.clone()
            }
            other => panic!("unexpected template: {other:?}"),
        };

        let deal = store.get(&token).await.unwrap().unwrap();
        assert_eq!(deal.status, DealStatus::Open);
        assert_eq!(deal.seller_id, 7);
        assert_eq!(deal.seller_name, "alice");
        assert_eq!(deal.description, "gift card");
        assert_eq!(deal.amount.value().to_string(), "10.5");

        // Session is gone.
        let out = flow.handle_input(&actor, "anything").await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_negative_amount_reprompts_without_advancing() {
        let (flow, store) = flow();
        let actor = alice();
        flow.start(actor.id).await;

        let prompts = flow.handle_input(&actor, "-5").await.unwrap().unwrap();
        assert_eq!(prompts, vec![Notification::new(7, Template::AskAmount)]);

        // Still on the amount step; no deal was created.
        let prompts = flow.handle_input(&actor, "abc").await.unwrap().unwrap();
        assert_eq!(prompts, vec![Notification::new(7, Template::AskAmount)]);
        assert!(store.for_actor(actor.id).await.unwrap().is_empty());

        // A valid amount still advances afterwards.
        let prompts = flow.handle_input(&actor, "2.5").await.unwrap().unwrap();
        assert_eq!(prompts, vec![Notification::new(7, Template::AskDescription)]);
    }

    #[tokio::test]
    async fn test_restart_resets_to_amount_step() {
        let (flow, _) = flow();
        let actor = alice();
        flow.start(actor.id).await;
        flow.handle_input(&actor, "3.0").await.unwrap().unwrap();

        // Restart mid-flow: back to asking for the amount.
        let prompts = flow.start(actor.id).await;
        assert_eq!(prompts, vec![Notification::new(7, Template::AskAmount)]);
        let prompts = flow
            .handle_input(&actor, "not a number")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prompts, vec![Notification::new(7, Template::AskAmount)]);
    }

    #[tokio::test]
    async fn test_token_collision_retries_with_fresh_tokens() {
        let store = Arc::new(CollidingDealStore::new(1));
        let flow = CreationFlow::new(store.clone());
        let actor = alice();

        flow.start(actor.id).await;
        flow.handle_input(&actor, "10.5").await.unwrap().unwrap();
        let intents = flow
            .handle_input(&actor, "gift card")
            .await
            .unwrap()
            .unwrap();

        let attempts = store.attempts();
        assert_eq!(attempts.len(), 2);
        let (first_token, _) = &attempts[0];
        let (second_token, second_payment) = &attempts[1];
        assert_ne!(first_token, second_token);
        // The payment memo is regenerated alongside the token.
        assert!(second_payment.contains(second_token.as_str()));

        match &intents[0].template {
            Template::DealCreated {
                token,
                payment_token,
                ..
            } => {
                assert_eq!(token, second_token);
                assert_eq!(payment_token, second_payment);
            }
            other => panic!("unexpected template: {other:?}"),
        }
        let stored = store.get(second_token).await.unwrap().unwrap();
        assert_eq!(stored.status, DealStatus::Open);
    }

    #[tokio::test]
    async fn test_exhausted_collision_retries_surface_conflict() {
        let store = Arc::new(CollidingDealStore::new(usize::MAX));
        let flow = CreationFlow::new(store.clone());
        let actor = alice();

        flow.start(actor.id).await;
        flow.handle_input(&actor, "10.5").await.unwrap().unwrap();
        let err = flow.handle_input(&actor, "gift card").await.unwrap_err();
        assert!(matches!(err, EscrowError::Conflict(_)));
        assert_eq!(store.attempts().len(), INSERT_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_repeated_creations_use_fresh_tokens() {
        let (flow, store) = flow();
        let actor = alice();
        for _ in 0..5 {
            flow.start(actor.id).await;
            flow.handle_input(&actor, "1").await.unwrap().unwrap();
            flow.handle_input(&actor, "gift").await.unwrap().unwrap();
        }
        let deals = store.for_actor(actor.id).await.unwrap();
        assert_eq!(deals.len(), 5);
        let mut tokens: Vec<_> = deals.iter().map(|d| d.token.clone()).collect();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 5);
    }
}
