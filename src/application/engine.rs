use crate::application::payout;
use crate::config::Config;
use crate::domain::deal::{Deal, DealStatus};
use crate::domain::notification::{Notification, Template};
use crate::domain::ports::DealStoreRef;
use crate::domain::user::ActorRole;
use crate::error::{EscrowError, Result};

/// A transition request carries the caller's identity and role; the
/// engine performs every authorization check itself.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: i64,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: i64, role: ActorRole) -> Self {
        Self { id, role }
    }
}

/// State machine over `DealStatus`.
///
/// Each operation validates the caller, re-reads the deal's current
/// status, applies the conditional write, and returns the notification
/// intents the transition implies. A failed request mutates nothing and
/// emits nothing.
pub struct LifecycleEngine {
    deals: DealStoreRef,
    config: Config,
}

impl LifecycleEngine {
    pub fn new(deals: DealStoreRef, config: Config) -> Self {
        Self { deals, config }
    }

    /// `open -> paid`, admin only. Fans out to both parties, with the
    /// buyer skipped if nobody has joined yet.
    pub async fn mark_paid(&self, actor: Actor, token: &str) -> Result<Vec<Notification>> {
        self.require_admin(actor, "mark a deal as paid")?;
        let deal = self.advance(token, DealStatus::Paid).await?;

        let mut intents = Vec::new();
        if let Some(buyer_id) = deal.buyer_id {
            intents.push(Notification::new(
                buyer_id,
                Template::PaymentConfirmedBuyer {
                    token: deal.token.clone(),
                },
            ));
        }
        intents.push(Notification::new(
            deal.seller_id,
            Template::PaymentConfirmedSeller { token: deal.token },
        ));
        Ok(intents)
    }

    /// `paid -> sent`, only the deal's seller.
    pub async fn confirm_sent(&self, actor: Actor, token: &str) -> Result<Vec<Notification>> {
        let deal = self.fetch(token).await?;
        if actor.id != deal.seller_id {
            return Err(EscrowError::Unauthorized {
                actor: actor.id,
                action: "confirm shipment",
            });
        }
        let deal = self.advance(token, DealStatus::Sent).await?;

        let mut intents = vec![Notification::new(
            deal.seller_id,
            Template::ShipmentAcked {
                token: deal.token.clone(),
            },
        )];
        if let Some(buyer_id) = deal.buyer_id {
            intents.push(Notification::new(
                buyer_id,
                Template::ShipmentConfirmed { token: deal.token },
            ));
        }
        Ok(intents)
    }

    /// `sent -> received`, only the deal's buyer.
    pub async fn confirm_received(&self, actor: Actor, token: &str) -> Result<Vec<Notification>> {
        let deal = self.fetch(token).await?;
        if deal.buyer_id != Some(actor.id) {
            return Err(EscrowError::Unauthorized {
                actor: actor.id,
                action: "confirm receipt",
            });
        }
        let deal = self.advance(token, DealStatus::Received).await?;

        Ok(vec![
            Notification::new(
                actor.id,
                Template::ReceiptAcked {
                    token: deal.token.clone(),
                },
            ),
            Notification::new(
                self.config.admin_id,
                Template::ReceiptConfirmed { token: deal.token },
            ),
        ])
    }

    /// `paid|sent|received -> payout_done`, admin only. Accepted from any
    /// of the three intermediate states; receipt confirmation is not a
    /// precondition (manual admin override stays possible).
    pub async fn payout(&self, actor: Actor, token: &str) -> Result<Vec<Notification>> {
        self.require_admin(actor, "pay out a deal")?;
        let deal = self.advance(token, DealStatus::PayoutDone).await?;
        let breakdown = payout::split(deal.amount.value(), self.config.fee_percent);

        let template = Template::PayoutCompleted {
            token: deal.token,
            payout: breakdown.payout,
            fee: breakdown.fee,
        };
        Ok(vec![
            Notification::new(self.config.admin_id, template.clone()),
            Notification::new(deal.seller_id, template),
        ])
    }

    /// `* -> cancelled` from any non-terminal state, admin only. Only the
    /// requesting actor is acknowledged; there is no counterparty
    /// fan-out.
    pub async fn cancel(&self, actor: Actor, token: &str) -> Result<Vec<Notification>> {
        self.require_admin(actor, "cancel a deal")?;
        let deal = self.advance(token, DealStatus::Cancelled).await?;
        Ok(vec![Notification::new(
            actor.id,
            Template::DealCancelled { token: deal.token },
        )])
    }

    /// Binds the joining actor as the deal's buyer and returns payment
    /// instructions. Not a status transition. Re-joining overwrites a
    /// previously bound buyer; see DESIGN.md.
    pub async fn join(&self, actor: Actor, token: &str) -> Result<Vec<Notification>> {
        let deal = self.fetch(token).await?;
        self.deals.set_buyer(token, actor.id).await?;
        Ok(vec![Notification::new(
            actor.id,
            Template::JoinSummary {
                token: deal.token,
                amount: deal.amount.value(),
                description: deal.description,
                wallet_address: self.config.wallet_address.clone(),
                payment_token: deal.payment_token,
            },
        )])
    }

    /// Summaries of every deal where the actor is seller or buyer.
    pub async fn deals_for(&self, actor: Actor) -> Result<Vec<Notification>> {
        let deals = self.deals.for_actor(actor.id).await?;
        if deals.is_empty() {
            return Ok(vec![Notification::new(actor.id, Template::NoDeals)]);
        }
        Ok(deals
            .into_iter()
            .map(|deal| {
                Notification::new(
                    actor.id,
                    Template::DealSummary {
                        token: deal.token,
                        amount: deal.amount.value(),
                        description: deal.description,
                        status: deal.status.to_string(),
                    },
                )
            })
            .collect())
    }

    fn require_admin(&self, actor: Actor, action: &'static str) -> Result<()> {
        if actor.role == ActorRole::Admin {
            Ok(())
        } else {
            Err(EscrowError::Unauthorized {
                actor: actor.id,
                action,
            })
        }
    }

    async fn fetch(&self, token: &str) -> Result<Deal> {
        self.deals
            .get(token)
            .await?
            .ok_or_else(|| EscrowError::NotFound(token.to_string()))
    }

    /// Re-reads the current status and applies the conditional write. The
    /// returned deal reflects the state the guard was evaluated against,
    /// with the new status applied.
    async fn advance(&self, token: &str, to: DealStatus) -> Result<Deal> {
        let mut deal = self.fetch(token).await?;
        if !deal.status.allows(to) {
            return Err(EscrowError::InvalidTransition {
                token: token.to_string(),
                from: deal.status,
                to,
            });
        }
        self.deals.update_status(token, to).await?;
        deal.status = to;
        Ok(deal)
    }
}
