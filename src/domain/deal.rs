use crate::error::EscrowError;
use rand::RngCore;
use rand::rngs::OsRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a positive monetary amount for a deal.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce that deal
/// amounts are always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, EscrowError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(EscrowError::InvalidInput(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = EscrowError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Open,
    Paid,
    Sent,
    Received,
    PayoutDone,
    Cancelled,
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DealStatus::Open => "open",
            DealStatus::Paid => "paid",
            DealStatus::Sent => "sent",
            DealStatus::Received => "received",
            DealStatus::PayoutDone => "payout_done",
            DealStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

impl DealStatus {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, DealStatus::PayoutDone | DealStatus::Cancelled)
    }

    /// Whether `next` is a legal successor of `self`. Statuses only ever
    /// move forward along these edges and never regress.
    pub fn allows(self, next: DealStatus) -> bool {
        use DealStatus::*;
        matches!(
            (self, next),
            (Open, Paid)
                | (Paid, Sent)
                | (Sent, Received)
                | (Paid | Sent | Received, PayoutDone)
                | (Open | Paid | Sent | Received, Cancelled)
        )
    }
}

/// A single escrow transaction between a seller and a buyer for a fixed
/// amount, tracked by token.
///
/// `token` is the primary external reference; `payment_token` is the
/// secondary reference shown to the buyer as a payment memo. Everything
/// except `status` and `buyer_id` is immutable after creation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Deal {
    pub token: String,
    pub seller_id: i64,
    pub seller_name: String,
    /// Set when a buyer opens the deal's join reference.
    pub buyer_id: Option<i64>,
    pub amount: Amount,
    pub description: String,
    pub status: DealStatus,
    pub payment_token: String,
    pub created_at: i64,
}

impl Deal {
    pub fn new(
        seller_id: i64,
        seller_name: impl Into<String>,
        amount: Amount,
        description: impl Into<String>,
    ) -> Self {
        let token = generate_deal_token();
        let payment_token = generate_payment_token(&token);
        Self {
            token,
            seller_id,
            seller_name: seller_name.into(),
            buyer_id: None,
            amount,
            description: description.into(),
            status: DealStatus::Open,
            payment_token,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// The deep-link payload a buyer opens to join this deal.
    pub fn join_reference(&self) -> String {
        format!("join_{}", self.token)
    }
}

/// Generates a 12-hex-char deal token from the OS random source.
pub fn generate_deal_token() -> String {
    let mut bytes = [0u8; 6];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generates the payment memo for a deal: a fixed prefix, the deal token,
/// and 8 extra hex chars of randomness.
pub fn generate_payment_token(deal_token: &str) -> String {
    let mut bytes = [0u8; 4];
    OsRng.fill_bytes(&mut bytes);
    format!("DEAL-{}-{}", deal_token, hex::encode(bytes))
}
