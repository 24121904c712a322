use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A data record describing one message to deliver to one recipient,
/// decoupled from actual transport delivery. The transport owns
/// rendering, localization and retries; the core only produces these.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Notification {
    pub recipient: i64,
    pub template: Template,
}

impl Notification {
    pub fn new(recipient: i64, template: Template) -> Self {
        Self {
            recipient,
            template,
        }
    }
}

/// Template kind plus parameters for a notification intent.
///
/// The kind names what happened; the transport maps it to localized copy
/// and, where relevant, an action affordance (e.g. `confirm_sent:<token>`
/// for `PaymentConfirmedSeller`).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Template {
    Welcome,
    Menu,
    AskAmount,
    AskDescription,
    ChooseLanguage,
    LanguageSet {
        lang: String,
    },
    DealCreated {
        token: String,
        payment_token: String,
        join_reference: String,
    },
    /// Summary plus payment instructions, sent to a joining buyer.
    JoinSummary {
        token: String,
        amount: Decimal,
        description: String,
        wallet_address: String,
        payment_token: String,
    },
    /// Seller-side payment confirmation; prompts shipment.
    PaymentConfirmedSeller {
        token: String,
    },
    /// Buyer-side payment confirmation; prompts receipt confirmation.
    PaymentConfirmedBuyer {
        token: String,
    },
    ShipmentAcked {
        token: String,
    },
    ShipmentConfirmed {
        token: String,
    },
    ReceiptAcked {
        token: String,
    },
    ReceiptConfirmed {
        token: String,
    },
    PayoutCompleted {
        token: String,
        payout: Decimal,
        fee: Decimal,
    },
    DealCancelled {
        token: String,
    },
    DealSummary {
        token: String,
        amount: Decimal,
        description: String,
        status: String,
    },
    NoDeals,
}
