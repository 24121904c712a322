use rust_decimal::Decimal;

/// Process-wide configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity of the single trusted operator.
    pub admin_id: i64,
    /// Fee rate in percent, e.g. 3.0 means 3%.
    pub fee_percent: Decimal,
    /// Wallet address shown to buyers as the payment destination.
    pub wallet_address: String,
}

impl Config {
    pub fn new(admin_id: i64, fee_percent: Decimal, wallet_address: impl Into<String>) -> Self {
        Self {
            admin_id,
            fee_percent,
            wallet_address: wallet_address.into(),
        }
    }
}
