use rust_decimal::{Decimal, RoundingStrategy};

/// Fee and net payout for one deal, both quantized to 7 fractional
/// digits.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct PayoutBreakdown {
    pub fee: Decimal,
    pub payout: Decimal,
}

/// Splits a deal amount into fee and payout.
///
/// `fee_percent` is a percentage, e.g. `3.0` means 3%. Both results are
/// quantized to 7 fractional digits with banker's rounding (midpoints go
/// to the even neighbor), so `fee + payout == amount` holds at that
/// precision. The trailing `rescale` only pads the scale back to 7.
pub fn split(amount: Decimal, fee_percent: Decimal) -> PayoutBreakdown {
    let mut fee = (amount * fee_percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(7, RoundingStrategy::MidpointNearestEven);
    fee.rescale(7);
    let mut payout =
        (amount - fee).round_dp_with_strategy(7, RoundingStrategy::MidpointNearestEven);
    payout.rescale(7);
    PayoutBreakdown { fee, payout }
}
