//! Tier selection and token allocation.
//!
//! Tiers are inclusive `[min_count, max_count]` brackets over the cumulative
//! buyer count; `max_count = None` marks the open-ended last bracket.

use crate::db::DbPricingTier;
use crate::error::LaunchpadError;

/// Tiers written on first start when the table is empty.
pub fn default_tiers() -> Vec<DbPricingTier> {
    [
        (1, "Genesis", 0, Some(100), 30.0),
        (2, "Pioneer", 101, Some(500), 20.0),
        (3, "Early", 501, Some(2000), 10.0),
        (4, "Public", 2001, None, 0.0),
    ]
    .into_iter()
    .map(
        |(tier_number, name, min_count, max_count, bonus_percent)| DbPricingTier {
            tier_number,
            name: name.to_string(),
            min_count,
            max_count,
            bonus_percent,
        },
    )
    .collect()
}

/// Pick the tier whose range contains `buyer_count`.
///
/// Counts below the first bracket clamp to the first tier, counts past the
/// last bounded bracket (or falling in a gap) clamp to the highest tier
/// starting at or below the count. `None` only for an empty tier list.
pub fn select_tier(tiers: &[DbPricingTier], buyer_count: i64) -> Option<&DbPricingTier> {
    if let Some(tier) = tiers.iter().find(|t| {
        buyer_count >= t.min_count && t.max_count.is_none_or(|max| buyer_count <= max)
    }) {
        return Some(tier);
    }

    tiers
        .iter()
        .filter(|t| t.min_count <= buyer_count)
        .max_by_key(|t| t.min_count)
        .or_else(|| tiers.iter().min_by_key(|t| t.min_count))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenAllocation {
    pub base_tokens: f64,
    pub bonus_tokens: f64,
    pub total_tokens: f64,
}

/// `base = amount / price`, `bonus = base * bonus_percent / 100`.
pub fn allocate_tokens(amount_usd: f64, token_price_usd: f64, bonus_percent: f64) -> TokenAllocation {
    let base_tokens = amount_usd / token_price_usd;
    let bonus_tokens = base_tokens * bonus_percent / 100.0;
    TokenAllocation {
        base_tokens,
        bonus_tokens,
        total_tokens: base_tokens + bonus_tokens,
    }
}

/// Reject non-finite amounts and amounts outside `[min, max]` (inclusive).
pub fn validate_amount(amount_usd: f64, min_usd: f64, max_usd: f64) -> Result<(), LaunchpadError> {
    if !amount_usd.is_finite() || amount_usd < min_usd || amount_usd > max_usd {
        return Err(LaunchpadError::validation(
            "INVALID_AMOUNT",
            format!("Commitment amount must be between ${min_usd:.0} and ${max_usd:.0}."),
        ));
    }
    Ok(())
}
