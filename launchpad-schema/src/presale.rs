use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body of `POST /api/commitments`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitmentRequest {
    pub email: String,
    #[serde(alias = "amountUsd", alias = "amount")]
    pub amount_usd: f64,
    #[serde(default, alias = "walletAddress")]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl CommitmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitmentStatus::Pending => "pending",
            CommitmentStatus::Confirmed => "confirmed",
            CommitmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CommitmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommitmentStatus::Pending),
            "confirmed" => Ok(CommitmentStatus::Confirmed),
            "cancelled" => Ok(CommitmentStatus::Cancelled),
            other => Err(format!("unknown commitment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TierView {
    pub tier_number: i64,
    pub name: String,
    pub min_count: i64,
    /// `None` means the tier is open-ended.
    pub max_count: Option<i64>,
    pub bonus_percent: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitmentResponse {
    pub id: i64,
    pub email: String,
    pub amount_usd: f64,
    pub tier: TierView,
    pub base_tokens: f64,
    pub bonus_tokens: f64,
    pub token_amount: f64,
    pub status: CommitmentStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteResponse {
    pub amount_usd: f64,
    pub token_price_usd: f64,
    pub buyer_count: i64,
    pub tier: TierView,
    pub base_tokens: f64,
    pub bonus_tokens: f64,
    pub total_tokens: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TiersResponse {
    pub tiers: Vec<TierView>,
    pub buyer_count: i64,
    pub current_tier: Option<TierView>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicStats {
    pub signups: i64,
    pub buyers: i64,
    pub raised_usd: f64,
    pub current_tier: Option<TierView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_status_text_round_trips_through_from_str() {
        for status in [
            CommitmentStatus::Pending,
            CommitmentStatus::Confirmed,
            CommitmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<CommitmentStatus>(), Ok(status));
        }
        assert!("refunded".parse::<CommitmentStatus>().is_err());
    }

    #[test]
    fn commitment_request_accepts_camel_case_amount() {
        let req: CommitmentRequest =
            serde_json::from_str(r#"{"email":"a@b.io","amountUsd":250}"#).unwrap();
        assert_eq!(req.amount_usd, 250.0);
        assert!(req.wallet_address.is_none());
    }
}
