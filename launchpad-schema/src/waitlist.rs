use serde::{Deserialize, Serialize};

/// Body of `POST /api/waitlist`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WaitlistSignupRequest {
    pub email: String,

    /// Referral code of the person who shared the link.
    #[serde(default, rename = "ref", alias = "referral_code", alias = "referralCode")]
    pub referral: Option<String>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default, alias = "utmSource")]
    pub utm_source: Option<String>,

    #[serde(default, alias = "utmMedium")]
    pub utm_medium: Option<String>,

    #[serde(default, alias = "utmCampaign")]
    pub utm_campaign: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WaitlistSignupResponse {
    pub position: i64,
    pub referral_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WaitlistStatusResponse {
    pub position: i64,
    pub referral_code: String,
    pub referral_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_accepts_ref_aliases() {
        let req: WaitlistSignupRequest =
            serde_json::from_str(r#"{"email":"a@b.io","ref":"ABCD2345"}"#).unwrap();
        assert_eq!(req.referral.as_deref(), Some("ABCD2345"));

        let req: WaitlistSignupRequest =
            serde_json::from_str(r#"{"email":"a@b.io","referralCode":"XYZ"}"#).unwrap();
        assert_eq!(req.referral.as_deref(), Some("XYZ"));
        assert!(req.utm_source.is_none());
    }
}
