//! Email bodies. Every interpolated value goes through [`escape_html`].

use crate::db::{DbCommitment, DbPricingTier, DbWaitlistEntry};
use chrono::{DateTime, Utc};
use url::Url;

pub const WELCOME: &str = "welcome";
pub const COMMITMENT_CONFIRMATION: &str = "commitment_confirmation";
pub const ADMIN_COMMITMENT: &str = "admin_commitment";

pub fn drip_template(day: u32) -> String {
    format!("drip_day_{day}")
}

pub fn countdown_template(hours: u32) -> String {
    format!("countdown_{hours}h")
}

/// A rendered email plus the template name it is logged under.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub template: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct Templates {
    site_url: Url,
}

impl Templates {
    pub fn new(site_url: Url) -> Self {
        Self { site_url }
    }

    pub fn unsubscribe_url(&self, token: &str) -> String {
        let mut url = self
            .site_url
            .join("api/unsubscribe")
            .unwrap_or_else(|_| self.site_url.clone());
        url.query_pairs_mut().append_pair("token", token);
        url.into()
    }

    fn referral_url(&self, code: &str) -> String {
        let mut url = self.site_url.clone();
        url.query_pairs_mut().append_pair("ref", code);
        url.into()
    }

    fn layout(&self, body: &str, unsubscribe_token: Option<&str>) -> String {
        let footer = match unsubscribe_token {
            Some(token) => format!(
                r#"<p style="font-size:12px;color:#888">You are receiving this because you joined the waitlist. <a href="{}">Unsubscribe</a></p>"#,
                escape_html(&self.unsubscribe_url(token))
            ),
            None => String::new(),
        };
        format!(
            r#"<!doctype html><html><body style="font-family:sans-serif;max-width:560px;margin:auto">{body}{footer}</body></html>"#
        )
    }

    pub fn welcome(&self, entry: &DbWaitlistEntry, position: i64) -> RenderedEmail {
        let referral_url = self.referral_url(&entry.referral_code);
        let body = format!(
            "<h1>You're on the list</h1>\
             <p>You are number <strong>{position}</strong> on the waitlist.</p>\
             <p>Share your link to move up: <a href=\"{url}\">{url}</a></p>\
             <p>Your referral code: <code>{code}</code></p>",
            url = escape_html(&referral_url),
            code = escape_html(&entry.referral_code),
        );
        RenderedEmail {
            template: WELCOME.to_string(),
            subject: format!("You're #{position} on the waitlist"),
            html: self.layout(&body, Some(&entry.unsubscribe_token)),
        }
    }

    pub fn commitment_confirmation(
        &self,
        commitment: &DbCommitment,
        tier: &DbPricingTier,
    ) -> RenderedEmail {
        let body = format!(
            "<h1>Commitment received</h1>\
             <p>Amount: <strong>${amount:.2}</strong></p>\
             <p>Tier: {tier} ({bonus}% bonus)</p>\
             <p>Estimated allocation: <strong>{tokens:.2}</strong> tokens</p>\
             <p>This is a non-binding commitment. We will contact you before the sale opens.</p>",
            amount = commitment.amount_usd,
            tier = escape_html(&tier.name),
            bonus = tier.bonus_percent,
            tokens = commitment.token_amount,
        );
        RenderedEmail {
            template: COMMITMENT_CONFIRMATION.to_string(),
            subject: "Your presale commitment".to_string(),
            html: self.layout(&body, None),
        }
    }

    pub fn admin_commitment(&self, commitment: &DbCommitment, tier: &DbPricingTier) -> RenderedEmail {
        let body = format!(
            "<h2>New commitment #{id}</h2>\
             <ul><li>Email: {email}</li><li>Amount: ${amount:.2}</li>\
             <li>Tier: {tier_number} {tier}</li><li>Tokens: {tokens:.2}</li>\
             <li>Wallet: {wallet}</li></ul>",
            id = commitment.id,
            email = escape_html(&commitment.email),
            amount = commitment.amount_usd,
            tier_number = tier.tier_number,
            tier = escape_html(&tier.name),
            tokens = commitment.token_amount,
            wallet = escape_html(commitment.wallet_address.as_deref().unwrap_or("-")),
        );
        RenderedEmail {
            template: ADMIN_COMMITMENT.to_string(),
            subject: format!("New commitment: ${:.2}", commitment.amount_usd),
            html: self.layout(&body, None),
        }
    }

    pub fn drip(&self, day: u32, entry: &DbWaitlistEntry) -> RenderedEmail {
        let (subject, lead) = match day {
            1 => (
                "What we're building",
                "Thanks for joining yesterday. Here is a quick look at what we're building and why.",
            ),
            3 => (
                "Early supporters get more",
                "Presale tiers reward early supporters with a bonus allocation. The earliest tier fills first.",
            ),
            7 => (
                "Invite friends, move up",
                "Every friend who joins with your link moves you up the waitlist.",
            ),
            14 => (
                "Still interested?",
                "It's been two weeks. Here's what has shipped since you joined.",
            ),
            _ => ("News from the team", "Here's what's new since you joined."),
        };
        let body = format!(
            "<h1>{subject}</h1><p>{lead}</p>\
             <p>Your referral link: <a href=\"{url}\">{url}</a></p>",
            url = escape_html(&self.referral_url(&entry.referral_code)),
        );
        RenderedEmail {
            template: drip_template(day),
            subject: subject.to_string(),
            html: self.layout(&body, Some(&entry.unsubscribe_token)),
        }
    }

    pub fn countdown(
        &self,
        hours: u32,
        entry: &DbWaitlistEntry,
        launch_at: DateTime<Utc>,
    ) -> RenderedEmail {
        let remaining = if hours >= 48 && hours % 24 == 0 {
            format!("{} days", hours / 24)
        } else if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{hours} hours")
        };
        let body = format!(
            "<h1>Launch in {remaining}</h1>\
             <p>We go live at <strong>{at}</strong>.</p>\
             <p><a href=\"{site}\">Get ready</a></p>",
            at = launch_at.format("%Y-%m-%d %H:%M UTC"),
            site = escape_html(self.site_url.as_str()),
        );
        RenderedEmail {
            template: countdown_template(hours),
            subject: format!("Launch in {remaining}"),
            html: self.layout(&body, Some(&entry.unsubscribe_token)),
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> DbWaitlistEntry {
        DbWaitlistEntry {
            id: 7,
            email: "a@example.com".to_string(),
            referral_code: "ABCD2345".to_string(),
            referred_by: None,
            referral_count: 0,
            source: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            unsubscribe_token: "tok123".to_string(),
            unsubscribed: false,
            created_at: Utc::now(),
        }
    }

    fn templates() -> Templates {
        Templates::new(Url::parse("https://launch.example.com/").unwrap())
    }

    #[test]
    fn template_names() {
        assert_eq!(drip_template(3), "drip_day_3");
        assert_eq!(countdown_template(72), "countdown_72h");
    }

    #[test]
    fn campaign_emails_carry_unsubscribe_link() {
        let t = templates();
        let drip = t.drip(1, &entry());
        assert_eq!(drip.template, "drip_day_1");
        assert!(
            drip.html
                .contains("https://launch.example.com/api/unsubscribe?token=tok123")
        );

        let countdown = t.countdown(72, &entry(), Utc::now());
        assert_eq!(countdown.subject, "Launch in 3 days");
        assert!(countdown.html.contains("unsubscribe?token=tok123"));
    }

    #[test]
    fn welcome_mentions_position_and_referral_link() {
        let email = templates().welcome(&entry(), 42);
        assert!(email.subject.contains("#42"));
        assert!(email.html.contains("?ref=ABCD2345"));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }
}
