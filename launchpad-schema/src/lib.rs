pub mod admin;
pub mod changelog;
pub mod chat;
pub mod events;
pub mod presale;
pub mod site;
pub mod waitlist;

pub use admin::{CampaignReport, DashboardStats, Page, TemplateReport};
pub use changelog::ChangelogEntry;
pub use chat::{ChatMessage, ChatRequest, ChatRole};
pub use events::MarketingEventRequest;
pub use presale::{
    CommitmentRequest, CommitmentResponse, CommitmentStatus, PublicStats, QuoteResponse,
    TierView, TiersResponse,
};
pub use site::SiteConfig;
pub use waitlist::{WaitlistSignupRequest, WaitlistSignupResponse, WaitlistStatusResponse};
