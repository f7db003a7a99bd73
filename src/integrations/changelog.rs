use crate::config::ChangelogConfig;
use crate::error::{IsRetryable, LaunchpadError};
use backon::{ExponentialBuilder, Retryable};
use launchpad_schema::ChangelogEntry;
use launchpad_schema::changelog::UpstreamCommit;
use moka::future::Cache;
use reqwest::header::{ACCEPT, HeaderValue};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};
use url::Url;

const CACHE_KEY: &str = "commits";

type ChangelogCache = Cache<&'static str, Arc<Vec<ChangelogEntry>>>;

/// Recent commits from the code-hosting API, cached for `cache_ttl_secs`.
///
/// Concurrent requests on a cold cache share one upstream fetch. Upstream
/// failures serve [`fallback_entries`]; the fallback is never cached so the
/// next request tries upstream again.
#[derive(Clone)]
pub struct ChangelogService {
    client: reqwest::Client,
    commits_url: Option<Url>,
    token: Option<String>,
    cache: ChangelogCache,
    retry_policy: ExponentialBuilder,
}

impl ChangelogService {
    pub fn new(cfg: &ChangelogConfig, client: reqwest::Client) -> Self {
        let commits_url = commits_url(cfg);
        if commits_url.is_none() {
            debug!("Changelog repository not configured, serving fallback entries");
        }

        let cache = ChangelogCache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(cfg.cache_ttl_secs))
            .build();

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_max_times(1)
            .with_jitter();

        Self {
            client,
            commits_url,
            token: cfg.token.clone().filter(|t| !t.trim().is_empty()),
            cache,
            retry_policy,
        }
    }

    pub async fn recent(&self) -> Arc<Vec<ChangelogEntry>> {
        let Some(url) = self.commits_url.as_ref() else {
            return Arc::new(fallback_entries());
        };

        let loaded = self
            .cache
            .try_get_with(CACHE_KEY, async { self.fetch(url).await.map(Arc::new) })
            .await;
        match loaded {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Changelog fetch failed, serving fallback");
                Arc::new(fallback_entries())
            }
        }
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<ChangelogEntry>, LaunchpadError> {
        let this = self;
        let op = move || async move {
            let mut req = this
                .client
                .get(url.clone())
                .header(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
            if let Some(token) = this.token.as_deref() {
                req = req.bearer_auth(token);
            }

            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(LaunchpadError::UpstreamStatus(status));
            }
            let commits: Vec<UpstreamCommit> = resp.json().await?;
            Ok(commits.into_iter().map(ChangelogEntry::from).collect())
        };

        op.retry(self.retry_policy)
            .when(|e| e.is_retryable())
            .await
    }
}

fn commits_url(cfg: &ChangelogConfig) -> Option<Url> {
    let owner = cfg.owner.trim();
    let repo = cfg.repo.trim();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    let mut url = cfg
        .api_base
        .join(&format!("repos/{owner}/{repo}/commits"))
        .ok()?;
    url.query_pairs_mut()
        .append_pair("per_page", &cfg.per_page.to_string());
    Some(url)
}

/// Static entries shown when the upstream cannot be reached.
pub fn fallback_entries() -> Vec<ChangelogEntry> {
    [
        "Presale tiers and commitment tracking",
        "Waitlist referrals and position tracking",
        "Launch countdown notifications",
    ]
    .into_iter()
    .map(|message| ChangelogEntry {
        sha: String::new(),
        message: message.to_string(),
        author: None,
        date: None,
        url: None,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_server::{JSON, TEXT, spawn_upstream};
    use reqwest::StatusCode;
    use serde_json::json;

    fn cfg(base: &Url) -> ChangelogConfig {
        ChangelogConfig {
            api_base: base.clone(),
            owner: "acme".to_string(),
            repo: "wallet".to_string(),
            token: Some("ghp_test".to_string()),
            per_page: 5,
            cache_ttl_secs: 600,
        }
    }

    fn commit(sha: &str, msg: &str) -> serde_json::Value {
        json!({
            "sha": sha,
            "html_url": format!("https://example.test/c/{sha}"),
            "commit": {"message": msg, "author": {"name": "dev", "date": "2026-03-01T00:00:00Z"}}
        })
    }

    #[test]
    fn commits_url_requires_owner_and_repo() {
        let mut c = cfg(&Url::parse("https://api.github.com/").unwrap());
        assert_eq!(
            commits_url(&c).unwrap().as_str(),
            "https://api.github.com/repos/acme/wallet/commits?per_page=5"
        );
        c.repo.clear();
        assert!(commits_url(&c).is_none());
    }

    #[tokio::test]
    async fn recent_fetches_once_then_serves_cache() {
        let body = json!([
            commit("aaaaaaaaaa", "First\n\nbody"),
            commit("bbbbbbbbbb", "Second"),
        ]);
        let (base, upstream) =
            spawn_upstream(vec![(StatusCode::OK, JSON, body.to_string())]).await;

        let svc = ChangelogService::new(&cfg(&base), reqwest::Client::new());
        let first = svc.recent().await;
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].sha, "aaaaaaa");
        assert_eq!(first[0].message, "First");

        let second = svc.recent().await;
        assert_eq!(first, second);

        let reqs = upstream.requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].path, "/repos/acme/wallet/commits");
        assert_eq!(reqs[0].query.as_deref(), Some("per_page=5"));
        assert_eq!(reqs[0].header("authorization"), Some("Bearer ghp_test"));
    }

    #[tokio::test]
    async fn concurrent_cold_requests_share_one_fetch() {
        let body = json!([commit("cccccccccc", "Third")]);
        let (base, upstream) =
            spawn_upstream(vec![(StatusCode::OK, JSON, body.to_string())]).await;

        let svc = ChangelogService::new(&cfg(&base), reqwest::Client::new());
        let (a, b, c) = tokio::join!(svc.recent(), svc.recent(), svc.recent());
        assert_eq!(a.len(), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(upstream.requests().len(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_serves_uncached_fallback() {
        let (base, upstream) =
            spawn_upstream(vec![(StatusCode::NOT_FOUND, TEXT, "missing".to_string())]).await;

        let svc = ChangelogService::new(&cfg(&base), reqwest::Client::new());
        assert_eq!(*svc.recent().await, fallback_entries());
        assert_eq!(*svc.recent().await, fallback_entries());
        // 404 is not retried, and the fallback is not cached.
        assert_eq!(upstream.requests().len(), 2);
    }
}
