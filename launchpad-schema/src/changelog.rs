use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChangelogEntry {
    pub sha: String,
    pub message: String,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Subset of the code-hosting API commit listing we read.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCommit {
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
    pub commit: UpstreamCommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCommitDetail {
    pub message: String,
    #[serde(default)]
    pub author: Option<UpstreamCommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl From<UpstreamCommit> for ChangelogEntry {
    fn from(c: UpstreamCommit) -> Self {
        let message = c.commit.message.lines().next().unwrap_or_default().to_string();
        let (author, date) = c
            .commit
            .author
            .map(|a| (a.name, a.date))
            .unwrap_or((None, None));
        Self {
            sha: c.sha.chars().take(7).collect(),
            message,
            author,
            date,
            url: c.html_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_commit_keeps_first_line_and_short_sha() {
        let raw = r#"{
            "sha": "0123456789abcdef",
            "html_url": "https://example.test/c/0123456",
            "commit": {
                "message": "Add tier table\n\nLonger body text",
                "author": {"name": "dev", "date": "2026-01-02T03:04:05Z"}
            }
        }"#;
        let commit: UpstreamCommit = serde_json::from_str(raw).unwrap();
        let entry = ChangelogEntry::from(commit);
        assert_eq!(entry.sha, "0123456");
        assert_eq!(entry.message, "Add tier table");
        assert_eq!(entry.author.as_deref(), Some("dev"));
        assert!(entry.date.is_some());
    }
}
