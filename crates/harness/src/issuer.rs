//! Request issuers: how a resolved page visit becomes one call against
//! the system under test.
//!
//! The engine consumes only success or failure; response payloads are
//! never inspected.

use async_trait::async_trait;
use auctionbench_model::TransitionTable;
use thiserror::Error;

/// Error from issuing one simulated request.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("no url mapped for state {0}")]
    UnmappedState(usize),
}

/// Issues one simulated request for a visited page.
#[async_trait]
pub trait RequestIssuer: Send + Sync {
    async fn issue(&self, state: usize) -> Result<(), IssueError>;
}

/// Issuer that does nothing and always succeeds. Used for dry runs and
/// tests, where only the emulation itself is being measured.
#[derive(Debug, Default)]
pub struct NoopIssuer;

#[async_trait]
impl RequestIssuer for NoopIssuer {
    async fn issue(&self, _state: usize) -> Result<(), IssueError> {
        Ok(())
    }
}

/// Application-server flavor of the target site; decides how page URLs
/// are derived from state names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Script pages: `<base>/<Page>.php`.
    Php,
    /// Servlet front end: `<base>/servlet/<Page>`.
    Servlets,
    /// EJB front end; same URL shape as servlets, the tier difference
    /// lives in the base URL's web-app context.
    Ejb,
}

/// HTTP issuer: one GET per visited page, success meaning any 2xx.
pub struct HttpIssuer {
    client: reqwest::Client,
    /// Indexed by state; `None` for the Back and End pseudo-states.
    urls: Vec<Option<String>>,
}

impl HttpIssuer {
    /// Build an issuer covering every page of `table`, rooted at
    /// `base_url`.
    pub fn new(base_url: &str, backend: Backend, table: &TransitionTable) -> Self {
        let base = base_url.trim_end_matches('/');
        let urls = table
            .names()
            .iter()
            .enumerate()
            .map(|(state, name)| {
                if state >= table.origin_count() {
                    return None;
                }
                let page = page_slug(name);
                Some(match backend {
                    Backend::Php => format!("{base}/{page}.php"),
                    Backend::Servlets | Backend::Ejb => format!("{base}/servlet/{page}"),
                })
            })
            .collect();
        Self {
            client: reqwest::Client::new(),
            urls,
        }
    }

    /// The URL a given state resolves to, if it is a real page.
    pub fn url_for(&self, state: usize) -> Option<&str> {
        self.urls.get(state).and_then(|u| u.as_deref())
    }
}

#[async_trait]
impl RequestIssuer for HttpIssuer {
    async fn issue(&self, state: usize) -> Result<(), IssueError> {
        let url = self
            .url_for(state)
            .ok_or(IssueError::UnmappedState(state))?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(IssueError::Status(status.as_u16()))
        }
    }
}

/// Collapse a display name like `AboutMe (auth form)` into a URL-safe
/// page name.
fn page_slug(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use auctionbench_model::ThinkTime;

    fn table() -> TransitionTable {
        let text = [
            "Transition table\turls",
            "",
            "To >>>",
            "From vvvv\tHome\tAboutMe (auth form)",
            "Home\t0\t0.5\t0",
            "AboutMe (auth form)\t0.5\t0\t0",
            "Back probability\t0.25\t0.25\t0",
            "End of Session\t0.25\t0.25\t0",
        ]
        .join("\n");
        TransitionTable::parse(&text, ThinkTime::Fixed).unwrap()
    }

    #[test]
    fn php_urls_are_script_pages() {
        let issuer = HttpIssuer::new("http://sut:8080/auction/", Backend::Php, &table());
        assert_eq!(issuer.url_for(0), Some("http://sut:8080/auction/Home.php"));
        assert_eq!(
            issuer.url_for(1),
            Some("http://sut:8080/auction/AboutMeauthform.php")
        );
    }

    #[test]
    fn servlet_urls_share_the_servlet_prefix() {
        let t = table();
        let servlets = HttpIssuer::new("http://sut", Backend::Servlets, &t);
        let ejb = HttpIssuer::new("http://sut", Backend::Ejb, &t);
        assert_eq!(servlets.url_for(0), Some("http://sut/servlet/Home"));
        assert_eq!(ejb.url_for(0), Some("http://sut/servlet/Home"));
    }

    #[test]
    fn pseudo_states_have_no_url() {
        let t = table();
        let issuer = HttpIssuer::new("http://sut", Backend::Php, &t);
        assert_eq!(issuer.url_for(t.back_index()), None);
        assert_eq!(issuer.url_for(t.end_index()), None);
    }

    #[tokio::test]
    async fn noop_issuer_always_succeeds() {
        assert!(NoopIssuer.issue(3).await.is_ok());
    }
}
