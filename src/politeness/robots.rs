//! robots.txt fetching, caching, and allow/deny decisions.
//!
//! Policies are cached per origin (scheme+host) for the life of the checker.
//! A robots.txt that cannot be fetched or parsed fails open: the URL is
//! treated as allowed and a warning is logged, since a transient network
//! fault is far more likely than an actual disallow.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

/// Parsed robots.txt rules for one origin, scoped to a single user agent.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    rules: Vec<Rule>,
    crawl_delay: Option<Duration>,
}

impl RobotsPolicy {
    /// Parse robots.txt content, keeping the rule group that applies to
    /// `user_agent`. A group naming the agent specifically replaces any
    /// wildcard group seen earlier.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        let mut rules = Vec::new();
        let mut crawl_delay = None;
        let mut applies = false;
        let mut specific_seen = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match directive.trim().to_lowercase().as_str() {
                "user-agent" => {
                    let agent = value.to_lowercase();
                    if agent == "*" {
                        applies = !specific_seen;
                    } else if ua.contains(&agent) || agent.contains(&ua) {
                        if !specific_seen {
                            rules.clear();
                            crawl_delay = None;
                        }
                        applies = true;
                        specific_seen = true;
                    } else {
                        applies = false;
                    }
                }
                "disallow" if applies && !value.is_empty() => rules.push(Rule {
                    allow: false,
                    pattern: value.to_string(),
                }),
                "allow" if applies && !value.is_empty() => rules.push(Rule {
                    allow: true,
                    pattern: value.to_string(),
                }),
                "crawl-delay" if applies => {
                    if let Ok(secs) = value.parse::<f64>() {
                        if secs >= 0.0 {
                            crawl_delay = Some(Duration::from_secs_f64(secs));
                        }
                    }
                }
                _ => {}
            }
        }

        Self { rules, crawl_delay }
    }

    /// Empty policy used when the robots.txt fetch fails.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Longest matching pattern wins; on a tie, allow wins.
    pub fn is_allowed(&self, path: &str) -> bool {
        let mut longest_allow = 0;
        let mut longest_disallow = 0;
        for rule in &self.rules {
            if pattern_matches(path, &rule.pattern) {
                if rule.allow {
                    longest_allow = longest_allow.max(rule.pattern.len());
                } else {
                    longest_disallow = longest_disallow.max(rule.pattern.len());
                }
            }
        }
        longest_allow >= longest_disallow
    }

    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }
}

/// robots.txt pattern match: prefix semantics with `*` wildcards and an
/// optional `$` end anchor.
fn pattern_matches(path: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };
    if !pattern.contains('*') {
        return if anchored {
            path == pattern
        } else {
            path.starts_with(pattern)
        };
    }

    let mut pos = 0;
    for (i, part) in pattern.split('*').enumerate() {
        if part.is_empty() {
            continue;
        }
        match path[pos..].find(part) {
            Some(found) if i > 0 || found == 0 => pos += found + part.len(),
            _ => return false,
        }
    }
    !anchored || pos == path.len()
}

/// Per-origin robots.txt checker bound to one user agent.
pub struct RobotsChecker {
    user_agent: String,
    http: reqwest::Client,
    cache: Mutex<HashMap<String, RobotsPolicy>>,
}

impl RobotsChecker {
    pub fn new(user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        let http = reqwest::Client::builder()
            .timeout(ROBOTS_FETCH_TIMEOUT)
            .user_agent(&user_agent)
            .build()
            .unwrap_or_default();
        Self {
            user_agent,
            http,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Whether `url` may be fetched. Never fails: an unparseable URL or an
    /// unreachable robots.txt is allowed with a warning.
    pub async fn can_fetch(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            warn!("could not parse URL for robots check, assuming allowed: {url}");
            return true;
        };
        let Some(origin) = origin_of(&parsed) else {
            return true;
        };
        let policy = self.policy_for(&origin).await;
        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };
        let allowed = policy.is_allowed(&path);
        if !allowed {
            warn!("URL disallowed by robots.txt: {url}");
        }
        allowed
    }

    /// Crawl-delay directive for the URL's origin, if its robots.txt set one
    /// for this agent.
    pub async fn crawl_delay(&self, url: &str) -> Option<Duration> {
        let parsed = Url::parse(url).ok()?;
        let origin = origin_of(&parsed)?;
        let delay = self.policy_for(&origin).await.crawl_delay();
        if let Some(delay) = delay {
            info!("crawl delay for {origin}: {:.1}s", delay.as_secs_f64());
        }
        delay
    }

    /// Drop the cached policy for one origin, or all of them.
    pub async fn clear_cache(&self, origin: Option<&str>) {
        let mut cache = self.cache.lock().await;
        match origin {
            Some(origin) => {
                cache.remove(origin);
                debug!("cleared robots.txt cache for {origin}");
            }
            None => {
                cache.clear();
                debug!("cleared all robots.txt cache");
            }
        }
    }

    async fn policy_for(&self, origin: &str) -> RobotsPolicy {
        if let Some(policy) = self.cache.lock().await.get(origin) {
            return policy.clone();
        }
        let policy = self.fetch_policy(origin).await;
        self.cache
            .lock()
            .await
            .insert(origin.to_string(), policy.clone());
        policy
    }

    async fn fetch_policy(&self, origin: &str) -> RobotsPolicy {
        let robots_url = format!("{origin}/robots.txt");
        debug!("fetching {robots_url}");
        let body = async {
            let response = self.http.get(&robots_url).send().await?;
            response.error_for_status()?.text().await
        }
        .await;
        match body {
            Ok(content) => {
                info!("loaded robots.txt for {origin}");
                RobotsPolicy::parse(&content, &self.user_agent)
            }
            Err(e) => {
                warn!("could not fetch robots.txt for {origin}, assuming allowed: {e}");
                RobotsPolicy::allow_all()
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn seed_policy(&self, origin: &str, policy: RobotsPolicy) {
        self.cache
            .lock()
            .await
            .insert(origin.to_string(), policy);
    }
}

fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_agent_group_overrides_wildcard() {
        let content = r#"
User-agent: *
Disallow: /private/
Crawl-delay: 2

User-agent: GreatBritishBeerBot
Disallow: /admin/
Crawl-delay: 1
"#;
        let policy = RobotsPolicy::parse(content, "GreatBritishBeerBot/1.0");
        assert!(policy.is_allowed("/beers/punk-ipa"));
        assert!(!policy.is_allowed("/admin/settings"));
        // The specific group replaced the wildcard rules entirely.
        assert!(policy.is_allowed("/private/page"));
        assert_eq!(policy.crawl_delay(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn wildcard_and_anchor_patterns() {
        let content = r#"
User-agent: *
Disallow: /private/
Disallow: /*.pdf$
Allow: /private/readme.txt
"#;
        let policy = RobotsPolicy::parse(content, "TestBot");
        assert!(policy.is_allowed("/beers/index.html"));
        assert!(!policy.is_allowed("/private/secret"));
        assert!(policy.is_allowed("/private/readme.txt"));
        assert!(!policy.is_allowed("/docs/menu.pdf"));
        assert!(policy.is_allowed("/docs/menu.html"));
    }

    #[test]
    fn pattern_matching_edge_cases() {
        assert!(pattern_matches("/admin/users", "/admin/"));
        assert!(!pattern_matches("/public/users", "/admin/"));
        assert!(pattern_matches("/images/cat.jpg", "/images/*.jpg"));
        assert!(pattern_matches("/page.html", "/page.html$"));
        assert!(!pattern_matches("/page.html?query", "/page.html$"));
        assert!(!pattern_matches("/anything", ""));
    }

    #[test]
    fn empty_policy_allows_everything() {
        let policy = RobotsPolicy::allow_all();
        assert!(policy.is_allowed("/anything/at/all"));
        assert_eq!(policy.crawl_delay(), None);
    }

    #[tokio::test]
    async fn unreachable_robots_fails_open() {
        // Port 9 on localhost refuses connections; the fetch fails fast and
        // the checker must answer "allowed" rather than raising.
        let checker = RobotsChecker::new("TestBot/1.0");
        assert!(checker.can_fetch("http://127.0.0.1:9/beers").await);
    }

    #[tokio::test]
    async fn cached_policy_is_used_and_invalidatable() {
        let checker = RobotsChecker::new("TestBot/1.0");
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /beers/", "TestBot/1.0");
        checker.seed_policy("https://example.com", policy).await;

        assert!(!checker.can_fetch("https://example.com/beers/punk").await);
        assert!(checker.can_fetch("https://example.com/about").await);

        let delayed = RobotsPolicy::parse("User-agent: *\nCrawl-delay: 3", "TestBot/1.0");
        checker.seed_policy("https://example.com", delayed).await;
        assert_eq!(
            checker.crawl_delay("https://example.com/beers/punk").await,
            Some(Duration::from_secs(3))
        );

        checker.clear_cache(Some("https://example.com")).await;
        // After invalidation the checker would refetch; nothing cached now.
        assert!(checker.cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn garbage_url_is_allowed() {
        let checker = RobotsChecker::new("TestBot/1.0");
        assert!(checker.can_fetch("not a url at all").await);
    }
}
