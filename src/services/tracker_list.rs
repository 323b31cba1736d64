//! Known tracker domains and host matching.

/// Built-in tracker domains. A host matches a domain exactly or as a
/// subdomain of it.
const TRACKER_DOMAINS: &[&str] = &[
    // Google
    "doubleclick.net", "google-analytics.com", "googletagmanager.com",
    "googleadservices.com", "googlesyndication.com",
    // Facebook / Meta
    "facebook.net",
    // Amazon
    "amazon-adsystem.com", "adsystem.com",
    // Analytics & tracking
    "scorecardresearch.com", "quantserve.com", "hotjar.com", "mixpanel.com",
    "segment.io", "amplitude.com",
    // Ad networks
    "moatads.com", "outbrain.com", "taboola.com", "criteo.com", "criteo.net",
    "adnxs.com", "rubiconproject.com", "pubmatic.com",
    // Other
    "bing.com",
];

/// Tracker blocklist, built-ins plus configured extras.
#[derive(Debug, Clone)]
pub struct TrackerList {
    domains: Vec<String>,
}

impl TrackerList {
    pub fn new(extra_domains: &[String]) -> Self {
        let mut domains: Vec<String> = TRACKER_DOMAINS.iter().map(|d| d.to_string()).collect();
        for domain in extra_domains {
            let domain = domain.trim().trim_start_matches('.').to_lowercase();
            if !domain.is_empty() && !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        Self { domains }
    }

    pub fn is_tracker(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        self.domains.iter().any(|domain| {
            host == *domain
                || (host.len() > domain.len()
                    && host.ends_with(domain.as_str())
                    && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
        })
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl Default for TrackerList {
    fn default() -> Self {
        Self::new(&[])
    }
}
