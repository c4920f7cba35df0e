//! URL identity and link eligibility rules.

use reqwest::Url;
use std::collections::HashSet;

/// Paths ending in these point at resources that are not crawlable pages.
pub const SKIPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".avi", ".mp4", ".jpg", ".png", ".gif",
    ".gz", ".rar", ".tar", ".rv", ".tgz", ".zip", ".exe", ".js", ".css",
];

/// Canonical identity of a URL: no fragment, no leading `www.` on the host.
pub fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    let stripped = url.host_str().and_then(|h| h.strip_prefix("www.")).map(str::to_string);
    if let Some(host) = stripped {
        if url.set_host(Some(&host)).is_err() {
            tracing::debug!(url = %url, "could not strip www prefix");
        }
    }
    url
}

/// Parse a user-supplied seed; a bare host gets `https://`.
pub fn parse_seed(seed: &str) -> Result<Url, url::ParseError> {
    let seed = seed.trim();
    Url::parse(seed)
        .or_else(|_| Url::parse(&format!("https://{seed}")))
        .map(normalize)
}

/// `host[:port]`, empty for URLs without a host.
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        _ => String::new(),
    }
}

/// `scheme://host[:port]` of a page.
pub fn base_of(url: &Url) -> String {
    match authority(url) {
        a if a.is_empty() => url.scheme().to_string(),
        a => format!("{}://{}", url.scheme(), a),
    }
}

pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Rejects resource extensions and contact links (`@`).
pub fn is_good(url: &Url) -> bool {
    if url.as_str().contains('@') {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    !SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Substring match on the authority. No filter (or an empty one) accepts everything.
pub fn in_domain(url: &Url, domain: Option<&str>) -> bool {
    match domain {
        None => true,
        Some(d) if d.is_empty() => true,
        Some(d) => authority(url).contains(d),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Link(Url),
    Unknown(String),
}

/// Resolve an `href` found on `page`.
///
/// `/...` and `#...` hang off the page's scheme and authority; anything carrying the page's
/// base or starting with `http` is absolute; everything else is unknown.
pub fn resolve(page: &Url, href: &str) -> Anchor {
    let href = href.trim();
    let base = base_of(page);
    let parsed = if href.starts_with("//") {
        page.join(href)
    } else if href.starts_with('/') || href.starts_with('#') {
        Url::parse(&format!("{base}{href}"))
    } else if href.contains(&base) || href.starts_with("http") {
        Url::parse(href).or_else(|_| page.join(href))
    } else {
        return Anchor::Unknown(href.to_string());
    };
    match parsed {
        Ok(u) if is_http(&u) => Anchor::Link(normalize(u)),
        _ => Anchor::Unknown(href.to_string()),
    }
}

/// Links of one page split into crawl-eligible links and unknown anchors.
#[derive(Debug, Default)]
pub struct PageLinks {
    /// Eligible links in first-seen order, without repeats.
    pub outgoing: Vec<Url>,
    pub unknown: Vec<String>,
}

pub fn classify<S: AsRef<str>>(page: &Url, hrefs: &[S], domain: Option<&str>) -> PageLinks {
    let mut links = PageLinks::default();
    let mut seen = HashSet::new();
    for href in hrefs {
        match resolve(page, href.as_ref()) {
            Anchor::Link(u) => {
                if in_domain(&u, domain) && is_good(&u) && seen.insert(u.as_str().to_string()) {
                    links.outgoing.push(u);
                }
            }
            Anchor::Unknown(a) => links.unknown.push(a),
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url { Url::parse("https://cs.uni.edu/dept/people.html").unwrap() }

    #[test]
    fn www_and_fragment_collapse() {
        let u = normalize(Url::parse("https://www.cs.uni.edu/a#top").unwrap());
        assert_eq!(u.as_str(), "https://cs.uni.edu/a");
        assert_eq!(parse_seed("www.uni.edu").unwrap().as_str(), "https://uni.edu/");
    }

    #[test]
    fn relative_anchors_use_authority() {
        assert_eq!(resolve(&page(), "/grad"), Anchor::Link(Url::parse("https://cs.uni.edu/grad").unwrap()));
        assert_eq!(resolve(&page(), "#main"), Anchor::Link(Url::parse("https://cs.uni.edu/").unwrap()));
        assert_eq!(resolve(&page(), "http://other.org/x"), Anchor::Link(Url::parse("http://other.org/x").unwrap()));
    }

    #[test]
    fn other_anchors_are_unknown() {
        assert_eq!(resolve(&page(), "contact.html"), Anchor::Unknown("contact.html".into()));
        assert_eq!(resolve(&page(), "mailto:a@b.c"), Anchor::Unknown("mailto:a@b.c".into()));
        assert_eq!(resolve(&page(), ""), Anchor::Unknown(String::new()));
    }

    #[test]
    fn goodness_rejects_resources_and_contacts() {
        assert!(!is_good(&Url::parse("https://a.edu/file.PDF").unwrap()));
        assert!(!is_good(&Url::parse("https://a.edu/app.js").unwrap()));
        assert!(!is_good(&Url::parse("https://a.edu/u/x@y").unwrap()));
        assert!(is_good(&Url::parse("https://a.edu/data.json").unwrap()));
    }

    #[test]
    fn domain_is_authority_substring() {
        let u = Url::parse("https://cs.uni.edu/x").unwrap();
        assert!(in_domain(&u, Some("uni.edu")));
        assert!(!in_domain(&u, Some("other.edu")));
        assert!(in_domain(&u, Some("")));
        assert!(in_domain(&u, None));

        let with_port = Url::parse("http://uni.edu:8080/x").unwrap();
        assert_eq!(authority(&with_port), "uni.edu:8080");
        assert!(in_domain(&with_port, Some("uni.edu:8080")));
        assert!(!in_domain(&u, Some("uni.edu:8080")));
        assert_eq!(base_of(&with_port), "http://uni.edu:8080");
    }

    #[test]
    fn classify_dedups_and_filters() {
        let hrefs = ["/a", "/a#x", "https://elsewhere.org/", "/b.zip", "notes.txt"];
        let links = classify(&page(), &hrefs, Some("uni.edu"));
        assert_eq!(links.outgoing, vec![Url::parse("https://cs.uni.edu/a").unwrap()]);
        assert_eq!(links.unknown, vec!["notes.txt".to_string()]);
    }
}
