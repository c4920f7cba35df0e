use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref SEL_BODY: Selector = Selector::parse("body").expect("valid selector");
    static ref SEL_A: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Elements whose text never reaches the index.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template", "head", "title", "meta"];

#[derive(Debug, Default)]
pub struct ExtractedPage {
    /// Visible text, whitespace collapsed.
    pub text: String,
    /// Raw `href` values in document order.
    pub hrefs: Vec<String>,
}

pub fn extract(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);
    let hrefs = doc
        .select(&SEL_A)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect();
    let root = doc.select(&SEL_BODY).next().unwrap_or_else(|| doc.root_element());
    ExtractedPage { text: visible_text(root), hrefs }
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|e| HIDDEN.contains(&e.name()));
        if !hidden {
            parts.extend(text.split_whitespace());
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_scripts_and_styles() {
        let page = extract(
            r#"<html><head><title>T</title><style>.x{}</style></head>
            <body><h1>Robotics  Lab</h1><script>var hidden = 1;</script>
            <p>Open <a href="/join">positions</a></p></body></html>"#,
        );
        assert_eq!(page.text, "Robotics Lab Open positions");
        assert_eq!(page.hrefs, vec!["/join".to_string()]);
    }

    #[test]
    fn anchors_without_href_are_ignored() {
        let page = extract(r#"<body><a name="x">n</a><a href="">e</a></body>"#);
        assert_eq!(page.hrefs, vec![String::new()]);
    }
}
