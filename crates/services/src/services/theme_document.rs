//! Google Fonts link building and HTML assembly.

use db::models::theme::FontPair;
use utils::html::escape_html;

const GOOGLE_FONTS_CSS2: &str = "https://fonts.googleapis.com/css2";

/// Used when neither the per-domain nor the `minimal` base template can be
/// fetched from storage.
pub const FALLBACK_BASE_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{domain}}</title>
<link rel="canonical" href="{{url}}">
</head>
<body>
<main class="container">
<article>
<header class="hero">
<h1>{{host}}</h1>
<p>Theme preview</p>
</header>
<section class="card">
<h2>Sample section</h2>
<p>This page previews the generated theme for <a href="{{url}}">{{host}}</a>.</p>
<blockquote>Typography, colour and spacing all come from the seed.</blockquote>
<ul><li>Palette</li><li>Font pairing</li><li>Layout</li></ul>
<pre><code>seed -&gt; palette -&gt; fonts -&gt; layout</code></pre>
</section>
</article>
</main>
</body>
</html>
"#;

/// CSS2 API URL for the heading family (400;700) and, when different, the
/// body family (400;600). Empty when no family is set.
pub fn google_fonts_href(fonts: &FontPair) -> String {
    let heading = fonts.heading.trim();
    let body = fonts.body.trim();

    let mut families = Vec::with_capacity(2);
    if !heading.is_empty() {
        families.push(format!("family={}:wght@400;700", family_param(heading)));
    }
    if !body.is_empty() && body != heading {
        families.push(format!("family={}:wght@400;600", family_param(body)));
    }

    if families.is_empty() {
        return String::new();
    }
    format!("{}?{}&display=swap", GOOGLE_FONTS_CSS2, families.join("&"))
}

fn family_param(name: &str) -> String {
    name.replace(' ', "+")
}

/// Find-replace of `{{domain}}`, `{{url}}` and `{{host}}` with the
/// HTML-escaped domain.
pub fn substitute_placeholders(base_html: &str, domain: &str) -> String {
    let domain = escape_html(domain);
    base_html
        .replace("{{domain}}", &domain)
        .replace("{{url}}", &format!("https://{domain}"))
        .replace("{{host}}", &domain)
}

/// Markup injected into the base document: font links (when any) followed
/// by the inline theme stylesheet.
pub fn head_injection(css: &str, fonts_href: &str, domain: &str) -> String {
    let mut out = String::new();
    if !fonts_href.is_empty() {
        out.push_str(r#"<link rel="preconnect" href="https://fonts.googleapis.com">"#);
        out.push('\n');
        out.push_str(
            r#"<link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>"#,
        );
        out.push('\n');
        out.push_str(&format!(r#"<link rel="stylesheet" href="{fonts_href}">"#));
        out.push('\n');
    }
    out.push_str(&format!(
        "<style id=\"rtheme-{}\">\n{}</style>\n",
        escape_html(domain),
        css
    ));
    out
}

/// Inserts the theme before the first `</head>`, or prepends it when the
/// base document has no head.
pub fn build_html_document(base_html: &str, css: &str, fonts_href: &str, domain: &str) -> String {
    let base = substitute_placeholders(base_html, domain);
    let injection = head_injection(css, fonts_href, domain);

    match base.find("</head>") {
        Some(idx) => {
            let mut out = String::with_capacity(base.len() + injection.len());
            out.push_str(&base[..idx]);
            out.push_str(&injection);
            out.push_str(&base[idx..]);
            out
        }
        None => format!("{injection}{base}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fonts_href_two_families() {
        let href = google_fonts_href(&FontPair::new("Playfair Display", "Inter"));
        assert_eq!(
            href,
            "https://fonts.googleapis.com/css2?family=Playfair+Display:wght@400;700&family=Inter:wght@400;600&display=swap"
        );
    }

    #[test]
    fn test_fonts_href_identical_families_listed_once() {
        let href = google_fonts_href(&FontPair::new("Georgia", "Georgia"));
        assert_eq!(href.matches("family=").count(), 1);
        assert_eq!(
            href,
            "https://fonts.googleapis.com/css2?family=Georgia:wght@400;700&display=swap"
        );
    }

    #[test]
    fn test_fonts_href_empty_when_unset() {
        assert_eq!(google_fonts_href(&FontPair::new("", "")), "");
    }

    #[test]
    fn test_fonts_href_body_only() {
        assert_eq!(
            google_fonts_href(&FontPair::new("", "Source Sans 3")),
            "https://fonts.googleapis.com/css2?family=Source+Sans+3:wght@400;600&display=swap"
        );
    }

    #[test]
    fn test_placeholders_replaced_everywhere() {
        let out = substitute_placeholders("{{domain}} {{url}} {{host}} {{domain}}", "a.io");
        assert_eq!(out, "a.io https://a.io a.io a.io");
    }

    #[test]
    fn test_placeholder_domain_is_escaped() {
        let out = substitute_placeholders("<title>{{domain}}</title>", "a.io<script>");
        assert_eq!(out, "<title>a.io&lt;script&gt;</title>");
    }

    #[test]
    fn test_injects_before_head_close() {
        let base = "<html><head><title>{{domain}}</title></head><body></body></html>";
        let html = build_html_document(base, "body{}", "", "a.io");
        assert_eq!(
            html,
            "<html><head><title>a.io</title><style id=\"rtheme-a.io\">\nbody{}</style>\n</head><body></body></html>"
        );
    }

    #[test]
    fn test_prepends_once_without_head() {
        let base = "<p>no head here</p>\n<p>{{host}}</p>";
        let html = build_html_document(base, "p{}", "https://fonts.example/x", "a.io");

        assert_eq!(html.matches("<style id=\"rtheme-a.io\">").count(), 1);
        assert_eq!(html.matches(r#"rel="stylesheet""#).count(), 1);
        assert!(html.ends_with("<p>no head here</p>\n<p>a.io</p>"));
        assert!(html.starts_with(r#"<link rel="preconnect""#));
    }

    #[test]
    fn test_style_id_is_escaped() {
        let html = build_html_document("</head>", "", "", "a\"b<c>");
        assert!(html.contains("<style id=\"rtheme-a&quot;b&lt;c&gt;\">"));
    }

    #[test]
    fn test_fallback_template_has_head_and_no_theme_style() {
        assert_eq!(FALLBACK_BASE_HTML.matches("</head>").count(), 1);
        assert!(!FALLBACK_BASE_HTML.contains("<style"));
    }
}
