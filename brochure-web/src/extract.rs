//! HTML to [`Page`] extraction.
//!
//! Parsing goes through `scraper` (html5ever), which recovers from unclosed
//! tags and missing structure, so extraction never fails. Scripting is off
//! while building the tree, so `<noscript>` content is parsed as elements
//! rather than kept as one raw markup string.

use std::cell::Cell;

use html5ever::driver::{self, ParseOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::tree_builder::TreeBuilderOpts;
use scraper::node::Node;
use scraper::{ElementRef, Html, HtmlTreeSink, Selector};

/// Title used when a document has no (non-empty) `<title>`.
pub const NO_TITLE: &str = "No title found";

/// Subtrees dropped from the body before text extraction.
const STRIPPED_TAGS: &[&str] = &["script", "style", "img", "input"];

/// Elements whose children are unparsed markup; their text is never visible.
const RAW_MARKUP_TAGS: &[&str] = &["iframe", "noembed", "noframes"];

/// A fetched page reduced to what the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub title: String,
    /// Visible body text, one trimmed text node per line. Never contains markup.
    pub body_text: String,
    /// Every anchor href starting with `http`, in document order, duplicates kept.
    pub outbound_links: Vec<String>,
}

impl Page {
    /// Title and text rendered as a section body for the aggregated document.
    pub fn contents(&self) -> String {
        format!(
            "Webpage Title:\n{}\nWebpage Contents:\n{}\n\n",
            self.title, self.body_text
        )
    }
}

/// Parse `raw` (decoded lossily as UTF-8) into a [`Page`].
pub fn extract(url: &str, raw: &[u8]) -> Page {
    let html = String::from_utf8_lossy(raw);
    let doc = parse_without_scripting(&html);

    let title = extract_title(&doc);
    // html5ever synthesizes a <body> for every document; only honor one present in source.
    let body_text = if has_body_tag(&html) {
        extract_body_text(&doc)
    } else {
        String::new()
    };
    let outbound_links = extract_links(&doc);

    tracing::debug!(
        url,
        title = %title,
        text_chars = body_text.len(),
        links = outbound_links.len(),
        "page.extracted"
    );

    Page {
        url: url.to_string(),
        title,
        body_text,
        outbound_links,
    }
}

fn parse_without_scripting(html: &str) -> Html {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    driver::parse_document(HtmlTreeSink::new(Html::new_document()), opts).one(html)
}

/// Records whether the token stream carries a real `<body>` start tag.
///
/// Mirrors the tree builder's raw-text switches so tags spelled inside
/// `<script>`, `<style>` or `<textarea>` are not mistaken for markup.
/// Comments and attribute values never produce tag tokens.
#[derive(Default)]
struct BodyTagSink {
    seen: Cell<bool>,
}

impl TokenSink for BodyTagSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        if tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }
        match &*tag.name {
            "body" => {
                self.seen.set(true);
                TokenSinkResult::Continue
            }
            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
            "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            "plaintext" => TokenSinkResult::Plaintext,
            _ => TokenSinkResult::Continue,
        }
    }
}

fn has_body_tag(html: &str) -> bool {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    let tokenizer = Tokenizer::new(BodyTagSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.seen.get()
}

fn extract_title(doc: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|sel| {
            doc.select(&sel)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

fn extract_body_text(doc: &Html) -> String {
    let Ok(body_sel) = Selector::parse("body") else {
        return String::new();
    };
    let mut lines = Vec::new();
    if let Some(body) = doc.select(&body_sel).next() {
        collect_text(body, &mut lines);
    }
    lines.join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    out.push(t.to_string());
                }
            }
            Node::Element(el)
                if STRIPPED_TAGS.contains(&el.name()) || RAW_MARKUP_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn extract_links(doc: &Html) -> Vec<String> {
    let Ok(link_sel) = Selector::parse("a") else {
        return Vec::new();
    };
    doc.select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("http"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACME: &str = r#"<html><head><title>Acme</title></head><body><a href="https://acme.com/about">About</a><a href="/careers">Careers</a><p>Hi</p></body></html>"#;

    #[test]
    fn acme_landing_page() {
        let page = extract("https://acme.com", ACME.as_bytes());
        assert_eq!(page.title, "Acme");
        assert_eq!(page.outbound_links, vec!["https://acme.com/about"]);
        assert_eq!(page.body_text, "About\nCareers\nHi");
    }

    #[test]
    fn missing_title_uses_placeholder() {
        let page = extract("https://x.test", b"<html><body><p>text</p></body></html>");
        assert_eq!(page.title, NO_TITLE);

        let page = extract("https://x.test", b"<title>   </title><body>x</body>");
        assert_eq!(page.title, NO_TITLE);
    }

    #[test]
    fn missing_body_gives_empty_text() {
        let page = extract(
            "https://x.test",
            b"<html><head><title>Only head</title></head></html>",
        );
        assert_eq!(page.title, "Only head");
        assert_eq!(page.body_text, "");

        let page = extract("https://x.test", b"<p>stray paragraph</p>");
        assert_eq!(page.body_text, "");
    }

    #[test]
    fn stripped_subtrees_never_reach_text() {
        let html = r#"<html><body>
            <h1>Welcome</h1>
            <script>var secret = "SCRIPT_TEXT";</script>
            <style>.hidden { color: red } /* STYLE_TEXT */</style>
            <img src="a.png" alt="IMG_ALT">
            <input value="INPUT_VALUE">
            <div><p>Visible <b>bold</b></p><script>nested("SCRIPT_TEXT")</script></div>
        </body></html>"#;
        let page = extract("https://x.test", html.as_bytes());
        for marker in ["SCRIPT_TEXT", "STYLE_TEXT", "IMG_ALT", "INPUT_VALUE"] {
            assert!(!page.body_text.contains(marker), "{marker} leaked");
        }
        assert_eq!(page.body_text, "Welcome\nVisible\nbold");
    }

    #[test]
    fn link_filter_is_http_prefix_and_keeps_duplicates() {
        let html = r##"<body>
            <a href="https://a.test/x">1</a>
            <a href="http://a.test/y">2</a>
            <a href="https://a.test/x">dup</a>
            <a href="mailto:hi@a.test">mail</a>
            <a href="#top">frag</a>
            <a href="">empty</a>
            <a>no href</a>
            <a href="HTTPS://a.test/upper">upper</a>
            <a href="/relative">rel</a>
        </body>"##;
        let page = extract("https://a.test", html.as_bytes());
        assert_eq!(
            page.outbound_links,
            vec!["https://a.test/x", "http://a.test/y", "https://a.test/x"]
        );
    }

    #[test]
    fn body_text_never_contains_markup() {
        let html = "<body><div>one<span>two</span></div><ul><li>three</li></ul></body>";
        let page = extract("https://x.test", html.as_bytes());
        assert!(!page.body_text.contains('<'));
        assert_eq!(page.body_text, "one\ntwo\nthree");
    }

    #[test]
    fn noscript_fallback_is_parsed_not_leaked() {
        let html = r#"<html><body><noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-X" height="0" width="0"></iframe><img src="pixel.gif" alt="PIXEL_ALT"></noscript><p>Hi</p></body></html>"#;
        let page = extract("https://x.test", html.as_bytes());
        assert!(!page.body_text.contains('<'));
        assert!(!page.body_text.contains("googletagmanager"));
        assert!(!page.body_text.contains("pixel.gif"));
        assert_eq!(page.body_text, "Hi");
    }

    #[test]
    fn noscript_text_is_kept() {
        let html = "<body><noscript><p>Please enable JavaScript.</p></noscript><p>Hi</p></body>";
        let page = extract("https://x.test", html.as_bytes());
        assert_eq!(page.body_text, "Please enable JavaScript.\nHi");
    }

    #[test]
    fn iframe_fallback_markup_is_dropped() {
        let html = "<body><iframe src='x.html'><p>FALLBACK</p></iframe><p>Hi</p></body>";
        let page = extract("https://x.test", html.as_bytes());
        assert_eq!(page.body_text, "Hi");
    }

    #[test]
    fn body_spelled_outside_markup_does_not_count() {
        let cases = [
            "<html><head><title>t</title><!-- <body> --></head><p>stray</p></html>",
            "<html><head><script>document.write('<body>')</script></head><p>stray</p></html>",
            "<html><head><style>/* <body> */</style></head><p>stray</p></html>",
            "<html><head><title>&lt;body&gt; <body></title></head><p>stray</p></html>",
            r#"<html><head><meta content="<body>"></head><p>stray</p></html>"#,
        ];
        for html in cases {
            let page = extract("https://x.test", html.as_bytes());
            assert_eq!(page.body_text, "", "{html}");
        }
    }

    #[test]
    fn body_tag_is_detected_case_insensitively_with_attributes() {
        let page = extract("https://x.test", b"<BODY class='home'><p>Hi</p></BODY>");
        assert_eq!(page.body_text, "Hi");
    }

    #[test]
    fn malformed_html_is_tolerated() {
        let html =
            "<html><body><a href='https://ok.test'>link</a><div><p>unclosed <span>nested<div>tail";
        let page = extract("https://x.test", html.as_bytes());
        assert_eq!(page.outbound_links, vec!["https://ok.test"]);
        assert!(page.body_text.contains("unclosed"));
        assert!(page.body_text.contains("tail"));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut raw = b"<body><p>caf".to_vec();
        raw.push(0xff);
        raw.extend_from_slice(b"</p></body>");
        let page = extract("https://x.test", &raw);
        assert!(page.body_text.starts_with("caf"));
    }

    #[test]
    fn contents_renders_title_and_text() {
        let page = extract("https://acme.com", ACME.as_bytes());
        assert_eq!(
            page.contents(),
            "Webpage Title:\nAcme\nWebpage Contents:\nAbout\nCareers\nHi\n\n"
        );
    }
}
