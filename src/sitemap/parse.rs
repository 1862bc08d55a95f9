// src/sitemap/parse.rs
// =============================================================================
// Parses sitemap XML.
//
// Two document shapes exist in the wild:
//
//   <sitemapindex>                      <urlset>
//     <sitemap><loc>…</loc></sitemap>     <url><loc>…</loc></url>
//   </sitemapindex>                     </urlset>
//
// parse_sitemap() walks the document with quick-xml's streaming reader and
// reports which shape it saw. Broken XML is common enough (plugins that
// print PHP warnings before the prolog, truncated responses) that callers
// fall back to extract_locs(), a plain regex scan for <loc> spans.
// =============================================================================

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;

static LOC_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<loc>([^<]+)</loc>").expect("loc pattern is valid"));

// <sitemapindex ...> or <sitemap>, with or without a namespace prefix
static INDEX_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<([a-z0-9_-]+:)?sitemap(index\b|>)").expect("index pattern is valid")
});

/// What a well-formed sitemap document contained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Child sitemaps to expand
    Index(Vec<String>),
    /// Page URLs
    UrlSet(Vec<String>),
    /// Valid XML, but neither <sitemap> nor <url> entries under the root
    Unrecognized,
}

/// Why structured parsing gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedXml(pub String);

/// Parses a sitemap body into its entries.
///
/// Element names are compared without namespace prefixes, so
/// `<sm:url><sm:loc>` works the same as `<url><loc>`.
pub fn parse_sitemap(body: &str) -> Result<SitemapDocument, MalformedXml> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    // Open elements, outermost first
    let mut stack: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut saw_sitemap = false;
    let mut saw_url = false;

    let mut sitemap_locs = Vec::new();
    let mut url_locs = Vec::new();
    let mut current_loc: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if stack.is_empty() {
                    if saw_root {
                        return Err(MalformedXml("multiple root elements".to_string()));
                    }
                    saw_root = true;
                }
                if stack.len() == 1 {
                    match name.as_str() {
                        "sitemap" => saw_sitemap = true,
                        "url" => saw_url = true,
                        _ => {}
                    }
                }
                if name == "loc" {
                    current_loc = Some(String::new());
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                if stack.is_empty() {
                    if saw_root {
                        return Err(MalformedXml("multiple root elements".to_string()));
                    }
                    saw_root = true;
                }
                if stack.len() == 1 {
                    match e.local_name().as_ref() {
                        b"sitemap" => saw_sitemap = true,
                        b"url" => saw_url = true,
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| MalformedXml(err.to_string()))?;
                    loc.push_str(&text);
                } else if stack.is_empty() && !e.iter().all(u8::is_ascii_whitespace) {
                    return Err(MalformedXml("text outside the root element".to_string()));
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                stack.pop();
                if e.local_name().as_ref() == b"loc" {
                    if let Some(loc) = current_loc.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            // <loc> belongs to whichever entry encloses it
                            match stack.last().map(String::as_str) {
                                Some("sitemap") => sitemap_locs.push(loc.to_string()),
                                Some("url") => url_locs.push(loc.to_string()),
                                _ => {}
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedXml(e.to_string())),
            _ => {}
        }
    }

    if !saw_root {
        return Err(MalformedXml("no root element".to_string()));
    }
    if !stack.is_empty() {
        return Err(MalformedXml(format!("unclosed element <{}>", stack.join("><"))));
    }

    Ok(if saw_sitemap {
        SitemapDocument::Index(sitemap_locs)
    } else if saw_url {
        SitemapDocument::UrlSet(url_locs)
    } else {
        SitemapDocument::Unrecognized
    })
}

/// Best-effort scan for every literal `<loc>…</loc>` span
pub fn extract_locs(body: &str) -> Vec<String> {
    LOC_SPAN
        .captures_iter(body)
        .filter_map(|cap| {
            let loc = cap[1].trim();
            (!loc.is_empty()).then(|| loc.to_string())
        })
        .collect()
}

/// True when a body that failed structured parsing still reads like a
/// sitemap index, so its `<loc>` spans name child sitemaps, not pages
pub fn looks_like_index(body: &str) -> bool {
    INDEX_MARKER.is_match(body)
}
