//! Combines the markdown bodies of many releases into one sectioned HTML
//! changelog.
//!
//! Headings never become content; they open (or reopen) a section keyed by
//! their first inline text. Content between headings accumulates into the
//! current section, so a `## Fixed` heading appearing in several release
//! bodies yields a single combined `Fixed` section.

use indexmap::IndexMap;
use log::warn;
use pulldown_cmark::{html, Event, Parser, Tag};

/// Headline of the implicit section which collects all content appearing
/// before the first heading.
pub const DEFAULT_HEADLINE: &str = "Uncategorized";

/// One top-level markdown block, kept as the parser event run that produced
/// it so it can be re-rendered independently later.
type Block<'a> = Vec<Event<'a>>;

struct Sections<'a> {
    by_headline: IndexMap<String, Vec<Block<'a>>>,
    current: String,
}

impl<'a> Sections<'a> {
    fn new() -> Self {
        let mut by_headline = IndexMap::new();
        by_headline.insert(DEFAULT_HEADLINE.to_string(), Vec::new());
        Self {
            by_headline,
            current: DEFAULT_HEADLINE.to_string(),
        }
    }

    /// Make the section with this headline current, creating it on first
    /// encounter and preserving accumulated content on reuse.
    fn open(&mut self, headline: String) {
        self.by_headline.entry(headline.clone()).or_default();
        self.current = headline;
    }

    fn append(&mut self, block: Block<'a>) {
        if let Some(blocks) = self.by_headline.get_mut(&self.current) {
            blocks.push(block);
        }
    }
}

/// Build a single sectioned HTML changelog from an ordered sequence of
/// markdown bodies.
///
/// The output is a bare sequence of `<h3>` headlines followed by the
/// rendered blocks of each section, in first-encounter order, meant to be
/// embedded into a host template. Sections with an empty headline or no
/// content are omitted. Zero bodies yield an empty string.
#[must_use]
pub fn build<I, S>(bodies: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let source = bodies.into_iter().fold(String::new(), |mut acc, body| {
        if !acc.is_empty() {
            acc.push_str("\n\n");
        }
        acc.push_str(body.as_ref());
        acc
    });
    render(read_sections(&source))
}

/// Partition the top-level blocks of `source` into headline-keyed sections.
fn read_sections(source: &str) -> Sections<'_> {
    let mut sections = Sections::new();
    let mut block: Block<'_> = Vec::new();
    let mut depth: usize = 0;
    let mut in_heading = false;
    let mut headline: Option<String> = None;

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Heading { .. }) if depth == 0 => {
                depth += 1;
                in_heading = true;
                headline = None;
            }
            Event::Start(tag) => {
                depth += 1;
                if !in_heading {
                    block.push(Event::Start(tag));
                }
            }
            Event::End(tag_end) => {
                depth -= 1;
                if in_heading {
                    if depth == 0 {
                        let headline = headline.take().unwrap_or_default();
                        if headline.is_empty() {
                            warn!("heading without extractable text, its section will be dropped");
                        }
                        sections.open(headline);
                        in_heading = false;
                    }
                } else {
                    block.push(Event::End(tag_end));
                    if depth == 0 {
                        sections.append(std::mem::take(&mut block));
                    }
                }
            }
            Event::Text(text) | Event::Code(text) if in_heading => {
                if headline.is_none() {
                    headline = Some(text.to_string());
                }
            }
            // Other inline events inside a heading carry no headline text
            // and are never content.
            _ if in_heading => {}
            event if depth == 0 => {
                // Blocks without start/end markers, like thematic breaks.
                sections.append(vec![event]);
            }
            event => block.push(event),
        }
    }

    sections
}

fn render(sections: Sections<'_>) -> String {
    let mut out = String::new();
    for (headline, blocks) in &sections.by_headline {
        if headline.is_empty() || blocks.is_empty() {
            continue;
        }
        out.push_str("<h3>");
        out.push_str(&html_escape::encode_text(headline));
        out.push_str("</h3>");
        for block in blocks {
            // One renderer call per block, outputs concatenated.
            html::push_html(&mut out, block.iter().cloned());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn no_bodies_yields_empty_html() {
        assert_eq!(build(Vec::<&str>::new()), "");
    }

    #[test]
    fn content_without_headings_lands_in_the_default_section() {
        let html = build(["First paragraph.", "Second paragraph."]);
        assert_eq!(
            html,
            "<h3>Uncategorized</h3><p>First paragraph.</p>\n<p>Second paragraph.</p>\n"
        );
    }

    #[test]
    fn sections_merge_across_bodies() {
        let html = build(["## Fixed\n\n- crash on startup", "## Fixed\n\n- flickering"]);
        assert_eq!(
            html,
            "<h3>Fixed</h3>\
             <ul>\n<li>crash on startup</li>\n</ul>\n\
             <ul>\n<li>flickering</li>\n</ul>\n"
        );
    }

    #[test]
    fn sections_emit_in_first_encounter_order() {
        let html = build([
            "## Added\n\n- thing\n\n## Fixed\n\n- bug",
            "## Fixed\n\n- other bug\n\n## Added\n\n- second thing",
        ]);
        let added = html.find("<h3>Added</h3>").expect("Added section");
        let fixed = html.find("<h3>Fixed</h3>").expect("Fixed section");
        assert!(added < fixed);
        assert_eq!(html.matches("<h3>").count(), 2);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let html = build(["## Empty\n\n## Fixed\n\n- bug"]);
        assert_eq!(html, "<h3>Fixed</h3><ul>\n<li>bug</li>\n</ul>\n");
    }

    #[test]
    fn heading_is_never_content() {
        let html = build(["## Fixed\n\n- bug"]);
        assert!(!html.contains("<h2>"));
    }

    #[test]
    fn heading_without_text_drops_its_content() {
        let html = build(["intro\n\n###\n\nhidden by the unnamed section"]);
        assert_eq!(html, "<h3>Uncategorized</h3><p>intro</p>\n");
    }

    #[test]
    fn headline_text_is_escaped() {
        let html = build(["## `Vec<u8>`\n\n- entry"]);
        assert!(html.contains("<h3>Vec&lt;u8&gt;</h3>"));
    }

    #[test]
    fn nested_headings_stay_content() {
        let html = build(["> ## Quoted heading\n> body"]);
        assert_eq!(html.matches("<h3>").count(), 1);
        assert!(html.starts_with("<h3>Uncategorized</h3>"));
        assert!(html.contains("<h2>Quoted heading</h2>"));
    }

    #[test]
    fn formatted_heading_uses_first_inline_text() {
        let html = build(["## **Breaking** changes\n\n- all of it"]);
        assert!(html.contains("<h3>Breaking</h3>"));
    }
}
