use scraper::{Html, Selector};

/// The two HTML queries the pipeline needs, kept behind a trait so the
/// parsing library can be swapped without touching pipeline logic.
pub trait DomParser: Send + Sync {
    /// `src` attribute of every `<img>` element, in document order.
    /// `None` marks an image without a `src`.
    fn image_sources(&self, html: &str) -> Vec<Option<String>>;

    /// Plain-text projection of the document: tags stripped, one line per
    /// top-level block, whitespace collapsed.
    fn plain_text(&self, html: &str) -> String;
}

/// Default implementation on top of the `scraper` crate.
pub struct ScraperParser;

impl DomParser for ScraperParser {
    fn image_sources(&self, html: &str) -> Vec<Option<String>> {
        let doc = Html::parse_document(html);
        let img_selector = Selector::parse("img").unwrap();
        doc.select(&img_selector)
            .map(|el| el.value().attr("src").map(str::to_string))
            .collect()
    }

    fn plain_text(&self, html: &str) -> String {
        let doc = Html::parse_document(html);
        let block_selector = Selector::parse("body > *").unwrap();

        let mut lines: Vec<String> = doc
            .select(&block_selector)
            .filter_map(|el| {
                let text = el.text().collect::<Vec<_>>().join(" ");
                let text = collapse_whitespace(&text);
                if text.is_empty() { None } else { Some(text) }
            })
            .collect();

        // Bare text with no block elements still has to surface.
        if lines.is_empty() {
            let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
            let text = collapse_whitespace(&text);
            if !text.is_empty() {
                lines.push(text);
            }
        }

        lines.join("\n")
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
