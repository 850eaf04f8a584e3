use printpdf::{BuiltinFont, Color, Mm, PdfDocument, Rgb};

use crate::error::ArchiveError;
use crate::utils::truncate_chars;
use crate::PdfLayout;

/// Renders the plain-text projection of an article into a paginated PDF.
/// Deterministic for identical inputs; empty text yields one near-empty page.
pub fn render_document(
    layout: &PdfLayout,
    text: &str,
    destination_path: &str,
    original_url: &str,
) -> Result<Vec<u8>, ArchiveError> {
    let lines = wrap_lines(text, layout.wrap_columns);
    let pages = paginate(lines, layout);

    let (doc, first_page, first_layer) = PdfDocument::new(
        "Artigo Arquivado",
        Mm(layout.page_width_mm),
        Mm(layout.page_height_mm),
        "Camada 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ArchiveError::Pdf(e.to_string()))?;

    let gray = Color::Rgb(Rgb::new(0.4, 0.4, 0.4, None));
    let black = Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None));
    let y = |from_top: f32| Mm(layout.page_height_mm - from_top);

    // Two-line header on the first page only.
    let layer = doc.get_page(first_page).get_layer(first_layer);
    layer.set_fill_color(gray);
    layer.use_text(
        format!("Arquivo Digital: {}", destination_path),
        layout.header_font_size,
        Mm(layout.header_x_mm),
        y(layout.header_y_mm),
        &font,
    );
    layer.use_text(
        format!("Fonte: {}...", truncate_chars(original_url, 50)),
        layout.header_font_size,
        Mm(layout.header_x_mm),
        y(layout.header_y_mm + 5.0),
        &font,
    );
    layer.set_fill_color(black.clone());

    for (page_number, page_lines) in pages.iter().enumerate() {
        let layer = if page_number == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(
                Mm(layout.page_width_mm),
                Mm(layout.page_height_mm),
                "Camada 1",
            );
            let layer = doc.get_page(page).get_layer(layer);
            layer.set_fill_color(black.clone());
            layer
        };

        let mut cursor = if page_number == 0 {
            layout.body_start_mm
        } else {
            layout.reset_cursor_mm
        };
        for line in page_lines {
            layer.use_text(
                line.clone(),
                layout.body_font_size,
                Mm(layout.margin_left_mm),
                y(cursor),
                &font,
            );
            cursor += layout.line_height_mm;
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ArchiveError::Pdf(e.to_string()))
}

/// Word-wraps the text to `columns` characters. Paragraph breaks in the
/// input are preserved; words longer than a full line are hard-split.
pub fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            // Hard-split words that cannot fit on any line.
            while word.chars().count() > columns {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let split_at = word
                    .char_indices()
                    .nth(columns)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split_at].to_string());
                word = &word[split_at..];
            }
            if word.is_empty() {
                continue;
            }
            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= columns {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Splits wrapped lines into pages by walking a vertical cursor down from
/// `body_start_mm`; once it passes `max_cursor_mm` a new page starts at
/// `reset_cursor_mm`. Always returns at least one page.
pub fn paginate(lines: Vec<String>, layout: &PdfLayout) -> Vec<Vec<String>> {
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut cursor = layout.body_start_mm;

    for line in lines {
        if cursor > layout.max_cursor_mm {
            pages.push(std::mem::take(&mut page));
            cursor = layout.reset_cursor_mm;
        }
        page.push(line);
        cursor += layout.line_height_mm;
    }
    pages.push(page);
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_short_paragraphs_intact() {
        assert_eq!(wrap_lines("um dois três", 20), vec!["um dois três"]);
    }

    #[test]
    fn wrap_breaks_at_word_boundaries() {
        let lines = wrap_lines("aaa bbb ccc ddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn wrap_hard_splits_oversized_words() {
        let lines = wrap_lines("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_preserves_paragraph_breaks() {
        let lines = wrap_lines("primeiro\nsegundo", 50);
        assert_eq!(lines, vec!["primeiro", "segundo"]);
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert!(wrap_lines("", 80).is_empty());
    }

    #[test]
    fn paginate_empty_text_yields_single_page() {
        let pages = paginate(Vec::new(), &PdfLayout::default());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn paginate_overflows_to_second_page_preserving_order() {
        let layout = PdfLayout::default();
        let capacity_first_page =
            ((layout.max_cursor_mm - layout.body_start_mm) / layout.line_height_mm) as usize + 1;
        let lines: Vec<String> = (0..capacity_first_page + 3)
            .map(|i| format!("linha {}", i))
            .collect();

        let pages = paginate(lines.clone(), &layout);
        assert!(pages.len() > 1);
        let rejoined: Vec<String> = pages.into_iter().flatten().collect();
        assert_eq!(rejoined, lines);
    }

    #[test]
    fn render_produces_a_pdf_even_for_empty_text() {
        let bytes =
            render_document(&PdfLayout::default(), "", "artigos/Teste", "https://a").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn render_handles_multi_page_bodies() {
        let text = vec!["palavra"; 3000].join(" ");
        let bytes = render_document(
            &PdfLayout::default(),
            &text,
            "artigos/Longo",
            "https://example.com/um-url-bastante-comprido-para-truncar-no-cabecalho",
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
