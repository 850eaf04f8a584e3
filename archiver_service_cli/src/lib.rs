pub mod ai;
pub mod archiver;
pub mod dom;
pub mod error;
pub mod pdf;
pub mod proxy;
pub mod utils;

use serde::{Deserialize, Serialize};

/// Immutable input for one archive run.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ArchiveRequest {
    /// Destination path inside the archive, slash-separated, arbitrary depth.
    /// Leading/trailing separators and backslashes are normalized before use.
    pub destination_path: String,
    /// Article body HTML already stripped of boilerplate by the AI cleaner.
    pub cleaned_html: String,
    pub original_url: String,
}

/// One successfully fetched embedded image. Images whose fetch fails are
/// dropped before an asset is ever materialized.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    /// 1-based position among the images whose fetch was attempted.
    pub index: usize,
    pub source_url: String,
    /// File extension, taken from the response content-type subtype.
    pub subtype: String,
    pub bytes: Vec<u8>,
}

/// Final product of a pipeline run: the compressed bundle plus the
/// suggested download filename.
#[derive(Debug, Clone)]
pub struct ArchiveOutput {
    pub zip_bytes: Vec<u8>,
    pub filename: String,
}

/// Configuration for one pipeline instance. Everything here used to be a
/// baked-in constant; it is explicit so callers can swap the proxy endpoint
/// or page layout without touching pipeline logic.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// CORS-bypass proxy prefix; the target URL is appended percent-encoded.
    pub proxy_endpoint: String,
    pub layout: PdfLayout,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            proxy_endpoint: "https://api.allorigins.win/raw?url=".to_string(),
            layout: PdfLayout::default(),
        }
    }
}

/// Page geometry for the rendered document. All vertical positions are
/// millimeters measured from the top edge of the page.
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// Left margin of the body text.
    pub margin_left_mm: f32,
    /// Left position of the two header lines.
    pub header_x_mm: f32,
    /// Vertical position of the first header line; the second sits 5mm below.
    pub header_y_mm: f32,
    pub header_font_size: f32,
    pub body_font_size: f32,
    /// Vertical position of the first body line on the first page.
    pub body_start_mm: f32,
    pub line_height_mm: f32,
    /// Past this cursor position the renderer starts a new page.
    pub max_cursor_mm: f32,
    /// Cursor position at the top of every continuation page.
    pub reset_cursor_mm: f32,
    /// Word-wrap width of the body text, in characters.
    pub wrap_columns: usize,
}

impl Default for PdfLayout {
    fn default() -> Self {
        // A4 portrait with the layout the product has always used.
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_left_mm: 15.0,
            header_x_mm: 10.0,
            header_y_mm: 10.0,
            header_font_size: 10.0,
            body_font_size: 12.0,
            body_start_mm: 25.0,
            line_height_mm: 7.0,
            max_cursor_mm: 280.0,
            reset_cursor_mm: 20.0,
            wrap_columns: 90,
        }
    }
}
