use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Local};
use futures::future::join_all;
use url::Url;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::dom::{DomParser, ScraperParser};
use crate::error::ArchiveError;
use crate::pdf::render_document;
use crate::proxy::MediaFetcher;
use crate::utils::{last_segment, normalize_folder_path, zip_filename};
use crate::{ArchiveConfig, ArchiveOutput, ArchiveRequest, MediaAsset};

const HTML_FILENAME: &str = "artigo_limpo.html";
const PDF_FILENAME: &str = "documento_formatado.pdf";
const MEDIA_FOLDER_FALLBACK: &str = "media";
const DEFAULT_SUBTYPE: &str = "jpg";

/// Synchronous progress side channel; invoked at each pipeline milestone.
pub type ProgressSink<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// Single-pass archive-assembly pipeline: normalize the cleaned HTML,
/// collect embedded images, render the PDF, package everything as one ZIP.
/// Stateless across runs.
pub struct Archiver {
    config: ArchiveConfig,
    fetcher: Arc<dyn MediaFetcher>,
    dom: Box<dyn DomParser>,
}

impl Archiver {
    pub fn new(config: ArchiveConfig, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self {
            config,
            fetcher,
            dom: Box::new(ScraperParser),
        }
    }

    /// Swaps the HTML parsing backend.
    pub fn with_dom_parser(mut self, dom: Box<dyn DomParser>) -> Self {
        self.dom = dom;
        self
    }

    /// Runs the four stages strictly in order. Per-image fetch failures only
    /// shrink the media set; everything else aborts the run.
    pub async fn create_archive(
        &self,
        request: &ArchiveRequest,
        progress: &ProgressSink<'_>,
    ) -> Result<ArchiveOutput, ArchiveError> {
        if request.original_url.trim().is_empty() {
            return Err(ArchiveError::MissingUrl);
        }

        progress("A preparar estrutura de pastas...");
        let safe_path = normalize_folder_path(&request.destination_path);

        let full_html = build_full_html(
            &request.cleaned_html,
            &request.original_url,
            Local::now(),
        );
        progress("HTML limpo guardado.");

        let assets = self.collect_media(&request.cleaned_html, progress).await;

        progress("A gerar PDF...");
        let text = self.dom.plain_text(&request.cleaned_html);
        let pdf_bytes = render_document(
            &self.config.layout,
            &text,
            &request.destination_path,
            &request.original_url,
        )?;
        progress("PDF gerado com sucesso.");

        progress("A finalizar compressão ZIP...");
        let zip_bytes = build_bundle(&safe_path, &full_html, &assets, &pdf_bytes)?;
        let filename = zip_filename(&safe_path);
        progress("Arquivo criado com sucesso!");

        Ok(ArchiveOutput {
            zip_bytes,
            filename,
        })
    }

    /// Best-effort concurrent retrieval of every embedded image with an
    /// absolute URL. Never fails; a page with zero images or all-failing
    /// fetches yields an empty set.
    async fn collect_media(&self, cleaned_html: &str, progress: &ProgressSink<'_>) -> Vec<MediaAsset> {
        let sources = self.dom.image_sources(cleaned_html);
        if sources.is_empty() {
            return Vec::new();
        }

        progress(&format!(
            "A detetar {} imagens para arquivo profundo...",
            sources.len()
        ));

        // Only scheme-qualified URLs are worth attempting; the index is the
        // 1-based position among those attempts and survives dropped fetches.
        let attempted: Vec<(usize, String)> = sources
            .into_iter()
            .flatten()
            .filter(|src| is_absolute_http(src))
            .enumerate()
            .map(|(i, src)| (i + 1, src))
            .collect();

        let fetches = attempted.iter().map(|(index, src)| {
            let fetcher = Arc::clone(&self.fetcher);
            async move {
                match fetcher.fetch(src).await {
                    Ok(media) => Some(MediaAsset {
                        index: *index,
                        source_url: src.clone(),
                        subtype: subtype_of(media.content_type.as_deref()),
                        bytes: media.bytes,
                    }),
                    Err(_) => None,
                }
            }
        });

        let assets: Vec<MediaAsset> = join_all(fetches).await.into_iter().flatten().collect();
        progress("Imagens multimédia descarregadas.");
        assets
    }
}

fn is_absolute_http(src: &str) -> bool {
    matches!(Url::parse(src), Ok(url) if url.scheme() == "http" || url.scheme() == "https")
}

/// File extension from a content-type header, e.g. `image/png` → `png`.
fn subtype_of(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .and_then(|ct| ct.split('/').nth(1))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBTYPE)
        .to_string()
}

/// Wraps the cleaned article in a self-contained HTML document with a
/// metadata header and a fixed readable stylesheet. Pure; never fails.
pub fn build_full_html(
    cleaned_html: &str,
    original_url: &str,
    archived_at: DateTime<Local>,
) -> String {
    let timestamp = archived_at.format("%d/%m/%Y, %H:%M:%S");
    format!(
        r#"<!DOCTYPE html>
<html lang="pt">
<head>
  <meta charset="UTF-8">
  <title>Artigo Arquivado</title>
  <style>
    body {{ font-family: sans-serif; max-width: 800px; margin: 40px auto; line-height: 1.6; color: #333; }}
    img {{ max-width: 100%; height: auto; margin: 20px 0; border-radius: 8px; }}
    h1 {{ color: #1a73e8; }}
    a {{ color: #1a73e8; text-decoration: none; }}
    .meta {{ font-size: 0.9em; color: #666; border-bottom: 1px solid #eee; padding-bottom: 10px; margin-bottom: 20px; }}
  </style>
</head>
<body>
  <div class="meta">
    <p><strong>URL Original:</strong> <a href="{original_url}">{original_url}</a></p>
    <p><strong>Data de Arquivo:</strong> {timestamp}</p>
  </div>
  {cleaned_html}
</body>
</html>
"#
    )
}

/// Packages the three stage outputs into one in-memory ZIP. File insertions
/// cannot legitimately fail; only serialization errors propagate.
fn build_bundle(
    safe_path: &str,
    full_html: &str,
    assets: &[MediaAsset],
    pdf_bytes: &[u8],
) -> Result<Vec<u8>, ArchiveError> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let root = if safe_path.is_empty() {
        String::new()
    } else {
        format!("{}/", safe_path)
    };

    zip.start_file(format!("{root}{HTML_FILENAME}"), options)?;
    zip.write_all(full_html.as_bytes())?;

    let media_folder = format!(
        "conteudo-{}",
        last_segment(safe_path).unwrap_or(MEDIA_FOLDER_FALLBACK)
    );
    for asset in assets {
        zip.start_file(
            format!("{root}{media_folder}/imagem_{}.{}", asset.index, asset.subtype),
            options,
        )?;
        zip.write_all(&asset.bytes)?;
    }

    zip.start_file(format!("{root}{PDF_FILENAME}"), options)?;
    zip.write_all(pdf_bytes)?;

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::FetchedMedia;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::io::Read;

    /// Canned responses keyed by URL; unknown URLs fail the fetch.
    struct StubFetcher {
        responses: HashMap<String, FetchedMedia>,
    }

    impl StubFetcher {
        fn new(entries: &[(&str, &[u8], Option<&str>)]) -> Self {
            let responses = entries
                .iter()
                .map(|(url, bytes, content_type)| {
                    (
                        url.to_string(),
                        FetchedMedia {
                            bytes: bytes.to_vec(),
                            content_type: content_type.map(str::to_string),
                        },
                    )
                })
                .collect();
            Self { responses }
        }
    }

    #[async_trait]
    impl MediaFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedMedia, ArchiveError> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| ArchiveError::Upstream("Erro HTTP: 404".to_string()))
        }
    }

    fn archiver(entries: &[(&str, &[u8], Option<&str>)]) -> Archiver {
        Archiver::new(ArchiveConfig::default(), Arc::new(StubFetcher::new(entries)))
    }

    fn entry_names(zip_bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn read_entry(zip_bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes.to_vec())).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        contents
    }

    fn no_progress() -> impl Fn(&str) + Send + Sync {
        |_: &str| {}
    }

    #[tokio::test]
    async fn concrete_scenario_produces_expected_layout() {
        let archiver = archiver(&[("https://x/y.png", b"png-bytes", Some("image/png"))]);
        let request = ArchiveRequest {
            destination_path: "artigos/ Teste ".to_string(),
            cleaned_html: "<p>Hi</p><img src='https://x/y.png'>".to_string(),
            original_url: "https://example.com/a".to_string(),
        };

        let output = archiver
            .create_archive(&request, &no_progress())
            .await
            .unwrap();

        assert_eq!(output.filename, "arquivo_artigos-Teste.zip");
        let names = entry_names(&output.zip_bytes);
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"artigos/Teste/artigo_limpo.html".to_string()));
        assert!(names.contains(&"artigos/Teste/conteudo-Teste/imagem_1.png".to_string()));
        assert!(names.contains(&"artigos/Teste/documento_formatado.pdf".to_string()));

        let html = read_entry(&output.zip_bytes, "artigos/Teste/artigo_limpo.html");
        assert!(html.contains("Hi"));
        assert!(html.contains(r#"<a href="https://example.com/a">"#));
    }

    #[tokio::test]
    async fn failed_fetches_are_dropped_without_renumbering() {
        // Three absolute images; the middle fetch fails.
        let archiver = archiver(&[
            ("https://a/1.png", b"one", Some("image/png")),
            ("https://a/3.gif", b"three", Some("image/gif")),
        ]);
        let request = ArchiveRequest {
            destination_path: "pasta".to_string(),
            cleaned_html: concat!(
                "<img src='https://a/1.png'>",
                "<img src='https://a/2.png'>",
                "<img src='https://a/3.gif'>",
            )
            .to_string(),
            original_url: "https://example.com".to_string(),
        };

        let output = archiver
            .create_archive(&request, &no_progress())
            .await
            .unwrap();

        let names = entry_names(&output.zip_bytes);
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"pasta/conteudo-pasta/imagem_1.png".to_string()));
        assert!(names.contains(&"pasta/conteudo-pasta/imagem_3.gif".to_string()));
        assert!(!names.iter().any(|n| n.contains("imagem_2")));
    }

    #[tokio::test]
    async fn relative_and_missing_srcs_are_not_attempted() {
        let archiver = archiver(&[("https://a/img.png", b"x", None)]);
        let request = ArchiveRequest {
            destination_path: "p".to_string(),
            cleaned_html: "<img src='/rel.png'><img><img src='https://a/img.png'>".to_string(),
            original_url: "https://example.com".to_string(),
        };

        let output = archiver
            .create_archive(&request, &no_progress())
            .await
            .unwrap();

        // The absolute image is attempt #1; missing content type falls back
        // to jpg.
        let names = entry_names(&output.zip_bytes);
        assert!(names.contains(&"p/conteudo-p/imagem_1.jpg".to_string()));
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn empty_article_yields_exactly_two_files() {
        let archiver = archiver(&[]);
        let request = ArchiveRequest {
            destination_path: "destino".to_string(),
            cleaned_html: String::new(),
            original_url: "https://example.com/vazio".to_string(),
        };

        let output = archiver
            .create_archive(&request, &no_progress())
            .await
            .unwrap();

        let names = entry_names(&output.zip_bytes);
        assert_eq!(
            names,
            vec![
                "destino/artigo_limpo.html".to_string(),
                "destino/documento_formatado.pdf".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_destination_path_lands_at_archive_top_level() {
        let archiver = archiver(&[("https://a/i.png", b"x", Some("image/png"))]);
        let request = ArchiveRequest {
            destination_path: " / ".to_string(),
            cleaned_html: "<img src='https://a/i.png'>".to_string(),
            original_url: "https://example.com".to_string(),
        };

        let output = archiver
            .create_archive(&request, &no_progress())
            .await
            .unwrap();

        let names = entry_names(&output.zip_bytes);
        assert!(names.contains(&"artigo_limpo.html".to_string()));
        assert!(names.contains(&"conteudo-media/imagem_1.png".to_string()));
    }

    #[tokio::test]
    async fn missing_url_is_rejected_before_any_work() {
        let archiver = archiver(&[]);
        let request = ArchiveRequest {
            destination_path: "p".to_string(),
            cleaned_html: "<p>corpo</p>".to_string(),
            original_url: "  ".to_string(),
        };

        let messages = std::sync::Mutex::new(Vec::<String>::new());
        let progress = |msg: &str| messages.lock().unwrap().push(msg.to_string());
        let err = archiver.create_archive(&request, &progress).await.unwrap_err();

        assert!(matches!(err, ArchiveError::MissingUrl));
        assert!(messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn progress_milestones_are_reported_in_order() {
        let archiver = archiver(&[("https://a/i.png", b"x", Some("image/png"))]);
        let request = ArchiveRequest {
            destination_path: "pasta".to_string(),
            cleaned_html: "<p>texto</p><img src='https://a/i.png'>".to_string(),
            original_url: "https://example.com".to_string(),
        };

        let messages = std::sync::Mutex::new(Vec::<String>::new());
        let progress = |msg: &str| messages.lock().unwrap().push(msg.to_string());
        archiver.create_archive(&request, &progress).await.unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(
            *messages,
            vec![
                "A preparar estrutura de pastas...",
                "HTML limpo guardado.",
                "A detetar 1 imagens para arquivo profundo...",
                "Imagens multimédia descarregadas.",
                "A gerar PDF...",
                "PDF gerado com sucesso.",
                "A finalizar compressão ZIP...",
                "Arquivo criado com sucesso!",
            ]
        );
    }

    #[test]
    fn full_html_is_deterministic_for_a_fixed_timestamp() {
        let when = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let a = build_full_html("<p>x</p>", "https://e.com", when);
        let b = build_full_html("<p>x</p>", "https://e.com", when);
        assert_eq!(a, b);
        assert!(a.contains("02/01/2025, 03:04:05"));
        assert!(a.contains(r#"<a href="https://e.com">https://e.com</a>"#));
        assert!(a.contains("<p>x</p>"));
    }

    #[test]
    fn full_html_wraps_even_empty_content() {
        let when = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let html = build_full_html("", "https://e.com", when);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn subtype_defaults_to_jpg() {
        assert_eq!(subtype_of(Some("image/png")), "png");
        assert_eq!(subtype_of(Some("image/jpeg; charset=binary")), "jpeg");
        assert_eq!(subtype_of(Some("imagem")), "jpg");
        assert_eq!(subtype_of(None), "jpg");
    }

    #[test]
    fn absolute_url_detection() {
        assert!(is_absolute_http("https://a/b.png"));
        assert!(is_absolute_http("http://a/b.png"));
        assert!(!is_absolute_http("/relativo.png"));
        assert!(!is_absolute_http("data:image/png;base64,xyz"));
    }
}
