use thiserror::Error;

/// Everything that can abort an archive run. Per-image fetch failures never
/// surface here; they only shrink the media set.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("O URL de origem é obrigatório.")]
    MissingUrl,

    #[error("URL inválido: {0}")]
    InvalidUrl(String),

    #[error("Chave de API Gemini não configurada.")]
    MissingApiKey,

    /// Source page or proxy unreachable, non-success status, or empty body.
    #[error("Falha ao descarregar URL: {0}")]
    Upstream(String),

    /// The AI extraction call failed or returned nothing usable.
    #[error("Falha ao processar conteúdo com a IA: {0}")]
    Extraction(String),

    #[error("Falha ao gerar PDF: {0}")]
    Pdf(String),

    #[error("Falha ao criar o arquivo ZIP: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
