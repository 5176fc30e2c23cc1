/// Documents must be strictly larger than this many bytes.
pub const MIN_DOCUMENT_SIZE: u64 = 5;
/// Documents must be strictly smaller than this many bytes.
pub const MAX_DOCUMENT_SIZE: u64 = 30_000_000;

const ALLOWED_EXTENSIONS: [&str; 2] = [".txt", ".md"];

/// Why a turn was turned away without reaching the completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Another document holds the file slot.
    Busy,
    /// Wrong extension or size out of bounds.
    InvalidDocument,
    /// The document downloaded with no content.
    EmptyDocument,
}

impl Rejection {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Busy => "Another file is being processed. Please wait.",
            Self::InvalidDocument => "Not a TXT file or file size less than 5 bytes.",
            Self::EmptyDocument => "Empty file. Please upload a non-empty text file.",
        }
    }
}

/// Checks name and declared size before anything is downloaded.
pub fn validate_document(file_name: &str, file_size: u64) -> Result<(), Rejection> {
    let size_ok = MIN_DOCUMENT_SIZE < file_size && file_size < MAX_DOCUMENT_SIZE;
    let extension_ok = ALLOWED_EXTENSIONS
        .iter()
        .any(|extension| file_name.ends_with(extension));

    if size_ok && extension_ok {
        Ok(())
    } else {
        Err(Rejection::InvalidDocument)
    }
}
