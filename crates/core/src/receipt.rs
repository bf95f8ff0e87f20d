//! Receipt images attached to transactions.
//!
//! Receipts are embedded in the transaction record as a `data:` URI, so they
//! are validated for type and size before they ever reach the ledger.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest receipt accepted, in bytes.
pub const MAX_RECEIPT_BYTES: usize = 815 * 1024;

/// Image types accepted as receipts.
pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Receipt validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    /// Not an accepted image type.
    #[error("invalid MIME type: {0}")]
    InvalidMimeType(String),

    /// Image larger than the limit.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Empty upload.
    #[error("empty file")]
    Empty,
}

impl ReceiptError {
    /// Returns the pt-BR message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidMimeType(_) => "O comprovante deve ser uma imagem (png, jpeg, webp ou gif)",
            Self::FileTooLarge { .. } => "O comprovante deve ter no máximo 815KB",
            Self::Empty => "O comprovante enviado está vazio",
        }
    }
}

/// A validated receipt image.
#[derive(Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    mime: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for ReceiptImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptImage")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ReceiptImage {
    /// Validates an image against the default size limit.
    ///
    /// # Errors
    ///
    /// See [`ReceiptImage::with_limit`].
    pub fn new(mime: &str, bytes: Vec<u8>) -> Result<Self, ReceiptError> {
        Self::with_limit(mime, bytes, MAX_RECEIPT_BYTES)
    }

    /// Validates an image against `max_bytes`.
    ///
    /// MIME parameters (`image/png; charset=...`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMimeType` for non-image types, `Empty` for zero bytes
    /// and `FileTooLarge` above `max_bytes`.
    pub fn with_limit(mime: &str, bytes: Vec<u8>, max_bytes: usize) -> Result<Self, ReceiptError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
            return Err(ReceiptError::InvalidMimeType(mime.to_string()));
        }
        if bytes.is_empty() {
            return Err(ReceiptError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(ReceiptError::FileTooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        Ok(Self {
            mime: essence,
            bytes,
        })
    }

    /// MIME type, lowercased without parameters.
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Encodes the image as `data:<mime>;base64,<payload>`.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}
