//! Document request catalogue and upload progress for the intake wizard.
//!
//! Each client type has a fixed list of documents the firm asks for. Some are
//! required before the wizard may move past the documents step; the rest are
//! optional extras.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::ClientType;
use crate::error::CoreError;
use crate::types::DbId;

/// File extensions accepted by the upload endpoint (lowercase, no dot).
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// One entry in the per-type document catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentRequest {
    pub id: &'static str,
    pub name: &'static str,
    pub reason: &'static str,
    pub required: bool,
}

const fn doc(
    id: &'static str,
    name: &'static str,
    reason: &'static str,
    required: bool,
) -> DocumentRequest {
    DocumentRequest {
        id,
        name,
        reason,
        required,
    }
}

const INDIVIDUAL_DOCUMENTS: &[DocumentRequest] = &[
    doc(
        "prior-returns",
        "Last 2 Years of Tax Returns",
        "Helps us understand your tax history and carry-forward items",
        true,
    ),
    doc(
        "w2s",
        "Prior Year W-2s, 1099s, K-1s",
        "Creates a better organizer and catches opportunities",
        true,
    ),
    doc(
        "workpapers",
        "Prior Year Supporting Documents",
        "Deductions, credits, and other tax planning documentation",
        false,
    ),
];

const BUSINESS_DOCUMENTS: &[DocumentRequest] = &[
    doc(
        "business-returns",
        "Last 2 Years of Business Tax Returns",
        "Understanding your business structure and tax positions",
        true,
    ),
    doc(
        "depreciation",
        "Depreciation Schedule",
        "Track assets and maximize deductions",
        true,
    ),
    doc(
        "articles",
        "Articles of Organization",
        "Verify entity structure and ownership",
        true,
    ),
    doc(
        "operating-agreement",
        "Operating Agreement",
        "Understand member/shareholder arrangements",
        false,
    ),
];

const TRUST_DOCUMENTS: &[DocumentRequest] = &[
    doc(
        "trust-returns",
        "Prior Trust Tax Returns (Form 1041)",
        "Review prior year positions and distributions",
        true,
    ),
    doc(
        "trust-agreement",
        "Trust Agreement",
        "Understand terms, beneficiaries, and distribution rules",
        true,
    ),
    doc(
        "beneficiary-info",
        "Beneficiary Information Sheet",
        "Names, addresses, SSNs for K-1 preparation",
        true,
    ),
];

const NONPROFIT_DOCUMENTS: &[DocumentRequest] = &[
    doc(
        "form-990",
        "Prior Year Form 990 or 990-N",
        "Review prior year filing and maintain compliance",
        true,
    ),
    doc(
        "501c3-letter",
        "501(c)(3) Determination Letter",
        "Verify tax-exempt status",
        true,
    ),
    doc(
        "board-list",
        "Board Member List",
        "Required disclosure on Form 990",
        true,
    ),
];

/// The documents requested from a client of the given type.
pub fn catalogue(client_type: ClientType) -> &'static [DocumentRequest] {
    match client_type {
        ClientType::Individual => INDIVIDUAL_DOCUMENTS,
        ClientType::Business => BUSINESS_DOCUMENTS,
        ClientType::Trust => TRUST_DOCUMENTS,
        ClientType::Nonprofit => NONPROFIT_DOCUMENTS,
    }
}

/// Look up a catalogue entry, rejecting ids the client type does not request.
pub fn find_request(client_type: ClientType, doc_id: &str) -> Result<&'static DocumentRequest, CoreError> {
    catalogue(client_type)
        .iter()
        .find(|d| d.id == doc_id)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown document '{doc_id}' for {} clients",
                client_type.as_str()
            ))
        })
}

// ---------------------------------------------------------------------------
// Upload state
// ---------------------------------------------------------------------------

/// Upload state of a single requested document, as held in the wizard data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub uploaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Map of document id to upload state.
pub type DocumentMap = BTreeMap<String, DocumentStatus>;

/// Progress over the required documents only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentProgress {
    pub uploaded_required: usize,
    pub total_required: usize,
    /// Whole percentage, truncated.
    pub percent: u8,
}

impl DocumentProgress {
    pub fn compute(client_type: ClientType, documents: &DocumentMap) -> Self {
        let required = catalogue(client_type).iter().filter(|d| d.required);
        let mut total_required = 0;
        let mut uploaded_required = 0;
        for d in required {
            total_required += 1;
            if documents.get(d.id).is_some_and(|s| s.uploaded) {
                uploaded_required += 1;
            }
        }
        let percent = if total_required == 0 {
            0
        } else {
            (uploaded_required * 100 / total_required) as u8
        };
        Self {
            uploaded_required,
            total_required,
            percent,
        }
    }

    /// Every required document has been uploaded.
    pub fn can_proceed(&self) -> bool {
        self.uploaded_required == self.total_required
    }
}

/// Names of required documents that are still missing.
pub fn missing_required(client_type: ClientType, documents: &DocumentMap) -> Vec<&'static str> {
    catalogue(client_type)
        .iter()
        .filter(|d| d.required && !documents.get(d.id).is_some_and(|s| s.uploaded))
        .map(|d| d.name)
        .collect()
}

/// Record a successful upload in the wizard's document map.
pub fn mark_uploaded(documents: &mut DocumentMap, doc_id: &str, file_name: &str) {
    documents.insert(
        doc_id.to_string(),
        DocumentStatus {
            uploaded: true,
            file_name: Some(file_name.to_string()),
        },
    );
}

// ---------------------------------------------------------------------------
// File names and storage keys
// ---------------------------------------------------------------------------

/// Extract and validate the extension of an uploaded file name.
///
/// Returns the lowercased extension without the dot.
pub fn extension_of(file_name: &str) -> Result<String, CoreError> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| {
            CoreError::Validation(format!("File '{file_name}' has no extension"))
        })?;

    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "File type '.{ext}' is not accepted. Allowed: {}",
            ACCEPTED_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

/// Relative storage key for an uploaded document.
///
/// `timestamp_ms` is milliseconds since the Unix epoch, so repeated uploads
/// of the same document never collide.
pub fn storage_key(client_id: DbId, doc_id: &str, timestamp_ms: i64, ext: &str) -> String {
    format!("{client_id}/{doc_id}-{timestamp_ms}.{ext}")
}

/// MIME type served for a stored file with the given extension.
pub fn content_type(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}
