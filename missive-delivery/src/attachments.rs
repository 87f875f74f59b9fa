use base64::{
    Engine, alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
};
use missive_common::Attachment;
use missive_transport::OutboundAttachment;

use crate::PermanentError;

/// Standard alphabet with padding, tolerating non-zero trailing bits
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode standard base64, skipping the line breaks of wrapped encodings
fn decode(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if content.contains(['\r', '\n']) {
        let unwrapped: String = content.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        LENIENT.decode(unwrapped)
    } else {
        LENIENT.decode(content)
    }
}

/// Decode every attachment of a job, or none at all
///
/// # Errors
/// Returns [`PermanentError::InvalidAttachment`] for the first attachment
/// whose content is not standard base64
pub fn decode_attachments(
    attachments: &[Attachment],
) -> Result<Vec<OutboundAttachment>, PermanentError> {
    attachments
        .iter()
        .map(|attachment| {
            let content = decode(&attachment.content_bytes).map_err(|err| {
                PermanentError::InvalidAttachment {
                    name: attachment.name.clone(),
                    reason: err.to_string(),
                }
            })?;

            Ok(OutboundAttachment {
                name: attachment.name.clone(),
                content_type: attachment.content_type.clone(),
                content,
            })
        })
        .collect()
}
