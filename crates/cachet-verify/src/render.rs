//! Result presentation.
//!
//! Renders verification records to an explicit sink. Every record gets a
//! prose checklist of the policy predicates that were evaluated, followed
//! by the verified signatures in the selected format.

use std::io::Write;

use crate::cert;
use crate::engine::VerificationRecord;
use crate::error::VerificationError;
use crate::payload::SimpleSigning;
use crate::registry::CandidateSignature;

/// How verified signatures are written after the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per signature, the set serialized as an array.
    Structured,
    /// Certificate common name and raw payload bytes, per signature.
    Text,
}

/// Render `records` to `sink`.
pub fn render(
    records: &[VerificationRecord],
    format: OutputFormat,
    sink: &mut dyn Write,
) -> Result<(), VerificationError> {
    for record in records {
        render_checklist(record, sink)?;
        match format {
            OutputFormat::Structured => render_structured(&record.verified_signatures, sink)?,
            OutputFormat::Text => render_text(&record.verified_signatures, sink)?,
        }
    }
    Ok(())
}

/// The checklist reflects which predicates were enabled for the call,
/// not their per-signature outcomes.
fn render_checklist(
    record: &VerificationRecord,
    sink: &mut dyn Write,
) -> Result<(), VerificationError> {
    writeln!(sink, "\nVerification for {} --", record.image_reference)?;
    writeln!(
        sink,
        "The following checks were performed on each of these signatures:"
    )?;
    for entry in &record.policy_checklist {
        writeln!(sink, "  - {}", entry.description)?;
    }
    Ok(())
}

fn render_text(
    signatures: &[CandidateSignature],
    sink: &mut dyn Write,
) -> Result<(), VerificationError> {
    for sig in signatures {
        if let Some(cn) = signer_common_name(sig) {
            writeln!(sink, "Certificate common name: {cn}")?;
        }
        sink.write_all(&sig.payload)?;
        writeln!(sink)?;
    }
    Ok(())
}

/// Each signature becomes its parsed payload with the certificate common
/// name injected into the optional section. A payload that does not parse
/// fails closed for that item alone.
fn render_structured(
    signatures: &[CandidateSignature],
    sink: &mut dyn Write,
) -> Result<(), VerificationError> {
    let mut items = Vec::with_capacity(signatures.len());
    for sig in signatures {
        match SimpleSigning::parse(&sig.payload) {
            Ok(payload) => {
                let payload = match signer_common_name(sig) {
                    Some(cn) => payload.annotate("CommonName", &cn),
                    None => payload,
                };
                items.push(serde_json::to_value(&payload)?);
            }
            Err(e) => {
                items.push(serde_json::Value::String(format!(
                    "error decoding the payload: {e}"
                )));
            }
        }
    }
    serde_json::to_writer(&mut *sink, &items)?;
    writeln!(sink)?;
    Ok(())
}

fn signer_common_name(sig: &CandidateSignature) -> Option<String> {
    sig.certificate
        .as_deref()
        .and_then(cert::parse)
        .and_then(|c| cert::common_name(&c))
}
