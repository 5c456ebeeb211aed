use repomesh_canonical::{ContentHash, KeyId, RepoId, Timestamp, Version};
use repomesh_core::{ErrorKind, Event, EventType, TrustError};
use serde_json::Value;

const SIGNATURE_ALG: &str = "ed25519";

/// Encodes an event as a single log line (without the trailing newline).
///
/// The wire form is compact JSON; serde escapes any newline inside string
/// fields, so the result never spans lines.
pub fn encode_line(event: &Event) -> Result<String, TrustError> {
    serde_json::to_string(event)
        .map_err(|err| TrustError::new(ErrorKind::MalformedEvent, err.to_string()))
}

/// Parses one log line into a schema-conformant event.
///
/// JSON syntax failures are `MalformedEvent`; a well-formed value that does
/// not satisfy the event schema is `SchemaViolation`.
pub fn parse_line(line: &str) -> Result<Event, TrustError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|err| TrustError::new(ErrorKind::MalformedEvent, err.to_string()))?;
    validate_event(&value)
}

/// Validates a JSON value against the event schema.
pub fn validate_event(value: &Value) -> Result<Event, TrustError> {
    let event: Event = serde_json::from_value(value.clone())
        .map_err(|err| TrustError::new(ErrorKind::SchemaViolation, err.to_string()))?;

    // Identifier newtypes deserialize transparently, so their patterns are
    // enforced here rather than inside serde.
    if !RepoId::is_valid(event.repo.as_ref()) {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("repo '{}' is not of form <org>/<name>", event.repo),
        ));
    }
    if !Version::is_valid(event.version.as_ref()) {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("version '{}' is not a semantic version", event.version),
        ));
    }
    if !Timestamp::is_valid(event.timestamp.as_ref()) {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("timestamp '{}' is not UTC ISO-8601", event.timestamp),
        ));
    }

    let signature = event.signature.as_ref().ok_or_else(|| {
        TrustError::new(ErrorKind::SchemaViolation, "missing signature block")
    })?;
    if signature.alg != SIGNATURE_ALG {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("signature.alg must be '{SIGNATURE_ALG}'"),
        ));
    }
    if !KeyId::is_valid(signature.key_id.as_ref()) {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("signature.keyId '{}' is not a key identifier", signature.key_id),
        ));
    }

    if event.commit.is_empty() || !event.commit.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("commit '{}' is not a hex identifier", event.commit),
        ));
    }

    for artifact in &event.artifacts {
        if !ContentHash::is_hex64(&artifact.sha256) {
            return Err(TrustError::new(
                ErrorKind::SchemaViolation,
                format!("artifact '{}' sha256 is not 64 lowercase hex", artifact.name),
            ));
        }
        if artifact.name.is_empty() {
            return Err(TrustError::new(
                ErrorKind::SchemaViolation,
                "artifact name must not be empty",
            ));
        }
    }

    for attestation in &event.attestations {
        if attestation.kind.is_empty() || attestation.uri.is_empty() {
            return Err(TrustError::new(
                ErrorKind::SchemaViolation,
                "attestation entries need both a type and a uri",
            ));
        }
    }

    if event.event_type == EventType::AttestationPublished && event.attestations.is_empty() {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            "AttestationPublished events must carry at least one attestation",
        ));
    }

    Ok(event)
}
