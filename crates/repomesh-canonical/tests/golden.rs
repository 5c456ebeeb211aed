use repomesh_canonical::{canonical_bytes, canonical_bytes_without, ContentHash, Keypair};
use serde_json::json;

#[test]
fn canonicalization_is_total_and_deterministic() {
    let left = json!({
        "type": "ReleasePublished",
        "repo": "acme/widgets",
        "version": "1.2.3",
        "artifacts": [{"name": "x.tgz", "sha256": "00".repeat(32), "uri": "https://dist/x.tgz"}]
    });
    let right = json!({
        "artifacts": [{"uri": "https://dist/x.tgz", "sha256": "00".repeat(32), "name": "x.tgz"}],
        "version": "1.2.3",
        "repo": "acme/widgets",
        "type": "ReleasePublished"
    });
    assert_eq!(
        canonical_bytes(&left).unwrap(),
        canonical_bytes(&right).unwrap()
    );
}

#[test]
fn content_hash_commits_to_unsigned_form() {
    let signed = json!({
        "repo": "acme/widgets",
        "version": "1.2.3",
        "signature": {"alg": "ed25519", "keyId": "k1", "value": "AAAA"}
    });
    let unsigned = json!({
        "repo": "acme/widgets",
        "version": "1.2.3"
    });
    let signed_bytes = canonical_bytes_without(&signed, &["signature"]).unwrap();
    let unsigned_bytes = canonical_bytes(&unsigned).unwrap();
    assert_eq!(signed_bytes, unsigned_bytes);
    assert_eq!(
        ContentHash::of_bytes(&signed_bytes),
        ContentHash::of_bytes(&unsigned_bytes)
    );
}

#[test]
fn hash_serializes_as_bare_hex_string() {
    let hash = ContentHash::parse("11".repeat(32)).unwrap();
    assert_eq!(
        serde_json::to_string(&hash).unwrap(),
        format!("\"{}\"", "11".repeat(32))
    );
}

#[test]
fn signature_binds_to_the_raw_hash_bytes() {
    let keypair = Keypair::from_seed(&[1u8; 32]);
    let value = json!({"repo": "acme/widgets", "commit": "abc123"});
    let hash = ContentHash::of_bytes(&canonical_bytes(&value).unwrap());
    let signature = keypair.sign_hash(&hash);

    keypair.public_key().verify_hash(&hash, &signature).unwrap();

    // One changed character in any hashed field yields a different hash,
    // which the signature no longer covers.
    let flipped = json!({"repo": "acme/widgets", "commit": "abc124"});
    let flipped_hash = ContentHash::of_bytes(&canonical_bytes(&flipped).unwrap());
    assert_ne!(hash, flipped_hash);
    assert!(keypair
        .public_key()
        .verify_hash(&flipped_hash, &signature)
        .is_err());
}
