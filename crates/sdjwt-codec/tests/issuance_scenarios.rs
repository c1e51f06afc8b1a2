//! # Issuance, Reconstruction and Presentation Scenarios
//!
//! End-to-end runs of the codec with the default CSPRNG-backed providers,
//! covering whole-object, per-property and recursive disclosure of an
//! address claim, and presentation of nested claims.
//!
//! Set `RUST_LOG=sdjwt_codec=debug` to see the codec's events.

use sdjwt_codec::{
    recreate_claims, IssuanceConfig, ReconstructionPolicy, SdJwtFactory, UnsignedSdJwt,
    SD_ALG_CLAIM, SD_CLAIM,
};
use sdjwt_core::{ClaimPath, SdObject, SdObjectBuilder};
use sdjwt_crypto::{Disclosure, HashAlgorithm};
use serde_json::{json, Value};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

fn address() -> Value {
    json!({
        "street_address": "Schulstr. 12",
        "locality": "Schulpforta",
        "region": "Sachsen-Anhalt",
        "country": "DE"
    })
}

fn registered_claims() -> SdObjectBuilder {
    SdObjectBuilder::new()
        .claim("iss", json!("https://issuer.example.com"))
        .claim("iat", json!(1683000000))
        .claim("exp", json!(1883000000))
        .claim("sub", json!("user_42"))
}

fn address_members(all_sd: bool) -> SdObject {
    let mut builder = SdObjectBuilder::new();
    for (name, value) in address().as_object().cloned().unwrap_or_default() {
        builder = if all_sd || name == "region" || name == "country" {
            builder.sd_claim(name, value)
        } else {
            builder.claim(name, value)
        };
    }
    builder.build().unwrap()
}

fn sd_digests(object: &Value) -> Vec<&str> {
    object[SD_CLAIM]
        .as_array()
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn generate(claims: &SdObject) -> UnsignedSdJwt {
    SdJwtFactory::new().generate(claims).unwrap()
}

fn recreate(unsigned: &UnsignedSdJwt, disclosures: &[Disclosure]) -> Value {
    let payload = Value::Object(unsigned.payload.clone());
    let recreated = recreate_claims(&payload, disclosures, ReconstructionPolicy::default()).unwrap();
    Value::Object(recreated.claims)
}

#[test]
fn address_disclosed_as_a_whole() {
    init_tracing();
    let claims = registered_claims().sd_claim("address", address()).build().unwrap();
    let unsigned = generate(&claims);
    let payload = Value::Object(unsigned.payload.clone());

    assert_eq!(sd_digests(&payload).len(), 1);
    assert_eq!(unsigned.disclosures.len(), 1);
    let disclosure = Disclosure::decode(unsigned.disclosures[0].encoded()).unwrap();
    assert_eq!(disclosure.name(), Some("address"));
    assert_eq!(disclosure.value(), &address());
    assert_eq!(payload[SD_ALG_CLAIM], json!("sha-256"));

    assert_eq!(recreate(&unsigned, &unsigned.disclosures), claims.to_plain());
}

#[test]
fn address_members_disclosed_individually() {
    init_tracing();
    let claims = registered_claims()
        .never("address", address_members(true))
        .build()
        .unwrap();
    let unsigned = generate(&claims);
    let payload = Value::Object(unsigned.payload.clone());

    assert!(payload.get(SD_CLAIM).is_none());
    assert_eq!(sd_digests(&payload["address"]).len(), 4);
    assert_eq!(unsigned.disclosures.len(), 4);

    let revealed = recreate(&unsigned, &unsigned.disclosures);
    assert_eq!(revealed["address"], address());
}

#[test]
fn address_disclosed_recursively() {
    init_tracing();
    let claims = registered_claims()
        .always("address", address_members(true))
        .build()
        .unwrap();
    let unsigned = generate(&claims);
    let payload = Value::Object(unsigned.payload.clone());

    let top = sd_digests(&payload);
    assert_eq!(top.len(), 1);
    let container = unsigned
        .disclosures
        .iter()
        .find(|d| d.digest(HashAlgorithm::Sha256).as_str() == top[0])
        .unwrap();
    assert_eq!(container.name(), Some("address"));
    let nested = sd_digests(container.value());
    assert_eq!(nested.len(), 4);
    for digest in nested {
        assert_eq!(
            unsigned
                .disclosures
                .iter()
                .filter(|d| d.digest(HashAlgorithm::Sha256).as_str() == digest)
                .count(),
            1
        );
    }

    assert_eq!(recreate(&unsigned, &unsigned.disclosures), claims.to_plain());
}

#[test]
fn presentation_of_nested_members_keeps_their_container() {
    init_tracing();
    let claims = registered_claims()
        .always("address", address_members(false))
        .build()
        .unwrap();
    let unsigned = generate(&claims);
    let issued = sdjwt_codec::SdJwt::new(
        "header.payload.signature".to_string(),
        Value::Object(unsigned.payload.clone()),
        unsigned.disclosures.clone(),
    );
    assert_eq!(issued.disclosures().len(), 3);

    let address = ClaimPath::claim("address");
    let presented = issued
        .present(&[address.child("region"), address.child("country")])
        .unwrap();
    assert_eq!(presented.disclosures().len(), 3);

    let presented = issued.present(&[address.child("region")]).unwrap();
    let revealed = presented.recreate_claims().unwrap();
    let shown = Value::Object(revealed.claims);
    assert_eq!(shown["address"]["region"], json!("Sachsen-Anhalt"));
    assert!(shown["address"].get("country").is_none());
}

#[test]
fn configured_factory_uses_its_algorithm_and_floor() {
    init_tracing();
    let config = IssuanceConfig::from_json(
        r#"{"hash_algorithm": "sha-384", "fallback_minimum_digests": 6}"#,
    )
    .unwrap();
    let factory = SdJwtFactory::from_config(&config).unwrap();
    let claims = registered_claims().sd_claim("given_name", json!("Erika")).build().unwrap();
    let unsigned = factory.generate(&claims).unwrap();
    let payload = Value::Object(unsigned.payload.clone());

    assert_eq!(payload[SD_ALG_CLAIM], json!("sha-384"));
    assert_eq!(sd_digests(&payload).len(), 6);
    assert!(sd_digests(&payload)
        .contains(&unsigned.disclosures[0].digest(HashAlgorithm::Sha384).as_str()));

    let strict = recreate_claims(&payload, &unsigned.disclosures, ReconstructionPolicy::strict());
    assert_eq!(strict.unwrap_err().len(), 5);
    assert_eq!(recreate(&unsigned, &unsigned.disclosures), claims.to_plain());
}
