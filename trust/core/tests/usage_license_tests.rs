// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use artifact_trust_core::application::authorizer::{ArtifactAuthorizer, LicenseAwareAuthorizer};
use artifact_trust_core::application::usage_license_service::{UsageLicenseError, UsageLicenseService};
use artifact_trust_core::domain::authorization::{AccessDenied, Action};
use artifact_trust_core::domain::principal::{
    CustomerOrganizationId, Organization, OrganizationFeature, OrganizationId, Principal, UserRole,
};
use artifact_trust_core::domain::usage_license::{NewUsageLicense, UsageLicense, UsageLicenseValidationError};
use artifact_trust_core::infrastructure::license_oracle::{ArtifactEntitlement, RepositoryLicenseOracle};
use artifact_trust_core::infrastructure::repositories::InMemoryUsageLicenseRepository;
use artifact_trust_core::infrastructure::usage_license::{
    decode_unverified, generate_token, Ed25519LicenseKey, PlatformSigningKey, UsageLicenseTokenIssuer,
    UsageLicenseTokenVerifier, VerifyError,
};
use chrono::{Duration, Utc};
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use serde_json::json;
use serde_json::value::RawValue;
use std::sync::Arc;

const ISSUER: &str = "hub.example.com";

fn signed_key() -> Arc<PlatformSigningKey> {
    let key = Ed25519LicenseKey::from_signing_key(SigningKey::generate(&mut OsRng)).unwrap();
    Arc::new(PlatformSigningKey::Ed25519(key))
}

fn request(name: &str, payload: &str, customer: Option<CustomerOrganizationId>) -> NewUsageLicense {
    let now = Utc::now();
    NewUsageLicense {
        name: name.to_string(),
        description: Some("annual plan".to_string()),
        payload: RawValue::from_string(payload.to_string()).unwrap(),
        not_before: now - Duration::minutes(5),
        expires_at: now + Duration::days(365),
        customer_organization_id: customer,
    }
}

#[tokio::test]
async fn test_issued_token_verifies_with_platform_key() {
    let key = signed_key();
    let service = UsageLicenseService::new(
        Arc::new(InMemoryUsageLicenseRepository::new()),
        Arc::new(UsageLicenseTokenIssuer::new(ISSUER, key.clone())),
    );
    let org = OrganizationId::new();
    let customer = CustomerOrganizationId::new();

    let license = service
        .create(org, request("gold", r#"{"seats": 25, "features": ["sso", "audit"]}"#, Some(customer)))
        .await
        .unwrap();

    let verifier = UsageLicenseTokenVerifier::new(&key.verifying_key().unwrap(), ISSUER).unwrap();
    let claims = verifier.verify(&license.token).unwrap().claims;

    assert_eq!(claims.sub, license.id.to_string());
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.nbf, license.not_before.timestamp());
    assert_eq!(claims.exp, license.expires_at.timestamp());
    assert_eq!(claims.custom.get("seats"), Some(&json!(25)));
    assert_eq!(claims.custom.get("features"), Some(&json!(["sso", "audit"])));
}

#[test]
fn test_unsigned_token_carries_same_claims() {
    let license = UsageLicense::new(
        OrganizationId::new(),
        request("trial", r#"{"seats": 1, "features": ["sso"], "tier": "gold"}"#, Some(CustomerOrganizationId::new())),
    )
    .unwrap();

    let signing_key = signed_key();
    let signed = decode_unverified(&generate_token(&license, ISSUER, &signing_key).unwrap()).unwrap();
    let unsigned_token = generate_token(&license, ISSUER, &PlatformSigningKey::Unconfigured).unwrap();
    let unsigned = decode_unverified(&unsigned_token).unwrap();

    assert!(signed.signed);
    assert!(!unsigned.signed);
    assert_eq!(unsigned.algorithm, "none");

    let (s, u) = (&signed.claims, &unsigned.claims);
    assert_eq!(s.iss, u.iss);
    assert_eq!(s.sub, u.sub);
    assert_eq!(s.aud, u.aud);
    assert_eq!(s.nbf, u.nbf);
    assert_eq!(s.exp, u.exp);
    assert_eq!(s.custom, u.custom);
    assert_ne!(s.jti, u.jti);
    assert_eq!(u.custom.get("tier"), Some(&json!("gold")));

    let verifier = UsageLicenseTokenVerifier::new(&signing_key.verifying_key().unwrap(), ISSUER).unwrap();
    assert!(matches!(verifier.verify(&unsigned_token), Err(VerifyError::Unsigned)));
}

#[tokio::test]
async fn test_empty_window_never_reaches_codec() {
    let repo = Arc::new(InMemoryUsageLicenseRepository::new());
    let service = UsageLicenseService::new(
        repo.clone(),
        Arc::new(UsageLicenseTokenIssuer::new(ISSUER, signed_key())),
    );
    let org = OrganizationId::new();
    let mut req = request("gold", "{}", None);
    req.expires_at = req.not_before;

    let err = service.create(org, req).await.unwrap_err();
    assert!(matches!(
        err,
        UsageLicenseError::Validation(UsageLicenseValidationError::InvalidWindow)
    ));
    assert!(service.list_for_vendor(org).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_customer_pull_follows_license_lifecycle() {
    let repo = Arc::new(InMemoryUsageLicenseRepository::new());
    let oracle = Arc::new(RepositoryLicenseOracle::new(repo.clone()));
    let service = UsageLicenseService::new(
        repo.clone(),
        Arc::new(UsageLicenseTokenIssuer::new(ISSUER, signed_key())),
    )
    .with_revocation_listener(oracle.clone());
    let authorizer = LicenseAwareAuthorizer::new(oracle.clone());

    let organization = Organization {
        id: OrganizationId::new(),
        slug: Some("acme".to_string()),
        features: [OrganizationFeature::Licensing].into_iter().collect(),
    };
    let customer_org = CustomerOrganizationId::new();
    let principal = Principal::customer(organization.clone(), customer_org, Some(UserRole::ReadOnly));

    let denied = authorizer
        .authorize_reference(&principal, "acme/widget", "1.0", Action::Read)
        .await
        .unwrap_err();
    assert_eq!(denied.denial(), Some(&AccessDenied::LicenseRequired));

    let license = service
        .create(organization.id, request("widget-1.x", "{}", Some(customer_org)))
        .await
        .unwrap();
    oracle.grant(
        license.id,
        ArtifactEntitlement::new("acme", "widget").with_references(["1.0", "1.1"]),
    );

    assert!(authorizer
        .authorize_reference(&principal, "acme/widget", "1.0", Action::Read)
        .await
        .is_ok());
    assert!(authorizer
        .authorize_reference(&principal, "acme/widget", "2.0", Action::Read)
        .await
        .is_err());

    service.delete(organization.id, license.id).await.unwrap();
    assert_eq!(oracle.granted_licenses(), 0);
    assert!(authorizer
        .authorize_reference(&principal, "acme/widget", "1.0", Action::Read)
        .await
        .is_err());
}

#[tokio::test]
async fn test_customer_listing_excludes_org_wide_and_foreign_licenses() {
    let service = UsageLicenseService::new(
        Arc::new(InMemoryUsageLicenseRepository::new()),
        Arc::new(UsageLicenseTokenIssuer::new(ISSUER, signed_key())),
    );
    let org = OrganizationId::new();
    let customer = CustomerOrganizationId::new();

    service.create(org, request("zeta", "{}", Some(customer))).await.unwrap();
    service.create(org, request("alpha", "{}", Some(customer))).await.unwrap();
    service.create(org, request("everyone", "{}", None)).await.unwrap();
    service
        .create(org, request("other", "{}", Some(CustomerOrganizationId::new())))
        .await
        .unwrap();

    let names: Vec<String> = service
        .list_for_customer(org, customer)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(service.list_for_vendor(org).await.unwrap().len(), 4);
}
