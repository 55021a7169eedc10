//! Strongly-typed back-office identity reconstructed from, or materialized into, claims.

use std::collections::BTreeSet;
use std::str::FromStr;

use thiserror::Error;

use crate::claims::{Claim, ClaimValueType, ClaimsIdentity};
use crate::constants::{BACKOFFICE_AUTHENTICATION_TYPE, INTERNAL_ISSUER, claim_types};

/// Reasons a claim set cannot be turned into a [`BackOfficeIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A mandatory claim (user id or username) is absent or blank.
    #[error("missing required claim: {claim_type}")]
    MissingRequiredClaim { claim_type: &'static str },

    /// A claim that must hold an integer holds something else.
    #[error("claim {claim_type} has a malformed value '{value}'")]
    MalformedClaim {
        claim_type: &'static str,
        value: String,
    },
}

impl IdentityError {
    fn missing(claim_type: &'static str) -> Self {
        Self::MissingRequiredClaim { claim_type }
    }

    fn malformed(claim_type: &'static str, value: &str) -> Self {
        Self::MalformedClaim {
            claim_type,
            value: value.to_owned(),
        }
    }
}

/// The canonical back-office user identity.
///
/// An instance always has a user id and a non-empty username; there is no way
/// to observe a partially built identity. Apart from [`clone_fresh`](Self::clone_fresh)
/// an identity is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackOfficeIdentity {
    id: i32,
    username: String,
    real_name: String,
    start_content_nodes: Vec<i32>,
    start_media_nodes: BTreeSet<i32>,
    culture: String,
    security_stamp: String,
    allowed_applications: Vec<String>,
    roles: Vec<String>,
    claims: Vec<Claim>,
}

impl BackOfficeIdentity {
    /// Start building an identity from already-validated data (e.g. after a real login).
    #[must_use]
    pub fn builder(id: i32, username: impl Into<String>) -> BackOfficeIdentityBuilder {
        BackOfficeIdentityBuilder::new(id, username)
    }

    /// Validate and normalize an untrusted claim set.
    ///
    /// On success the identity keeps `claims` as its claim view, including any
    /// claim types it does not recognize.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::MissingRequiredClaim`] when the user id or username claim
    ///   is absent or blank
    /// - [`IdentityError::MalformedClaim`] when the user id or a start node claim is
    ///   not an integer
    pub fn try_from_claims(claims: Vec<Claim>) -> Result<Self, IdentityError> {
        let raw_id = required_value(&claims, claim_types::USER_ID)?;
        let id = raw_id
            .trim()
            .parse::<i32>()
            .map_err(|_| IdentityError::malformed(claim_types::USER_ID, raw_id))?;
        let username = required_value(&claims, claim_types::USERNAME)?.to_owned();

        let real_name = first_value(&claims, claim_types::REAL_NAME);
        let culture = first_value(&claims, claim_types::CULTURE);
        let security_stamp = first_value(&claims, claim_types::SECURITY_STAMP);

        let start_content_nodes: Vec<i32> = parse_all(&claims, claim_types::START_CONTENT_NODE)?;
        let start_media_nodes: BTreeSet<i32> = parse_all(&claims, claim_types::START_MEDIA_NODE)?;
        let allowed_applications = all_values(&claims, claim_types::ALLOWED_APPLICATIONS);
        let roles = all_values(&claims, claim_types::ROLE);

        Ok(Self {
            id,
            username,
            real_name,
            start_content_nodes,
            start_media_nodes,
            culture,
            security_stamp,
            allowed_applications,
            roles,
            claims,
        })
    }

    /// Copy of this identity with a claim view re-materialized from the typed
    /// fields. Claims this identity carried beyond its typed fields are dropped.
    #[must_use]
    pub fn clone_fresh(&self) -> Self {
        let mut cloned = Self {
            claims: Vec::new(),
            ..self.clone()
        };
        cloned.claims = cloned.materialize_claims();
        cloned
    }

    /// Export as a generic claims identity, e.g. to put into an authentication ticket.
    #[must_use]
    pub fn to_claims_identity(&self) -> ClaimsIdentity {
        ClaimsIdentity::authenticated(BACKOFFICE_AUTHENTICATION_TYPE, self.claims.clone())
    }

    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn real_name(&self) -> &str {
        &self.real_name
    }

    /// Content scoping roots in encounter order. `[-1]` means unrestricted.
    #[must_use]
    pub fn start_content_nodes(&self) -> &[i32] {
        &self.start_content_nodes
    }

    #[must_use]
    pub fn start_media_nodes(&self) -> &BTreeSet<i32> {
        &self.start_media_nodes
    }

    #[must_use]
    pub fn culture(&self) -> &str {
        &self.culture
    }

    #[must_use]
    pub fn security_stamp(&self) -> &str {
        &self.security_stamp
    }

    #[must_use]
    pub fn allowed_applications(&self) -> &[String] {
        &self.allowed_applications
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.is(claim_type))
    }

    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn authentication_type(&self) -> &'static str {
        BACKOFFICE_AUTHENTICATION_TYPE
    }

    /// Always true: an identity without a user id and username cannot exist.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn is_authenticated(&self) -> bool {
        true
    }

    #[must_use]
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    fn materialize_claims(&self) -> Vec<Claim> {
        let int_claim = |claim_type: &str, value: i32| {
            Claim::new(
                claim_type,
                value.to_string(),
                ClaimValueType::Integer32,
                INTERNAL_ISSUER,
            )
        };
        let str_claim = |claim_type: &str, value: &str| {
            Claim::new(claim_type, value, ClaimValueType::String, INTERNAL_ISSUER)
        };

        let mut claims = Vec::with_capacity(
            5 + self.start_content_nodes.len()
                + self.start_media_nodes.len()
                + self.allowed_applications.len()
                + self.roles.len(),
        );
        claims.push(int_claim(claim_types::USER_ID, self.id));
        claims.push(str_claim(claim_types::USERNAME, &self.username));
        claims.push(str_claim(claim_types::REAL_NAME, &self.real_name));
        claims.extend(
            self.start_content_nodes
                .iter()
                .map(|&n| int_claim(claim_types::START_CONTENT_NODE, n)),
        );
        claims.extend(
            self.start_media_nodes
                .iter()
                .map(|&n| int_claim(claim_types::START_MEDIA_NODE, n)),
        );
        claims.push(str_claim(claim_types::CULTURE, &self.culture));
        claims.push(str_claim(claim_types::SECURITY_STAMP, &self.security_stamp));
        claims.extend(
            self.allowed_applications
                .iter()
                .map(|a| str_claim(claim_types::ALLOWED_APPLICATIONS, a)),
        );
        claims.extend(self.roles.iter().map(|r| str_claim(claim_types::ROLE, r)));
        claims
    }
}

impl TryFrom<ClaimsIdentity> for BackOfficeIdentity {
    type Error = IdentityError;

    fn try_from(identity: ClaimsIdentity) -> Result<Self, Self::Error> {
        Self::try_from_claims(identity.into_claims())
    }
}

/// Builder for the trusted construction path.
///
/// The resulting claim view holds one claim per scalar field and one claim per
/// element of each sequence field, all issued by [`INTERNAL_ISSUER`].
#[derive(Debug, Clone)]
pub struct BackOfficeIdentityBuilder {
    id: i32,
    username: String,
    real_name: String,
    start_content_nodes: Vec<i32>,
    start_media_nodes: BTreeSet<i32>,
    culture: String,
    security_stamp: String,
    allowed_applications: Vec<String>,
    roles: Vec<String>,
}

impl BackOfficeIdentityBuilder {
    fn new(id: i32, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            real_name: String::new(),
            start_content_nodes: Vec::new(),
            start_media_nodes: BTreeSet::new(),
            culture: String::new(),
            security_stamp: String::new(),
            allowed_applications: Vec::new(),
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = real_name.into();
        self
    }

    #[must_use]
    pub fn start_content_nodes(mut self, nodes: impl IntoIterator<Item = i32>) -> Self {
        self.start_content_nodes = nodes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn start_media_nodes(mut self, nodes: impl IntoIterator<Item = i32>) -> Self {
        self.start_media_nodes = nodes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    #[must_use]
    pub fn security_stamp(mut self, security_stamp: impl Into<String>) -> Self {
        self.security_stamp = security_stamp.into();
        self
    }

    #[must_use]
    pub fn allowed_applications<I>(mut self, applications: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.allowed_applications = applications.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn roles<I>(mut self, roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// # Errors
    ///
    /// Returns [`IdentityError::MissingRequiredClaim`] when the username is blank.
    pub fn build(self) -> Result<BackOfficeIdentity, IdentityError> {
        self.build_with_claims(Vec::new())
    }

    /// Build, keeping `existing` claims ahead of the materialized ones.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingRequiredClaim`] when the username is blank.
    pub fn build_with_claims(
        self,
        existing: Vec<Claim>,
    ) -> Result<BackOfficeIdentity, IdentityError> {
        if self.username.trim().is_empty() {
            return Err(IdentityError::missing(claim_types::USERNAME));
        }
        let mut identity = BackOfficeIdentity {
            id: self.id,
            username: self.username,
            real_name: self.real_name,
            start_content_nodes: self.start_content_nodes,
            start_media_nodes: self.start_media_nodes,
            culture: self.culture,
            security_stamp: self.security_stamp,
            allowed_applications: self.allowed_applications,
            roles: self.roles,
            claims: existing,
        };
        let materialized = identity.materialize_claims();
        identity.claims.extend(materialized);
        Ok(identity)
    }
}

fn first_claim<'a>(claims: &'a [Claim], claim_type: &str) -> Option<&'a str> {
    claims.iter().find(|c| c.is(claim_type)).map(Claim::value)
}

fn required_value<'a>(
    claims: &'a [Claim],
    claim_type: &'static str,
) -> Result<&'a str, IdentityError> {
    first_claim(claims, claim_type)
        .filter(|v| !v.trim().is_empty())
        .ok_or(IdentityError::missing(claim_type))
}

fn first_value(claims: &[Claim], claim_type: &str) -> String {
    first_claim(claims, claim_type)
        .unwrap_or_default()
        .to_owned()
}

fn all_values(claims: &[Claim], claim_type: &str) -> Vec<String> {
    claims
        .iter()
        .filter(|c| c.is(claim_type))
        .map(|c| c.value().to_owned())
        .collect()
}

fn parse_all<C>(claims: &[Claim], claim_type: &'static str) -> Result<C, IdentityError>
where
    C: FromIterator<i32>,
{
    claims
        .iter()
        .filter(|c| c.is(claim_type))
        .map(|c| {
            i32::from_str(c.value().trim())
                .map_err(|_| IdentityError::malformed(claim_type, c.value()))
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    const TEST_ISSUER: &str = "TestIssuer";

    fn claim(claim_type: &str, value: &str) -> Claim {
        Claim::new(claim_type, value, ClaimValueType::String, TEST_ISSUER)
    }

    fn sample_identity() -> BackOfficeIdentity {
        BackOfficeIdentity::builder(1234, "testing")
            .real_name("hello world")
            .start_content_nodes([654])
            .start_media_nodes([654])
            .culture("en-us")
            .security_stamp("stamp-1")
            .allowed_applications(["content", "media"])
            .roles(["admin"])
            .build()
            .unwrap()
    }

    #[test]
    fn missing_user_id_fails() {
        let claims = vec![claim(claim_types::USERNAME, "testing")];

        let err = BackOfficeIdentity::try_from_claims(claims).unwrap_err();
        assert_eq!(
            err,
            IdentityError::MissingRequiredClaim {
                claim_type: claim_types::USER_ID
            }
        );
    }

    #[test]
    fn blank_username_fails() {
        let claims = vec![
            claim(claim_types::USER_ID, "1234"),
            claim(claim_types::USERNAME, "   "),
        ];

        let err = BackOfficeIdentity::try_from_claims(claims).unwrap_err();
        assert_eq!(
            err,
            IdentityError::MissingRequiredClaim {
                claim_type: claim_types::USERNAME
            }
        );
    }

    #[test]
    fn non_integer_user_id_fails() {
        let claims = vec![
            claim(claim_types::USER_ID, "abc"),
            claim(claim_types::USERNAME, "testing"),
        ];

        let err = BackOfficeIdentity::try_from_claims(claims).unwrap_err();
        assert!(matches!(
            err,
            IdentityError::MalformedClaim { claim_type, .. } if claim_type == claim_types::USER_ID
        ));
    }

    #[test]
    fn non_integer_start_node_fails() {
        let claims = vec![
            claim(claim_types::USER_ID, "1"),
            claim(claim_types::USERNAME, "testing"),
            claim(claim_types::START_MEDIA_NODE, "root"),
        ];

        assert!(BackOfficeIdentity::try_from_claims(claims).is_err());
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let claims = vec![
            claim(claim_types::USER_ID, "7"),
            claim(claim_types::USERNAME, "editor"),
        ];

        let identity = BackOfficeIdentity::try_from_claims(claims).unwrap();
        assert_eq!(identity.id(), 7);
        assert_eq!(identity.real_name(), "");
        assert_eq!(identity.culture(), "");
        assert_eq!(identity.security_stamp(), "");
        assert!(identity.start_content_nodes().is_empty());
        assert!(identity.start_media_nodes().is_empty());
        assert!(identity.roles().is_empty());
        assert_eq!(identity.claims().len(), 2);
    }

    #[test]
    fn media_nodes_collapse_but_applications_keep_duplicates() {
        let claims = vec![
            claim(claim_types::USER_ID, "1"),
            claim(claim_types::USERNAME, "testing"),
            claim(claim_types::START_MEDIA_NODE, "5"),
            claim(claim_types::START_MEDIA_NODE, "5"),
            claim(claim_types::START_CONTENT_NODE, "9"),
            claim(claim_types::START_CONTENT_NODE, "3"),
            claim(claim_types::ALLOWED_APPLICATIONS, "media"),
            claim(claim_types::ALLOWED_APPLICATIONS, "content"),
            claim(claim_types::ALLOWED_APPLICATIONS, "media"),
        ];

        let identity = BackOfficeIdentity::try_from_claims(claims).unwrap();
        assert_eq!(identity.start_media_nodes().len(), 1);
        assert_eq!(identity.start_content_nodes(), &[9, 3]);
        assert_eq!(
            identity.allowed_applications(),
            &["media", "content", "media"]
        );
    }

    #[test]
    fn unrecognized_claims_are_preserved() {
        let claims = vec![
            claim(claim_types::USER_ID, "1"),
            claim(claim_types::USERNAME, "testing"),
            claim("TestClaim1", "test"),
        ];

        let identity = BackOfficeIdentity::try_from_claims(claims).unwrap();
        assert_eq!(identity.find_first("TestClaim1").map(Claim::value), Some("test"));
    }

    #[test]
    fn builder_materializes_one_claim_per_value() {
        let identity = sample_identity();

        // 5 scalars + 1 content node + 1 media node + 2 apps + 1 role
        assert_eq!(identity.claims().len(), 10);
        assert!(
            identity
                .claims()
                .iter()
                .all(|c| c.issuer() == INTERNAL_ISSUER)
        );
        assert_eq!(
            identity
                .find_first(claim_types::USER_ID)
                .map(Claim::value_type),
            Some(ClaimValueType::Integer32)
        );
    }

    #[test]
    fn security_stamp_slot_exists_when_empty() {
        let identity = BackOfficeIdentity::builder(1, "u").build().unwrap();

        assert_eq!(
            identity
                .find_first(claim_types::SECURITY_STAMP)
                .map(Claim::value),
            Some("")
        );
    }

    #[test]
    fn build_with_claims_appends_materialized_claims() {
        let existing = vec![claim("TestClaim1", "test"), claim("TestClaim1", "test")];

        let identity = BackOfficeIdentity::builder(1234, "testing")
            .real_name("hello world")
            .start_content_nodes([654])
            .start_media_nodes([654])
            .culture("en-us")
            .security_stamp("stamp")
            .allowed_applications(["content", "media"])
            .roles(["admin"])
            .build_with_claims(existing)
            .unwrap();

        assert_eq!(identity.claims().len(), 12);
        assert_eq!(identity.claims()[0].claim_type(), "TestClaim1");
    }

    #[test]
    fn builder_rejects_blank_username() {
        for username in ["", "   "] {
            assert_eq!(
                BackOfficeIdentity::builder(1, username).build(),
                Err(IdentityError::MissingRequiredClaim {
                    claim_type: claim_types::USERNAME,
                })
            );
        }
        assert!(
            BackOfficeIdentity::builder(1, "")
                .build_with_claims(vec![claim("TestClaim1", "test")])
                .is_err()
        );
    }

    #[test]
    fn built_identity_survives_rebuild_from_its_own_claims() {
        let identity = BackOfficeIdentity::builder(9, "editor")
            .roles(["writer"])
            .build()
            .unwrap();

        let rebuilt = BackOfficeIdentity::try_from(identity.to_claims_identity()).unwrap();

        assert_eq!(rebuilt.id(), 9);
        assert_eq!(rebuilt.username(), "editor");
        assert_eq!(rebuilt.roles(), identity.roles());
    }

    #[test]
    fn clone_fresh_rematerializes_claims() {
        let mut claims = sample_identity().claims().to_vec();
        claims.push(claim("Extra", "1"));
        claims.push(claim("Extra", "2"));
        let identity = BackOfficeIdentity::try_from_claims(claims).unwrap();
        assert_eq!(identity.claims().len(), 12);

        let cloned = identity.clone_fresh();

        assert_eq!(cloned.claims().len(), 10);
        assert_eq!(cloned.id(), identity.id());
        assert_eq!(cloned.username(), identity.username());
        assert_eq!(cloned.start_media_nodes(), identity.start_media_nodes());
        assert_eq!(cloned.allowed_applications(), identity.allowed_applications());
        assert_eq!(cloned.security_stamp(), identity.security_stamp());
        assert!(cloned.find_first("Extra").is_none());
    }

    #[test]
    fn claims_round_trip_through_claims_identity() {
        let identity = sample_identity();
        let exported = identity.to_claims_identity();
        assert!(exported.is_authenticated());

        let rebuilt = BackOfficeIdentity::try_from(exported).unwrap();
        assert_eq!(rebuilt, identity);
    }
}
