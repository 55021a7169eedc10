use serde::{Deserialize, Serialize};

/// Declared format of a claim value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimValueType {
    String,
    Integer32,
    Boolean,
}

/// A single `(type, value)` assertion about a subject.
///
/// Claims arriving from cookies or upstream authentication are untrusted until
/// they have been validated against the [claim vocabulary](crate::constants::claim_types).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    claim_type: String,
    value: String,
    value_type: ClaimValueType,
    issuer: String,
    original_issuer: String,
}

impl Claim {
    /// Create a claim whose original issuer is the same as its issuer.
    #[must_use]
    pub fn new(
        claim_type: impl Into<String>,
        value: impl Into<String>,
        value_type: ClaimValueType,
        issuer: impl Into<String>,
    ) -> Self {
        let issuer = issuer.into();
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type,
            original_issuer: issuer.clone(),
            issuer,
        }
    }

    /// Override the original issuer (the party that first asserted the claim).
    #[must_use]
    pub fn with_original_issuer(mut self, original_issuer: impl Into<String>) -> Self {
        self.original_issuer = original_issuer.into();
        self
    }

    #[must_use]
    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn value_type(&self) -> ClaimValueType {
        self.value_type
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn original_issuer(&self) -> &str {
        &self.original_issuer
    }

    /// Whether this claim has the given type.
    #[must_use]
    pub fn is(&self, claim_type: &str) -> bool {
        self.claim_type == claim_type
    }
}

/// A generic, claims-bearing identity as produced by upstream authentication
/// or by decoding an authentication ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    authentication_type: Option<String>,
    claims: Vec<Claim>,
}

impl ClaimsIdentity {
    /// Create an unauthenticated identity carrying `claims`.
    #[must_use]
    pub fn new(claims: Vec<Claim>) -> Self {
        Self {
            authentication_type: None,
            claims,
        }
    }

    /// Create an identity authenticated by `authentication_type`.
    #[must_use]
    pub fn authenticated(authentication_type: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            claims,
        }
    }

    #[must_use]
    pub fn authentication_type(&self) -> Option<&str> {
        self.authentication_type.as_deref()
    }

    /// An identity is authenticated when it carries a non-empty authentication type.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authentication_type
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    #[must_use]
    pub fn into_claims(self) -> Vec<Claim> {
        self.claims
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    /// First claim of the given type, if any.
    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.is(claim_type))
    }

    /// All claims of the given type, in encounter order.
    pub fn find_all<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a Claim> + 'a {
        self.claims.iter().filter(move |c| c.is(claim_type))
    }

    #[must_use]
    pub fn has_claim(&self, claim_type: &str) -> bool {
        self.find_first(claim_type).is_some()
    }
}
