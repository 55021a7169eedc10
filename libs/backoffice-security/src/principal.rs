use crate::claims::{Claim, ClaimsIdentity};
use crate::constants::claim_types;
use crate::identity::BackOfficeIdentity;

/// One of the identities a request principal carries.
#[derive(Debug, Clone)]
pub enum Identity {
    /// Generic identity produced by upstream authentication.
    Claims(ClaimsIdentity),
    /// Validated back-office identity.
    BackOffice(Box<BackOfficeIdentity>),
}

impl Identity {
    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        match self {
            Self::Claims(identity) => identity.claims(),
            Self::BackOffice(identity) => identity.claims(),
        }
    }

    #[must_use]
    pub fn authentication_type(&self) -> Option<&str> {
        match self {
            Self::Claims(identity) => identity.authentication_type(),
            Self::BackOffice(identity) => Some(identity.authentication_type()),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        match self {
            Self::Claims(identity) => identity.is_authenticated(),
            Self::BackOffice(identity) => identity.is_authenticated(),
        }
    }

    /// Value of the user id claim, if this identity has one.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.claims()
            .iter()
            .find(|c| c.is(claim_types::USER_ID))
            .map(Claim::value)
    }
}

impl From<ClaimsIdentity> for Identity {
    fn from(identity: ClaimsIdentity) -> Self {
        Self::Claims(identity)
    }
}

impl From<BackOfficeIdentity> for Identity {
    fn from(identity: BackOfficeIdentity) -> Self {
        Self::BackOffice(Box::new(identity))
    }
}

/// The request principal: an ordered collection of independently
/// authenticated identities.
///
/// Upstream authentication places a `ClaimsPrincipal` into the request
/// extensions. Later stages may only append identities; existing identities
/// are never merged or overwritten.
#[derive(Debug, Clone, Default)]
pub struct ClaimsPrincipal {
    identities: Vec<Identity>,
}

impl ClaimsPrincipal {
    #[must_use]
    pub fn new(identity: impl Into<Identity>) -> Self {
        Self {
            identities: vec![identity.into()],
        }
    }

    /// Principal without any identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn add_identity(&mut self, identity: impl Into<Identity>) {
        self.identities.push(identity.into());
    }

    #[must_use]
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// The identity the principal was created with.
    #[must_use]
    pub fn primary_identity(&self) -> Option<&Identity> {
        self.identities.first()
    }

    /// First back-office identity attached to this principal.
    #[must_use]
    pub fn back_office_identity(&self) -> Option<&BackOfficeIdentity> {
        self.identities.iter().find_map(|identity| match identity {
            Identity::BackOffice(bo) => Some(bo.as_ref()),
            Identity::Claims(_) => None,
        })
    }

    /// Whether any identity is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identities.iter().any(Identity::is_authenticated)
    }

    /// Claims across all identities, in identity order.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.identities.iter().flat_map(Identity::claims)
    }

    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims().find(|c| c.is(claim_type))
    }

    #[must_use]
    pub fn is_in_role(&self, role: &str) -> bool {
        self.claims()
            .any(|c| c.is(claim_types::ROLE) && c.value() == role)
    }
}
