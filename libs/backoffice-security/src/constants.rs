//! Claim vocabulary and fixed identifiers shared by the back-office security model.

/// Claim types recognized when reconstructing a [`BackOfficeIdentity`](crate::BackOfficeIdentity).
pub mod claim_types {
    /// Numeric user identifier.
    pub const USER_ID: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

    /// Login name of the user.
    pub const USERNAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";

    /// Display name of the user.
    pub const REAL_NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname";

    /// Culture / locale of the user, e.g. `en-us`.
    pub const CULTURE: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/locality";

    /// Conventional role claim type.
    pub const ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

    /// Opaque security stamp; changing it invalidates identities issued before.
    pub const SECURITY_STAMP: &str = "urn:backoffice:claims:security-stamp";

    /// Content start node (scoping root). `-1` conventionally means unrestricted.
    pub const START_CONTENT_NODE: &str = "urn:backoffice:claims:start-content-node";

    /// Media start node (scoping root).
    pub const START_MEDIA_NODE: &str = "urn:backoffice:claims:start-media-node";

    /// Back-office section key the user may access.
    pub const ALLOWED_APPLICATIONS: &str = "urn:backoffice:claims:allowed-app";
}

/// Issuer stamped on claims materialized from typed identity fields.
pub const INTERNAL_ISSUER: &str = "BackOffice";

/// Authentication type reported by every [`BackOfficeIdentity`](crate::BackOfficeIdentity).
pub const BACKOFFICE_AUTHENTICATION_TYPE: &str = "BackOffice";

/// Start node value meaning "no restriction".
pub const UNRESTRICTED_START_NODE: i32 = -1;
