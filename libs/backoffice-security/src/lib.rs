#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Back-office security model: claims, the typed back-office identity, the
//! multi-identity request principal and authentication tickets.

pub mod claims;
pub mod constants;
pub mod identity;
pub mod principal;
pub mod ticket;

pub use claims::{Claim, ClaimValueType, ClaimsIdentity};
pub use identity::{BackOfficeIdentity, BackOfficeIdentityBuilder, IdentityError};
pub use principal::{ClaimsPrincipal, Identity};
pub use ticket::{
    AuthenticationTicket, TICKET_BIN_VERSION, TicketCodecError, decode_ticket, encode_ticket,
};
