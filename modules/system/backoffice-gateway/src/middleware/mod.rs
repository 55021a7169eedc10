pub mod antiforgery;
pub mod preview;
