//! Request authentication layered over an [`HttpClient`](super::HttpClient).
//!
//! - [`ApiKey`] sets a header (Azure AD bearer tokens).
//! - [`UrlParam`] appends one query parameter (Socrata `$$app_token`).
//! - [`SasToken`] appends a pre-encoded shared access signature.

mod api_key;
mod sas;
mod url_param;

pub use api_key::ApiKey;
pub use sas::SasToken;
pub use url_param::UrlParam;
