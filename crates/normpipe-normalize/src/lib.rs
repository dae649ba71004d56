//! Normpipe Normalize - plugins that shape raw records into the shell
//!
//! Heterogeneous security records (CloudTrail, VPC flow, syslog, SaaS audit
//! trails, web access logs) arrive here in whatever shape their producer
//! chose. These plugins push every one of them toward the same canonical
//! form: lowercased keys, the seven-field shell plus `details`, discovered
//! source/destination addresses, and a normalized UTC timestamp.

mod event_shell;
mod gsuite_login;
mod ip_addresses;
mod lowercase_keys;
mod timestamps;

pub use event_shell::EventShell;
pub use gsuite_login::GsuiteLogin;
pub use ip_addresses::IpAddresses;
pub use lowercase_keys::LowercaseKeys;
pub use timestamps::Timestamps;

use normpipe_core::Transformation;

/// The full normalization plugin set. Order here is irrelevant; the
/// registry orders by declared priority.
pub fn plugins() -> Vec<Box<dyn Transformation>> {
    vec![
        Box::new(LowercaseKeys),
        Box::new(EventShell),
        Box::new(IpAddresses),
        Box::new(Timestamps),
        Box::new(GsuiteLogin),
    ]
}
