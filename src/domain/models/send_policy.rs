#[cfg(test)]
#[path = "send_policy_test.rs"]
mod tests;

use strum::EnumString;
use strum::EnumVariantNames;

/// What happens when a send is requested while another exchange is still
/// waiting on the chat endpoint.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, EnumVariantNames, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum SendPolicy {
    /// Refuse the send and leave the draft untouched.
    #[default]
    Reject,
    /// Run the exchanges side by side. Replies land in the order they settle.
    Allow,
}
