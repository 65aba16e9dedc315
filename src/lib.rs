//! Thin client for MailChimp's v3 list member API: look up, subscribe,
//! unsubscribe and delete list members.
//!
//! The connector lives in `mailchimp_client`; `configuration` builds one from
//! the yaml files under `configuration/`.

pub mod configuration;
pub mod domain;
pub mod mailchimp_client;
pub mod telemetry;
pub mod utils;
