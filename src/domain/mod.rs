mod api_key;
mod language;
mod subscriber_email;
mod subscriber_ip;
// allow external `use` statements to skip `subscriber_email` etc
pub use api_key::ApiKey;
pub use language::Language;
pub use subscriber_email::MemberId;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_ip::SubscriberIp;
