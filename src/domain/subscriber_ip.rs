use validator::ValidateIp;

/// An IPv4 or IPv6 address, recorded by MailChimp as the signup and opt-in
/// address of a new member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberIp(String);

impl SubscriberIp {
    pub fn parse(ip: String) -> Result<Self, String> {
        ValidateIp::validate_ip(&ip)
            .then_some(Self(ip.clone()))
            .ok_or(format!("Invalid IP address: {ip:?}"))
    }
}

impl AsRef<str> for SubscriberIp {
    fn as_ref(&self) -> &str { &self.0 }
}
