use md5::Digest;
use md5::Md5;
use validator::ValidateEmail;

#[derive(Debug, Clone)]
/// An email address that passed validation; the only way to reach MailChimp's
/// member endpoints. The address is kept as given (MailChimp stores the case
/// the subscriber typed), while `member_id` always works on the lowercased
/// form.
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        ValidateEmail::validate_email(&email)
            .then_some(Self(email.clone()))
            .ok_or(format!("Invalid email: {email:?}"))
    }

    /// MailChimp's subscriber hash: the lowercase hex MD5 digest of the
    /// lowercased address.
    pub fn member_id(&self) -> MemberId {
        let digest = Md5::digest(self.0.to_lowercase().as_bytes());
        MemberId(hex::encode(digest))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

/// Path segment identifying a member within a list. Not stored anywhere;
/// derived from a `SubscriberEmail` per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberId(String);

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for MemberId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
