use secrecy::ExposeSecret;
use secrecy::Secret;

/// A MailChimp API key, of the form `<key>-<dc>`. The data center (`dc`)
/// suffix names the API host, e.g. `us6` -> `https://us6.api.mailchimp.com`.
///
/// Must be instantiated with `ApiKey::parse`. Only the part before the hyphen
/// is sent as the Basic auth password; it is kept behind `Secret` so it never
/// ends up in logs.
#[derive(Clone)]
pub struct ApiKey {
    key: Secret<String>,
    data_center: String,
}

impl ApiKey {
    pub fn parse(raw: Secret<String>) -> Result<Self, String> {
        match raw.expose_secret().trim().split_once('-') {
            Some((key, dc))
                if !key.is_empty()
                    && !dc.is_empty()
                    && dc.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                Ok(Self {
                    key: Secret::new(key.to_string()),
                    data_center: dc.to_lowercase(),
                })
            }
            // never echo the key itself
            _ => Err("API key must be of the form <key>-<dc>".to_string()),
        }
    }

    pub fn data_center(&self) -> &str { &self.data_center }

    /// `https://<dc>.api.mailchimp.com/3.0`, without a trailing slash; paths
    /// are appended as `{base_url}/lists/...`
    pub fn base_url(&self) -> String {
        format!("https://{}.api.mailchimp.com/3.0", self.data_center)
    }
}

impl ExposeSecret<String> for ApiKey {
    fn expose_secret(&self) -> &String { self.key.expose_secret() }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &"[REDACTED]")
            .field("data_center", &self.data_center)
            .finish()
    }
}
