/// A MailChimp language code, e.g. `en` or `it`.
///
/// MailChimp only wants the language part of a locale, so `en_US` becomes
/// `en`; whatever follows the first underscore is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language(String);

impl Language {
    /// Returns `None` when there is no language part, i.e. the locale is empty
    /// or starts with an underscore.
    pub fn from_locale(locale: &str) -> Option<Self> {
        match locale.split('_').next() {
            Some(lang) if !lang.is_empty() => Some(Self(lang.to_string())),
            _ => None,
        }
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str { &self.0 }
}
