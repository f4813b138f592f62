//! Default English message catalog
//!
//! Hosts with their own translation tables inject a [`Localizer`]; this one is
//! used when none is configured.

use bridge_traits::i18n::{Localizer, MESSAGE_DOMAIN};

/// Built-in English strings for the core's message keys.
///
/// Unknown keys, or keys from another domain, are returned unchanged the way
/// gettext does for a missing translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl EnglishCatalog {
    fn lookup(key: &str) -> Option<&'static str> {
        let text = match key {
            "done" => "Successfully authenticated with Google.",
            "noauthcode" => "No authorization code. Please authorize access to your Google contacts first.",
            "norefreshtoken" => "Error fetching refresh token.",
            "invalidgrant" => "Google rejected the stored authorization. Please authorize again.",
            "authfailed" => "Authentication with Google failed.",
            "googleauthfailed" => "Google refused the access token.",
            "googleforbidden" => "Access to Google contacts is forbidden.",
            "googleunreachable" => "Google contacts could not be reached.",
            "nodefaultgroup" => "No default contact group found in your Google account.",
            "storagefailed" => "Contacts could not be stored.",
            "contactsfound" => " contacts found.",
            _ => return None,
        };
        Some(text)
    }
}

impl Localizer for EnglishCatalog {
    fn gettext(&self, key: &str, domain: &str) -> String {
        if domain != MESSAGE_DOMAIN {
            return key.to_string();
        }

        Self::lookup(key)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::i18n::MessageKey;

    #[test]
    fn test_contacts_found_is_a_suffix() {
        let text = EnglishCatalog.message(MessageKey::ContactsFound);
        assert_eq!(format!("{}{}", 12, text), "12 contacts found.");
    }

    #[test]
    fn test_every_key_has_a_translation() {
        let keys = [
            MessageKey::Done,
            MessageKey::NoAuthCode,
            MessageKey::NoRefreshToken,
            MessageKey::InvalidGrant,
            MessageKey::AuthFailed,
            MessageKey::GoogleAuthFailed,
            MessageKey::GoogleForbidden,
            MessageKey::GoogleUnreachable,
            MessageKey::NoDefaultGroup,
            MessageKey::StorageFailed,
            MessageKey::ContactsFound,
        ];

        for key in keys {
            assert_ne!(EnglishCatalog.message(key), key.as_str(), "{key} untranslated");
        }
    }

    #[test]
    fn test_unknown_key_and_foreign_domain_pass_through() {
        assert_eq!(EnglishCatalog.gettext("nosuchkey", MESSAGE_DOMAIN), "nosuchkey");
        assert_eq!(EnglishCatalog.gettext("done", "other_plugin"), "done");
    }
}
