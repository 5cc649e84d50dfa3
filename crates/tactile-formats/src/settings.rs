//! Resolution settings

use serde::{Deserialize, Serialize};

use crate::blte::DecodeOptions;
use crate::root::{LocaleFlags, RootFilter};

/// Settings shared by the readers and the resolver
///
/// Serializable so callers can load them from their own configuration
/// files; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Locale whose root blocks are indexed
    pub locale: LocaleFlags,

    /// Skip root blocks that match neither every locale nor `locale`
    pub locale_filter: bool,

    /// Skip low violence root blocks
    pub skip_low_violence: bool,

    /// Check root record counts against the header
    pub validate_root_counts: bool,

    /// Check BLTE chunk checksums while decoding
    pub verify_blte_checksums: bool,

    /// Check index footer hashes when opening indices
    pub verify_index_footers: bool,

    /// Decode BLTE chunks concurrently
    pub parallel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: LocaleFlags::default(),
            locale_filter: true,
            skip_low_violence: true,
            validate_root_counts: false,
            verify_blte_checksums: false,
            verify_index_footers: true,
            parallel: true,
        }
    }
}

impl Settings {
    /// Create settings for a locale
    pub fn new(locale: LocaleFlags) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }

    /// Set the locale
    #[must_use]
    pub const fn with_locale(mut self, locale: LocaleFlags) -> Self {
        self.locale = locale;
        self
    }

    /// Enable or disable locale filtering
    #[must_use]
    pub const fn with_locale_filter(mut self, enabled: bool) -> Self {
        self.locale_filter = enabled;
        self
    }

    /// Enable or disable skipping low violence blocks
    #[must_use]
    pub const fn with_skip_low_violence(mut self, skip: bool) -> Self {
        self.skip_low_violence = skip;
        self
    }

    /// Enable or disable root count validation
    #[must_use]
    pub const fn with_validate_root_counts(mut self, validate: bool) -> Self {
        self.validate_root_counts = validate;
        self
    }

    /// Enable or disable BLTE checksum verification
    #[must_use]
    pub const fn with_verify_blte_checksums(mut self, verify: bool) -> Self {
        self.verify_blte_checksums = verify;
        self
    }

    /// Enable or disable index footer verification
    #[must_use]
    pub const fn with_verify_index_footers(mut self, verify: bool) -> Self {
        self.verify_index_footers = verify;
        self
    }

    /// Enable or disable concurrent decoding
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Root block filter for these settings
    pub const fn root_filter(&self) -> RootFilter {
        RootFilter {
            locale: self.locale,
            locale_filter: self.locale_filter,
            skip_low_violence: self.skip_low_violence,
            validate_counts: self.validate_root_counts,
        }
    }

    /// BLTE decode options for these settings
    pub const fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            total_size: None,
            verify_checksums: self.verify_blte_checksums,
            parallel: self.parallel,
        }
    }
}

impl From<&Settings> for RootFilter {
    fn from(settings: &Settings) -> Self {
        settings.root_filter()
    }
}

impl From<&Settings> for DecodeOptions {
    fn from(settings: &Settings) -> Self {
        settings.decode_options()
    }
}
