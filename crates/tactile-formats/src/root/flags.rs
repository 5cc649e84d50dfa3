//! Content and locale flags for root blocks

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::root::error::RootError;

/// Content flags describe how the files of a block are stored and used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentFlags(pub u32);

impl ContentFlags {
    /// No special flags
    pub const NONE: u32 = 0;

    /// Loaded on Windows
    pub const LOAD_ON_WINDOWS: u32 = 0x8;

    /// Loaded on macOS
    pub const LOAD_ON_MACOS: u32 = 0x10;

    /// Low violence variant
    pub const LOW_VIOLENCE: u32 = 0x80;

    /// Do not load
    pub const DO_NOT_LOAD: u32 = 0x100;

    /// UpdatePlugin library only
    pub const UPDATE_PLUGIN: u32 = 0x800;

    /// Encrypted content
    pub const ENCRYPTED: u32 = 0x0800_0000;

    /// Block carries no name hashes
    pub const NO_NAMES: u32 = 0x1000_0000;

    /// Uncommon resolution
    pub const UNCOMMON_RES: u32 = 0x2000_0000;

    /// Bundled file
    pub const BUNDLE: u32 = 0x4000_0000;

    /// No compression applied
    pub const NO_COMPRESSION: u32 = 0x8000_0000;

    /// Create new content flags from raw value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get raw value
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Check if flag is set
    pub const fn has(&self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Check if name hashes are present
    pub const fn has_name_hashes(&self) -> bool {
        !self.has(Self::NO_NAMES)
    }
}

impl fmt::Display for ContentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl From<u32> for ContentFlags {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Locale flags indicate which game locales a block applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleFlags(pub u32);

/// Locale codes and their bits
const LOCALE_CODES: [(&str, u32); 15] = [
    ("enUS", LocaleFlags::EN_US),
    ("koKR", LocaleFlags::KO_KR),
    ("frFR", LocaleFlags::FR_FR),
    ("deDE", LocaleFlags::DE_DE),
    ("zhCN", LocaleFlags::ZH_CN),
    ("esES", LocaleFlags::ES_ES),
    ("zhTW", LocaleFlags::ZH_TW),
    ("enGB", LocaleFlags::EN_GB),
    ("enCN", LocaleFlags::EN_CN),
    ("enTW", LocaleFlags::EN_TW),
    ("esMX", LocaleFlags::ES_MX),
    ("ruRU", LocaleFlags::RU_RU),
    ("ptBR", LocaleFlags::PT_BR),
    ("itIT", LocaleFlags::IT_IT),
    ("ptPT", LocaleFlags::PT_PT),
];

impl LocaleFlags {
    /// All locales
    pub const ALL: u32 = 0xFFFF_FFFF;

    /// Every locale World of Warcraft ships, except enCN and enTW
    pub const ALL_WOW: u32 = 0x0001_F3F6;

    /// English (United States)
    pub const EN_US: u32 = 0x2;

    /// Korean
    pub const KO_KR: u32 = 0x4;

    /// French (France)
    pub const FR_FR: u32 = 0x10;

    /// German (Germany)
    pub const DE_DE: u32 = 0x20;

    /// Chinese (China)
    pub const ZH_CN: u32 = 0x40;

    /// Spanish (Spain)
    pub const ES_ES: u32 = 0x80;

    /// Chinese (Taiwan)
    pub const ZH_TW: u32 = 0x100;

    /// English (Great Britain)
    pub const EN_GB: u32 = 0x200;

    /// English (China)
    pub const EN_CN: u32 = 0x400;

    /// English (Taiwan)
    pub const EN_TW: u32 = 0x800;

    /// Spanish (Mexico)
    pub const ES_MX: u32 = 0x1000;

    /// Russian
    pub const RU_RU: u32 = 0x2000;

    /// Portuguese (Brazil)
    pub const PT_BR: u32 = 0x4000;

    /// Italian (Italy)
    pub const IT_IT: u32 = 0x8000;

    /// Portuguese (Portugal)
    pub const PT_PT: u32 = 0x0001_0000;

    /// Create new locale flags
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get raw value
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Check if any bit of `locale` is set
    pub const fn has(&self, locale: u32) -> bool {
        (self.0 & locale) != 0
    }

    /// Check if every bit of `locale` is set
    pub const fn contains(&self, locale: u32) -> bool {
        (self.0 & locale) == locale
    }

    /// Locale code such as `enUS`, if exactly one known locale is set
    pub fn code(&self) -> Option<&'static str> {
        LOCALE_CODES
            .iter()
            .find(|(_, bit)| *bit == self.0)
            .map(|(code, _)| *code)
    }
}

impl Default for LocaleFlags {
    fn default() -> Self {
        Self(Self::EN_US)
    }
}

impl fmt::Display for LocaleFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => f.write_str(code),
            None => write!(f, "0x{:08x}", self.0),
        }
    }
}

impl FromStr for LocaleFlags {
    type Err = RootError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("0x") {
            return u32::from_str_radix(hex, 16)
                .map(Self)
                .map_err(|_| RootError::UnknownLocale(s.to_string()));
        }
        LOCALE_CODES
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(s))
            .map(|(_, bit)| Self(*bit))
            .ok_or_else(|| RootError::UnknownLocale(s.to_string()))
    }
}

impl TryFrom<String> for LocaleFlags {
    type Error = RootError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LocaleFlags> for String {
    fn from(value: LocaleFlags) -> Self {
        value.to_string()
    }
}

impl From<u32> for LocaleFlags {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}
