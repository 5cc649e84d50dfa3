//! Install manifest tags

use crate::util;

/// Known tag types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TagType {
    /// Platform tag (Windows, OSX)
    Platform = 0x0001,
    /// Architecture tag (x86_32, x86_64, arm64)
    Architecture = 0x0002,
    /// Locale tag (enUS, deDE)
    Locale = 0x0003,
    /// Region tag (US, EU, KR)
    Region = 0x0004,
    /// Category tag (speech, text)
    Category = 0x0005,
    /// Alternate content tag
    Alternate = 0x4000,
}

impl TagType {
    /// Convert from raw u16 value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Platform),
            0x0002 => Some(Self::Architecture),
            0x0003 => Some(Self::Locale),
            0x0004 => Some(Self::Region),
            0x0005 => Some(Self::Category),
            0x4000 => Some(Self::Alternate),
            _ => None,
        }
    }
}

/// Install tag with its entry bit mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTag {
    /// Tag name, such as `Windows` or `enUS`
    pub name: String,
    /// Raw tag type
    pub tag_type: u16,
    /// One bit per entry, most significant bit first
    pub bit_mask: Vec<u8>,
}

impl InstallTag {
    /// Read a tag at `offset`; returns the tag and the offset after it
    pub(crate) fn read(data: &[u8], offset: usize, mask_len: usize) -> Option<(Self, usize)> {
        let (name, pos) = util::read_cstr(data, offset)?;
        let tag_type = util::read_u16_be(data, pos)?;
        let bit_mask = util::slice(data, pos + 2, mask_len)?.to_vec();
        let tag = Self {
            name,
            tag_type,
            bit_mask,
        };
        Some((tag, pos + 2 + mask_len))
    }

    /// Known type, if any
    pub fn kind(&self) -> Option<TagType> {
        TagType::from_u16(self.tag_type)
    }

    /// Check if the entry at `index` carries this tag
    pub fn has_entry(&self, index: usize) -> bool {
        self.bit_mask
            .get(index / 8)
            .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
    }

    /// Number of entries carrying this tag
    pub fn entry_count(&self) -> usize {
        self.bit_mask
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    /// `type=name` label
    pub fn label(&self) -> String {
        format!("{}={}", self.tag_type, self.name)
    }
}
