//! Parsing of the `OS/2` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/os2>
//!
//! The table has grown over time. Each version adds fields to the end of the previous one, so
//! the fields of each version are read in turn, continuing from where the previous version
//! stopped.

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::error::ParseError;
use crate::tag::DisplayTag;

/// `OS/2` table
#[derive(Debug, Clone, PartialEq)]
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: u16,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,
    pub s_family_class: i16,
    pub panose: [u8; 10],
    pub ul_unicode_range1: u32,
    pub ul_unicode_range2: u32,
    pub ul_unicode_range3: u32,
    pub ul_unicode_range4: u32,
    /// Font vendor identifier, a tag
    pub ach_vend_id: u32,
    pub fs_selection: u16,
    pub us_first_char_index: u16,
    pub us_last_char_index: u16,
    /// Apple's version 0 stops at `us_last_char_index`, so these may be absent.
    pub typo_metrics: Option<TypoMetrics>,
    pub version1: Option<Version1>,
    pub version2to4: Option<Version2to4>,
    pub version5: Option<Version5>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypoMetrics {
    pub s_typo_ascender: i16,
    pub s_typo_descender: i16,
    pub s_typo_line_gap: i16,
    pub us_win_ascent: u16,
    pub us_win_descent: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version1 {
    pub ul_code_page_range1: u32,
    pub ul_code_page_range2: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version2to4 {
    pub sx_height: i16,
    pub s_cap_height: i16,
    pub us_default_char: u16,
    pub us_break_char: u16,
    pub us_max_context: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version5 {
    pub us_lower_optical_point_size: u16,
    pub us_upper_optical_point_size: u16,
}

impl ReadBinary for Os2 {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let mut os2 = read_version0(ctxt)?;
        if os2.version >= 1 {
            os2.version1 = Some(read_version1(ctxt)?);
        }
        if os2.version >= 2 {
            os2.version2to4 = Some(read_version2to4(ctxt)?);
        }
        if os2.version >= 5 {
            os2.version5 = Some(read_version5(ctxt)?);
        }
        Ok(os2)
    }
}

fn read_version0(ctxt: &mut ReadCtxt<'_>) -> Result<Os2, ParseError> {
    let version = ctxt.read_u16be()?;
    ctxt.check_version(version <= 5)?;
    let x_avg_char_width = ctxt.read_i16be()?;
    let us_weight_class = ctxt.read_u16be()?;
    let us_width_class = ctxt.read_u16be()?;
    let fs_type = ctxt.read_u16be()?;
    let y_subscript_x_size = ctxt.read_i16be()?;
    let y_subscript_y_size = ctxt.read_i16be()?;
    let y_subscript_x_offset = ctxt.read_i16be()?;
    let y_subscript_y_offset = ctxt.read_i16be()?;
    let y_superscript_x_size = ctxt.read_i16be()?;
    let y_superscript_y_size = ctxt.read_i16be()?;
    let y_superscript_x_offset = ctxt.read_i16be()?;
    let y_superscript_y_offset = ctxt.read_i16be()?;
    let y_strikeout_size = ctxt.read_i16be()?;
    let y_strikeout_position = ctxt.read_i16be()?;
    let s_family_class = ctxt.read_i16be()?;
    let mut panose = [0; 10];
    panose.copy_from_slice(ctxt.read_slice(10)?);
    let ul_unicode_range1 = ctxt.read_u32be()?;
    let ul_unicode_range2 = ctxt.read_u32be()?;
    let ul_unicode_range3 = ctxt.read_u32be()?;
    let ul_unicode_range4 = ctxt.read_u32be()?;
    let ach_vend_id = ctxt.read_u32be()?;
    let fs_selection = ctxt.read_u16be()?;
    let us_first_char_index = ctxt.read_u16be()?;
    let us_last_char_index = ctxt.read_u16be()?;

    let typo_metrics = if version == 0 && !ctxt.bytes_available() {
        None
    } else {
        Some(TypoMetrics {
            s_typo_ascender: ctxt.read_i16be()?,
            s_typo_descender: ctxt.read_i16be()?,
            s_typo_line_gap: ctxt.read_i16be()?,
            us_win_ascent: ctxt.read_u16be()?,
            us_win_descent: ctxt.read_u16be()?,
        })
    };

    Ok(Os2 {
        version,
        x_avg_char_width,
        us_weight_class,
        us_width_class,
        fs_type,
        y_subscript_x_size,
        y_subscript_y_size,
        y_subscript_x_offset,
        y_subscript_y_offset,
        y_superscript_x_size,
        y_superscript_y_size,
        y_superscript_x_offset,
        y_superscript_y_offset,
        y_strikeout_size,
        y_strikeout_position,
        s_family_class,
        panose,
        ul_unicode_range1,
        ul_unicode_range2,
        ul_unicode_range3,
        ul_unicode_range4,
        ach_vend_id,
        fs_selection,
        us_first_char_index,
        us_last_char_index,
        typo_metrics,
        version1: None,
        version2to4: None,
        version5: None,
    })
}

fn read_version1(ctxt: &mut ReadCtxt<'_>) -> Result<Version1, ParseError> {
    Ok(Version1 {
        ul_code_page_range1: ctxt.read_u32be()?,
        ul_code_page_range2: ctxt.read_u32be()?,
    })
}

fn read_version2to4(ctxt: &mut ReadCtxt<'_>) -> Result<Version2to4, ParseError> {
    Ok(Version2to4 {
        sx_height: ctxt.read_i16be()?,
        s_cap_height: ctxt.read_i16be()?,
        us_default_char: ctxt.read_u16be()?,
        us_break_char: ctxt.read_u16be()?,
        us_max_context: ctxt.read_u16be()?,
    })
}

fn read_version5(ctxt: &mut ReadCtxt<'_>) -> Result<Version5, ParseError> {
    Ok(Version5 {
        us_lower_optical_point_size: ctxt.read_u16be()?,
        us_upper_optical_point_size: ctxt.read_u16be()?,
    })
}

impl Os2 {
    /// The vendor ID as a four character string.
    pub fn vendor_id(&self) -> String {
        DisplayTag(self.ach_vend_id).to_string()
    }

    /// `fsSelection` bit 0
    pub fn is_italic(&self) -> bool {
        self.fs_selection & 1 != 0
    }

    /// `fsSelection` bit 5
    pub fn is_bold(&self) -> bool {
        self.fs_selection & (1 << 5) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;

    #[test]
    fn version_dependent_fields() {
        let data = crate::tests::os2_table(4, 700, *b"ABCD");
        let os2 = ReadScope::new(&data).read::<Os2>().unwrap();
        assert_eq!(os2.us_weight_class, 700);
        assert_eq!(os2.vendor_id(), "ABCD");
        assert!(os2.typo_metrics.is_some());
        assert!(os2.version1.is_some());
        assert!(os2.version2to4.is_some());
        assert!(os2.version5.is_none());
    }

    #[test]
    fn short_version0() {
        let data = crate::tests::os2_table(0, 400, *b"XYZ ");
        let os2 = ReadScope::new(&data[..68]).read::<Os2>().unwrap();
        assert_eq!(os2.typo_metrics, None);
        assert_eq!(os2.vendor_id(), "XYZ ");
    }

    #[test]
    fn truncated_version5_fails() {
        let data = crate::tests::os2_table(5, 400, *b"XYZ ");
        assert_eq!(
            ReadScope::new(&data[..data.len() - 2]).read::<Os2>(),
            Err(ParseError::BadEof)
        );
    }
}
