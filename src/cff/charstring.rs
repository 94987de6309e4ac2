//! Type 2 charstring tokenizer.
//!
//! Decodes a glyph's charstring into its drawing operations, expanding local and global
//! subroutine calls. Refer to Adobe Technical Note #5177.

use std::convert::TryFrom;

use crate::binary::read::ReadScope;
use crate::error::ParseError;

use super::{CFFError, Font, Index, Operator, CFF};

// Limits according to the Adobe Technical Note #5177 Appendix B.
pub(crate) const STACK_LIMIT: u8 = 10;
pub(crate) const MAX_ARGUMENTS_STACK_LEN: usize = 48;

pub(crate) const TWO_BYTE_OPERATOR_MARK: u8 = 12;

/// Operators defined in Adobe Technical Note #5177, The Type 2 Charstring Format.
pub mod operator {
    pub const HORIZONTAL_STEM: u16 = 1;
    pub const VERTICAL_STEM: u16 = 3;
    pub const VERTICAL_MOVE_TO: u16 = 4;
    pub const LINE_TO: u16 = 5;
    pub const HORIZONTAL_LINE_TO: u16 = 6;
    pub const VERTICAL_LINE_TO: u16 = 7;
    pub const CURVE_TO: u16 = 8;
    pub const CALL_LOCAL_SUBROUTINE: u16 = 10;
    pub const RETURN: u16 = 11;
    pub const ENDCHAR: u16 = 14;
    pub const HORIZONTAL_STEM_HINT_MASK: u16 = 18;
    pub const HINT_MASK: u16 = 19;
    pub const COUNTER_MASK: u16 = 20;
    pub const MOVE_TO: u16 = 21;
    pub const HORIZONTAL_MOVE_TO: u16 = 22;
    pub const VERTICAL_STEM_HINT_MASK: u16 = 23;
    pub const CURVE_LINE: u16 = 24;
    pub const LINE_CURVE: u16 = 25;
    pub const VV_CURVE_TO: u16 = 26;
    pub const HH_CURVE_TO: u16 = 27;
    pub const SHORT_INT: u16 = 28;
    pub const CALL_GLOBAL_SUBROUTINE: u16 = 29;
    pub const VH_CURVE_TO: u16 = 30;
    pub const HV_CURVE_TO: u16 = 31;
    pub const HFLEX: u16 = 12 << 8 | 34;
    pub const FLEX: u16 = 12 << 8 | 35;
    pub const HFLEX1: u16 = 12 << 8 | 36;
    pub const FLEX1: u16 = 12 << 8 | 37;
    pub const FIXED_16_16: u16 = 255;
}

/// A drawing or hinting operator with the operands it consumed.
///
/// Two byte operators are stored as `12 << 8 | b1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: u16,
    pub operands: Vec<f32>,
}

/// A decoded charstring.
#[derive(Debug, Clone, PartialEq)]
pub struct CharString {
    /// Advance width, from the optional leading width operand or the Private DICT default.
    pub width: f32,
    /// Operations in drawing order, with subroutine calls expanded.
    pub operations: Vec<Operation>,
    /// Number of stem hints declared.
    pub num_stems: usize,
}

/// The subroutine index bias for an INDEX of `count` subroutines.
pub fn subr_bias(count: usize) -> i32 {
    if count < 1240 {
        107
    } else if count < 33900 {
        1131
    } else {
        32768
    }
}

/// Convert a biased subroutine number from a charstring into an index into `subrs`.
pub(crate) fn subr_index(operand: f32, subrs: &Index<'_>) -> Result<usize, CFFError> {
    let operand = float_to_i32(operand).ok_or(CFFError::InvalidSubroutineIndex)?;
    operand
        .checked_add(subr_bias(subrs.count))
        .and_then(|index| usize::try_from(index).ok())
        .filter(|index| *index < subrs.count)
        .ok_or(CFFError::InvalidSubroutineIndex)
}

fn float_to_i32(value: f32) -> Option<i32> {
    // Truncates toward zero, so accept the open interval (MIN-1, MAX+1)
    const MIN: f32 = i32::MIN as f32;
    const MAX_P1: f32 = i32::MAX as f32;
    (value >= MIN && value < MAX_P1).then(|| value as i32)
}

impl<'a> CFF<'a> {
    /// Decode the charstring of `glyph_id` in the font at `font_index`.
    pub fn char_string(&self, font_index: usize, glyph_id: u16) -> Result<CharString, CFFError> {
        let font = self.fonts.get(font_index).ok_or(ParseError::BadIndex)?;
        decode_char_string(font, &self.global_subr_index, glyph_id)
    }
}

/// Decode the charstring of `glyph_id` in `font`.
pub fn decode_char_string<'a>(
    font: &Font<'a>,
    global_subrs: &Index<'a>,
    glyph_id: u16,
) -> Result<CharString, CFFError> {
    let char_string = font.char_string(glyph_id).ok_or(ParseError::BadIndex)?;
    let (default_width, nominal_width) = match font.private_dict(glyph_id) {
        Some(private_dict) => (
            private_dict
                .get_f64(Operator::DefaultWidthX)
                .transpose()?
                .unwrap_or(0.0),
            private_dict
                .get_f64(Operator::NominalWidthX)
                .transpose()?
                .unwrap_or(0.0),
        ),
        None => (0.0, 0.0),
    };

    let mut decoder = Decoder {
        global_subrs,
        local_subrs: font.local_subr_index(glyph_id),
        stack: Vec::with_capacity(MAX_ARGUMENTS_STACK_LEN),
        width: None,
        nominal_width: nominal_width as f32,
        num_stems: 0,
        operations: Vec::new(),
        has_endchar: false,
    };
    decoder.run(char_string, 0)?;
    if !decoder.has_endchar {
        return Err(CFFError::MissingEndChar);
    }

    Ok(CharString {
        width: decoder.width.unwrap_or(default_width as f32),
        operations: decoder.operations,
        num_stems: decoder.num_stems,
    })
}

struct Decoder<'f, 'a> {
    global_subrs: &'f Index<'a>,
    local_subrs: Option<&'f Index<'a>>,
    stack: Vec<f32>,
    width: Option<f32>,
    nominal_width: f32,
    num_stems: usize,
    operations: Vec<Operation>,
    has_endchar: bool,
}

impl Decoder<'_, '_> {
    fn run(&mut self, char_string: &[u8], depth: u8) -> Result<(), CFFError> {
        let mut s = ReadScope::new(char_string).ctxt();
        while s.bytes_available() {
            let b0 = s.read_u8()?;
            let op = u16::from(b0);
            match op {
                0 | 2 | 9 | 13 | 15 | 16 | 17 => {
                    // Reserved, or CFF2 only
                    return Err(CFFError::InvalidOperator);
                }
                operator::HORIZONTAL_STEM
                | operator::VERTICAL_STEM
                | operator::HORIZONTAL_STEM_HINT_MASK
                | operator::VERTICAL_STEM_HINT_MASK => {
                    self.take_width(self.stack.len() % 2 == 1);
                    self.num_stems += self.stack.len() / 2;
                    self.emit(op);
                }
                operator::HINT_MASK | operator::COUNTER_MASK => {
                    // Operands here are an implied vstem
                    self.take_width(self.stack.len() % 2 == 1);
                    self.num_stems += self.stack.len() / 2;
                    self.emit(op);
                    s.read_slice((self.num_stems + 7) / 8)?;
                }
                operator::MOVE_TO => {
                    self.take_width(self.stack.len() == 3);
                    self.emit(op);
                }
                operator::HORIZONTAL_MOVE_TO | operator::VERTICAL_MOVE_TO => {
                    self.take_width(self.stack.len() == 2);
                    self.emit(op);
                }
                operator::LINE_TO
                | operator::HORIZONTAL_LINE_TO
                | operator::VERTICAL_LINE_TO
                | operator::CURVE_TO
                | operator::CURVE_LINE
                | operator::LINE_CURVE
                | operator::VV_CURVE_TO
                | operator::HH_CURVE_TO
                | operator::VH_CURVE_TO
                | operator::HV_CURVE_TO => self.emit(op),
                operator::CALL_LOCAL_SUBROUTINE | operator::CALL_GLOBAL_SUBROUTINE => {
                    if depth == STACK_LIMIT {
                        return Err(CFFError::NestingLimitReached);
                    }
                    let operand = self.stack.pop().ok_or(CFFError::InvalidArgumentsStackLength)?;
                    let subrs = if op == operator::CALL_LOCAL_SUBROUTINE {
                        self.local_subrs.ok_or(CFFError::NoLocalSubroutines)?
                    } else {
                        self.global_subrs
                    };
                    let index = subr_index(operand, subrs)?;
                    let subr = subrs
                        .read_object(index)
                        .ok_or(CFFError::InvalidSubroutineIndex)?;
                    self.run(subr, depth + 1)?;
                    if self.has_endchar {
                        break;
                    }
                }
                operator::RETURN => break,
                operator::ENDCHAR => {
                    // endchar may carry a width and the deprecated seac operands
                    self.take_width(self.stack.len() == 1 || self.stack.len() == 5);
                    self.emit(op);
                    self.has_endchar = true;
                    break;
                }
                operator::SHORT_INT => {
                    let n = s.read_i16be()?;
                    self.push(f32::from(n))?;
                }
                operator::FIXED_16_16 => {
                    let n = s.read_i32be()?;
                    self.push(n as f32 / 65536.0)?;
                }
                32..=246 => self.push(f32::from(i16::from(b0) - 139))?,
                247..=250 => {
                    let b1 = s.read_u8()?;
                    let n = (i16::from(b0) - 247) * 256 + i16::from(b1) + 108;
                    self.push(f32::from(n))?;
                }
                251..=254 => {
                    let b1 = s.read_u8()?;
                    let n = -(i16::from(b0) - 251) * 256 - i16::from(b1) - 108;
                    self.push(f32::from(n))?;
                }
                _ if b0 == TWO_BYTE_OPERATOR_MARK => {
                    let op = u16::from(TWO_BYTE_OPERATOR_MARK) << 8 | u16::from(s.read_u8()?);
                    match op {
                        operator::HFLEX | operator::FLEX | operator::HFLEX1 | operator::FLEX1 => {
                            self.emit(op)
                        }
                        // Arithmetic and storage operators
                        _ => return Err(CFFError::UnsupportedOperator),
                    }
                }
                _ => return Err(CFFError::InvalidOperator),
            }
        }

        Ok(())
    }

    fn push(&mut self, value: f32) -> Result<(), CFFError> {
        if self.stack.len() == MAX_ARGUMENTS_STACK_LEN {
            return Err(CFFError::ArgumentsStackLimitReached);
        }
        self.stack.push(value);
        Ok(())
    }

    /// The first stack-clearing operator may be preceded by the advance width.
    fn take_width(&mut self, has_extra_operand: bool) {
        if has_extra_operand && self.width.is_none() && self.operations.is_empty() {
            let width = self.stack.remove(0);
            self.width = Some(self.nominal_width + width);
        }
    }

    fn emit(&mut self, operator: u16) {
        self.operations.push(Operation {
            operator,
            operands: std::mem::take(&mut self.stack),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::cff::tests::{index, sample_cff};

    #[test]
    fn bias() {
        assert_eq!(subr_bias(0), 107);
        assert_eq!(subr_bias(1239), 107);
        assert_eq!(subr_bias(1240), 1131);
        assert_eq!(subr_bias(33899), 1131);
        assert_eq!(subr_bias(33900), 32768);
    }

    #[test]
    fn biased_subr_index() {
        let data = index(&[&[11][..]; 1300]);
        let subrs = ReadScope::new(&data).read::<Index<'_>>().unwrap();
        assert_eq!(subr_index(-1131.0, &subrs), Ok(0));
        assert_eq!(subr_index(168.0, &subrs), Ok(1299));
        assert_eq!(
            subr_index(169.0, &subrs),
            Err(CFFError::InvalidSubroutineIndex)
        );
        assert_eq!(
            subr_index(-1132.0, &subrs),
            Err(CFFError::InvalidSubroutineIndex)
        );
    }

    #[test]
    fn width_and_global_subroutine() {
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        let glyph = cff.char_string(0, 1).unwrap();
        assert_eq!(glyph.width, 150.0);
        assert_eq!(
            glyph.operations,
            vec![
                Operation {
                    operator: operator::MOVE_TO,
                    operands: vec![0.0, 0.0]
                },
                Operation {
                    operator: operator::LINE_TO,
                    operands: vec![10.0, 20.0]
                },
                Operation {
                    operator: operator::ENDCHAR,
                    operands: vec![]
                },
            ]
        );
    }

    #[test]
    fn default_width_and_hint_mask() {
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        let notdef = cff.char_string(0, 0).unwrap();
        assert_eq!(notdef.width, 0.0);
        assert_eq!(notdef.operations.len(), 1);

        let glyph = cff.char_string(0, 2).unwrap();
        assert_eq!(glyph.num_stems, 1);
        let operators = glyph
            .operations
            .iter()
            .map(|operation| operation.operator)
            .collect::<Vec<_>>();
        assert_eq!(
            operators,
            vec![
                operator::HORIZONTAL_STEM,
                operator::HINT_MASK,
                operator::ENDCHAR
            ]
        );
    }

    #[test]
    fn local_subroutine_without_index() {
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        let font = &cff.fonts[0];
        // 0 callsubr endchar, with no Subrs in the Private DICT
        let char_strings = index(&[&[139, 10, 14][..]]);
        let mut font = font.clone();
        font.char_strings_index = ReadScope::new(&char_strings).read::<Index<'_>>().unwrap();
        assert_eq!(
            decode_char_string(&font, &cff.global_subr_index, 0),
            Err(CFFError::NoLocalSubroutines)
        );
    }

    #[test]
    fn recursion_limit() {
        // A global subroutine that calls itself
        let subrs_data = index(&[&[32, 29][..]]);
        let subrs = ReadScope::new(&subrs_data).read::<Index<'_>>().unwrap();
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        let mut font = cff.fonts[0].clone();
        let char_strings = index(&[&[32, 29, 14][..]]);
        font.char_strings_index = ReadScope::new(&char_strings).read::<Index<'_>>().unwrap();
        assert_eq!(
            decode_char_string(&font, &subrs, 0),
            Err(CFFError::NestingLimitReached)
        );
    }

    #[test]
    fn missing_endchar() {
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        let mut font = cff.fonts[0].clone();
        let char_strings = index(&[&[139, 139, 21][..]]);
        font.char_strings_index = ReadScope::new(&char_strings).read::<Index<'_>>().unwrap();
        assert_eq!(
            decode_char_string(&font, &cff.global_subr_index, 0),
            Err(CFFError::MissingEndChar)
        );
    }
}
