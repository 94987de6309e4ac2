//! The table decoder registry.
//!
//! Each supported table tag maps to a decoder function with a uniform signature. Decoders read
//! the table's bytes and request any tables they depend on from the font being decoded, which
//! memoizes them. The result is a [DecodedTable], one variant per tag.

use std::fmt;
use std::rc::Rc;

use crate::binary::read::ReadScope;
use crate::cff::CFF;
use crate::error::ParseError;
use crate::font::FontObject;
use crate::get_name::Names;
use crate::tables::cbdt::{CbdtTable, CblcTable};
use crate::tables::cmap::Cmap;
use crate::tables::colr::ColrTable;
use crate::tables::cpal::CpalTable;
use crate::tables::glyf::GlyfTable;
use crate::tables::gsub::GsubTable;
use crate::tables::kern::KernTable;
use crate::tables::loca::LocaTable;
use crate::tables::os2::Os2;
use crate::tables::post::PostTable;
use crate::tables::sbix::Sbix;
use crate::tables::svg::SvgTable;
use crate::tables::variable_fonts::avar::AvarTable;
use crate::tables::variable_fonts::fvar::FvarTable;
use crate::tables::variable_fonts::gvar::GvarTable;
use crate::tables::variable_fonts::hvar::HvarTable;
use crate::tables::variable_fonts::stat::StatTable;
use crate::tables::{HeadTable, HheaTable, HmtxTable, MaxpTable, NameTable};
use crate::tag::{self, DisplayTag};

/// A decoder for one table tag.
///
/// `scope` spans exactly the table's bytes. `font` supplies the tables this one depends on.
pub type DecodeFn = for<'a> fn(ReadScope<'a>, &FontObject<'a>) -> Decoded<'a>;

type Decoded<'a> = Result<DecodedTable<'a>, ParseError>;

/// A decoded table.
///
/// Values are reference counted so that fonts sharing a table share the decoded value.
#[derive(Clone)]
pub enum DecodedTable<'a> {
    Head(Rc<HeadTable>),
    Hhea(Rc<HheaTable>),
    Maxp(Rc<MaxpTable>),
    Hmtx(Rc<HmtxTable<'a>>),
    Loca(Rc<LocaTable<'a>>),
    Glyf(Rc<GlyfTable<'a>>),
    Cmap(Rc<Cmap<'a>>),
    Name(Rc<Names>),
    Os2(Rc<Os2>),
    Post(Rc<PostTable<'a>>),
    Kern(Rc<KernTable<'a>>),
    Cff(Rc<CFF<'a>>),
    Gsub(Rc<GsubTable>),
    Cblc(Rc<CblcTable<'a>>),
    Cbdt(Rc<CbdtTable<'a>>),
    Svg(Rc<SvgTable<'a>>),
    Colr(Rc<ColrTable<'a>>),
    Cpal(Rc<CpalTable<'a>>),
    Sbix(Rc<Sbix<'a>>),
    Fvar(Rc<FvarTable<'a>>),
    Avar(Rc<AvarTable<'a>>),
    Gvar(Rc<GvarTable<'a>>),
    Stat(Rc<StatTable<'a>>),
    Hvar(Rc<HvarTable<'a>>),
}

/// The decoders for every supported table, keyed by tag.
pub static DECODERS: &[(u32, DecodeFn)] = &[
    (tag::HEAD, decode_head),
    (tag::HHEA, decode_hhea),
    (tag::MAXP, decode_maxp),
    (tag::HMTX, decode_hmtx),
    (tag::LOCA, decode_loca),
    (tag::GLYF, decode_glyf),
    (tag::CMAP, decode_cmap),
    (tag::NAME, decode_name),
    (tag::OS_2, decode_os2),
    (tag::POST, decode_post),
    (tag::KERN, decode_kern),
    (tag::CFF, decode_cff),
    (tag::GSUB, decode_gsub),
    (tag::CBLC, decode_cblc),
    (tag::CBDT, decode_cbdt),
    (tag::SVG, decode_svg),
    (tag::COLR, decode_colr),
    (tag::CPAL, decode_cpal),
    (tag::SBIX, decode_sbix),
    (tag::FVAR, decode_fvar),
    (tag::AVAR, decode_avar),
    (tag::GVAR, decode_gvar),
    (tag::STAT, decode_stat),
    (tag::HVAR, decode_hvar),
];

/// Tables without which a font cannot be used. Their failure fails the whole font.
pub const REQUIRED_TABLES: [u32; 4] = [tag::HEAD, tag::MAXP, tag::HHEA, tag::HMTX];

/// The decoder for `tag`, if the tag is supported.
pub fn decoder(tag: u32) -> Option<DecodeFn> {
    DECODERS
        .iter()
        .find(|(decoder_tag, _)| *decoder_tag == tag)
        .map(|&(_, decode)| decode)
}

impl DecodedTable<'_> {
    /// The tag of the table this value was decoded from.
    pub fn tag(&self) -> u32 {
        match self {
            DecodedTable::Head(_) => tag::HEAD,
            DecodedTable::Hhea(_) => tag::HHEA,
            DecodedTable::Maxp(_) => tag::MAXP,
            DecodedTable::Hmtx(_) => tag::HMTX,
            DecodedTable::Loca(_) => tag::LOCA,
            DecodedTable::Glyf(_) => tag::GLYF,
            DecodedTable::Cmap(_) => tag::CMAP,
            DecodedTable::Name(_) => tag::NAME,
            DecodedTable::Os2(_) => tag::OS_2,
            DecodedTable::Post(_) => tag::POST,
            DecodedTable::Kern(_) => tag::KERN,
            DecodedTable::Cff(_) => tag::CFF,
            DecodedTable::Gsub(_) => tag::GSUB,
            DecodedTable::Cblc(_) => tag::CBLC,
            DecodedTable::Cbdt(_) => tag::CBDT,
            DecodedTable::Svg(_) => tag::SVG,
            DecodedTable::Colr(_) => tag::COLR,
            DecodedTable::Cpal(_) => tag::CPAL,
            DecodedTable::Sbix(_) => tag::SBIX,
            DecodedTable::Fvar(_) => tag::FVAR,
            DecodedTable::Avar(_) => tag::AVAR,
            DecodedTable::Gvar(_) => tag::GVAR,
            DecodedTable::Stat(_) => tag::STAT,
            DecodedTable::Hvar(_) => tag::HVAR,
        }
    }
}

impl fmt::Debug for DecodedTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecodedTable('{}')", DisplayTag(self.tag()))
    }
}

/// The `fvar` axis count that variation tables are checked against.
fn fvar_axis_count(font: &FontObject<'_>) -> Result<u16, ParseError> {
    font.fvar()
        .map(|fvar| fvar.axis_count())
        .ok_or(ParseError::MissingTable(tag::FVAR))
}

fn num_glyphs(font: &FontObject<'_>) -> Result<u16, ParseError> {
    font.maxp()
        .map(|maxp| maxp.num_glyphs)
        .map_err(|err| err.error)
}

fn decode_head<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<HeadTable>().map(|head| DecodedTable::Head(Rc::new(head)))
}

fn decode_hhea<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<HheaTable>().map(|hhea| DecodedTable::Hhea(Rc::new(hhea)))
}

fn decode_maxp<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<MaxpTable>().map(|maxp| DecodedTable::Maxp(Rc::new(maxp)))
}

fn decode_hmtx<'a>(scope: ReadScope<'a>, font: &FontObject<'a>) -> Decoded<'a> {
    let num_glyphs = num_glyphs(font)?;
    let hhea = font.hhea().map_err(|err| err.error)?;
    scope
        .read_dep::<HmtxTable<'_>>((usize::from(num_glyphs), usize::from(hhea.num_h_metrics)))
        .map(|hmtx| DecodedTable::Hmtx(Rc::new(hmtx)))
}

fn decode_loca<'a>(scope: ReadScope<'a>, font: &FontObject<'a>) -> Decoded<'a> {
    let num_glyphs = num_glyphs(font)?;
    let head = font.head().map_err(|err| err.error)?;
    scope
        .read_dep::<LocaTable<'_>>((num_glyphs, head.index_to_loc_format))
        .map(|loca| DecodedTable::Loca(Rc::new(loca)))
}

fn decode_glyf<'a>(scope: ReadScope<'a>, font: &FontObject<'a>) -> Decoded<'a> {
    let loca = font
        .loca()
        .map_err(|err| err.error)?
        .ok_or(ParseError::MissingTable(tag::LOCA))?;
    GlyfTable::new(scope, &loca).map(|glyf| DecodedTable::Glyf(Rc::new(glyf)))
}

fn decode_cmap<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<Cmap<'_>>().map(|cmap| DecodedTable::Cmap(Rc::new(cmap)))
}

fn decode_name<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    let name_table = scope.read::<NameTable<'_>>()?;
    Names::from_table(&name_table).map(|names| DecodedTable::Name(Rc::new(names)))
}

fn decode_os2<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<Os2>().map(|os2| DecodedTable::Os2(Rc::new(os2)))
}

fn decode_post<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<PostTable<'_>>().map(|post| DecodedTable::Post(Rc::new(post)))
}

fn decode_kern<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<KernTable<'_>>().map(|kern| DecodedTable::Kern(Rc::new(kern)))
}

fn decode_cff<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<CFF<'_>>().map(|cff| DecodedTable::Cff(Rc::new(cff)))
}

fn decode_gsub<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<GsubTable>().map(|gsub| DecodedTable::Gsub(Rc::new(gsub)))
}

fn decode_cblc<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<CblcTable<'_>>().map(|cblc| DecodedTable::Cblc(Rc::new(cblc)))
}

fn decode_cbdt<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<CbdtTable<'_>>().map(|cbdt| DecodedTable::Cbdt(Rc::new(cbdt)))
}

fn decode_svg<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<SvgTable<'_>>().map(|svg| DecodedTable::Svg(Rc::new(svg)))
}

fn decode_colr<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<ColrTable<'_>>().map(|colr| DecodedTable::Colr(Rc::new(colr)))
}

fn decode_cpal<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<CpalTable<'_>>().map(|cpal| DecodedTable::Cpal(Rc::new(cpal)))
}

fn decode_sbix<'a>(scope: ReadScope<'a>, font: &FontObject<'a>) -> Decoded<'a> {
    let num_glyphs = num_glyphs(font)?;
    scope
        .read_dep::<Sbix<'_>>(usize::from(num_glyphs))
        .map(|sbix| DecodedTable::Sbix(Rc::new(sbix)))
}

fn decode_fvar<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<FvarTable<'_>>().map(|fvar| DecodedTable::Fvar(Rc::new(fvar)))
}

fn decode_avar<'a>(scope: ReadScope<'a>, font: &FontObject<'a>) -> Decoded<'a> {
    let axis_count = fvar_axis_count(font)?;
    scope
        .read_dep::<AvarTable<'_>>(axis_count)
        .map(|avar| DecodedTable::Avar(Rc::new(avar)))
}

fn decode_gvar<'a>(scope: ReadScope<'a>, font: &FontObject<'a>) -> Decoded<'a> {
    let axis_count = fvar_axis_count(font)?;
    let gvar = scope.read_dep::<GvarTable<'_>>(axis_count)?;
    // One variation data slot per glyph
    if gvar.glyph_count() != num_glyphs(font)? {
        return Err(ParseError::BadValue);
    }
    Ok(DecodedTable::Gvar(Rc::new(gvar)))
}

fn decode_stat<'a>(scope: ReadScope<'a>, _: &FontObject<'a>) -> Decoded<'a> {
    scope.read::<StatTable<'_>>().map(|stat| DecodedTable::Stat(Rc::new(stat)))
}

fn decode_hvar<'a>(scope: ReadScope<'a>, font: &FontObject<'a>) -> Decoded<'a> {
    let axis_count = fvar_axis_count(font)?;
    scope
        .read_dep::<HvarTable<'_>>(axis_count)
        .map(|hvar| DecodedTable::Hvar(Rc::new(hvar)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_tags_are_unique() {
        for (i, (tag, _)) in DECODERS.iter().enumerate() {
            assert!(
                DECODERS[i + 1..].iter().all(|(other, _)| other != tag),
                "duplicate decoder for '{}'",
                DisplayTag(*tag)
            );
        }
        assert_eq!(DECODERS.len(), 24);
    }

    #[test]
    fn lookup_decoders() {
        assert!(decoder(tag::GVAR).is_some());
        assert!(decoder(tag::CFF).is_some());
        assert!(decoder(tag!(b"DSIG")).is_none());
        assert!(decoder(tag::WOFF).is_none());
    }
}
