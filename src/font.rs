//! Font files and the fonts they contain.
//!
//! A [FontFile] owns or borrows the bytes of one font file. [FontFile::fonts] resolves the table
//! directories and returns one [FontObject] per collection member, each followed by one
//! `FontObject` per named instance when the font is variable. Every font of a file shares a
//! decode cache, so a table shared by several collection members is decoded once.

use std::cell::RefCell;
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::binary::read::{ReadBuf, ReadScope};
use crate::cff::CFF;
use crate::error::{FontError, ParseError, TableError};
use crate::font_data::{self, Container, Directory};
use crate::font_tables::{decoder, DecodedTable, REQUIRED_TABLES};
use crate::get_name::Names;
use crate::instance::{self, Instance};
use crate::tables::cbdt::{CbdtTable, CblcTable};
use crate::tables::cmap::Cmap;
use crate::tables::colr::ColrTable;
use crate::tables::cpal::CpalTable;
use crate::tables::glyf::{GlyfTable, Glyph};
use crate::tables::gsub::GsubTable;
use crate::tables::kern::KernTable;
use crate::tables::loca::LocaTable;
use crate::tables::os2::Os2;
use crate::tables::post::PostTable;
use crate::tables::sbix::Sbix;
use crate::tables::svg::SvgTable;
use crate::tables::variable_fonts::avar::AvarTable;
use crate::tables::variable_fonts::fvar::FvarTable;
use crate::tables::variable_fonts::gvar::{GlyphVariation, GvarTable};
use crate::tables::variable_fonts::hvar::HvarTable;
use crate::tables::variable_fonts::stat::StatTable;
use crate::tables::variable_fonts::IndirectionPolicy;
use crate::tables::{HeadTable, HheaTable, HmtxTable, MaxpTable};
use crate::tag::{self, DisplayTag};
use crate::woff::WoffFont;

/// Number of phantom points appended to every glyph by `gvar`.
const PHANTOM_POINTS: usize = 4;

/// Options that control decoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Handling of out-of-range indices in `HVAR` and `gvar` data.
    pub indirection: IndirectionPolicy,
    /// Produce a font for each named instance of a variable font.
    pub synthesize_instances: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            indirection: IndirectionPolicy::default(),
            synthesize_instances: true,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutlineFormat {
    Glyf,
    Cff,
    Svg,
    None,
}

bitflags! {
    /// The glyph data tables present in a font.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct GlyphTableFlags: u8 {
        const GLYF = 1 << 0;
        const CFF  = 1 << 1;
        const SVG  = 1 << 2;
        const SBIX = 1 << 3;
        const CBDT = 1 << 4;
        const COLR = 1 << 5;
    }
}

const TABLE_TAG_FLAGS: &[(u32, GlyphTableFlags)] = &[
    (tag::GLYF, GlyphTableFlags::GLYF),
    (tag::CFF, GlyphTableFlags::CFF),
    (tag::SVG, GlyphTableFlags::SVG),
    (tag::SBIX, GlyphTableFlags::SBIX),
    (tag::CBDT, GlyphTableFlags::CBDT),
    (tag::COLR, GlyphTableFlags::COLR),
];

/// The bytes of a font file and the container they were delivered in.
///
/// WOFF files are unpacked on construction, so `data` always holds an `sfnt` or collection.
pub struct FontFile<'a> {
    data: ReadBuf<'a>,
    container: Container,
    options: DecodeOptions,
}

/// Decoded tables shared by all fonts of one file.
#[derive(Default)]
struct DecodeCache<'a> {
    tables: RefCell<FxHashMap<CacheKey, Result<DecodedTable<'a>, ParseError>>>,
    decode_counts: RefCell<FxHashMap<CacheKey, usize>>,
}

/// Identifies one table in one buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    buffer: usize,
    offset: usize,
    tag: u32,
}

/// One font: a collection member, the only font of an `sfnt`, or a named instance of either.
#[derive(Clone)]
pub struct FontObject<'a> {
    scope: ReadScope<'a>,
    directory: Directory<'a>,
    cache: Rc<DecodeCache<'a>>,
    options: DecodeOptions,
    glyph_table_flags: GlyphTableFlags,
    instance: Option<Rc<Instance>>,
}

macro_rules! decoded {
    ($variant:ident) => {
        |table| match table {
            DecodedTable::$variant(value) => Some(value),
            _ => None,
        }
    };
}

impl<'a> FontFile<'a> {
    /// Identify and prepare the font file in `data` with the default options.
    pub fn parse(data: &'a [u8]) -> Result<FontFile<'a>, FontError> {
        FontFile::parse_with_options(data, DecodeOptions::default())
    }

    pub fn parse_with_options(
        data: &'a [u8],
        options: DecodeOptions,
    ) -> Result<FontFile<'a>, FontError> {
        let container = Container::detect(data)?;
        let data = match unpack_woff(data, container)? {
            Some(sfnt) => ReadBuf::from(sfnt),
            None => ReadBuf::from(data),
        };
        FontFile::new(data, container, options)
    }

    /// Take ownership of `data`, which holds a font file.
    pub fn from_vec(data: Vec<u8>) -> Result<FontFile<'static>, FontError> {
        let container = Container::detect(&data)?;
        let data = match unpack_woff(&data, container)? {
            Some(sfnt) => sfnt,
            None => data,
        };
        FontFile::new(ReadBuf::from(data), container, DecodeOptions::default())
    }

    fn new(
        data: ReadBuf<'a>,
        container: Container,
        options: DecodeOptions,
    ) -> Result<FontFile<'a>, FontError> {
        // Fail on a corrupt directory before any font is requested
        font_data::directories(ReadScope::new(data.data()))?;
        Ok(FontFile {
            data,
            container,
            options,
        })
    }

    /// The container the file was delivered in.
    pub fn container(&self) -> Container {
        self.container
    }

    /// The `sfnt` or collection bytes. For WOFF files this is the unpacked `sfnt`.
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Decode the fonts in the file.
    ///
    /// Each font is followed by its named instances when instance synthesis is enabled. A font
    /// whose required tables fail to decode fails the whole call.
    pub fn fonts(&self) -> Result<Vec<FontObject<'_>>, FontError> {
        let scope = self.data.scope();
        let cache = Rc::new(DecodeCache::default());
        let mut fonts = Vec::new();
        for directory in font_data::directories(scope)? {
            let font = FontObject::new(scope, directory, Rc::clone(&cache), self.options);
            font.validate()?;
            let instances = if self.options.synthesize_instances {
                instance::named_instances(&font).unwrap_or_else(|err| {
                    warn!(
                        "font {}: unable to synthesize named instances: {}",
                        font.index(),
                        err
                    );
                    Vec::new()
                })
            } else {
                Vec::new()
            };
            fonts.push(font);
            fonts.extend(instances);
        }
        debug!("decoded {} fonts from {:?} file", fonts.len(), self.container);
        Ok(fonts)
    }
}

fn unpack_woff(data: &[u8], container: Container) -> Result<Option<Vec<u8>>, FontError> {
    match container {
        Container::Woff { .. } => {
            let woff = ReadScope::new(data)
                .read::<WoffFont<'_>>()
                .map_err(|err| FontError::Directory {
                    offset: 0,
                    expected: "WOFF header and table directory",
                    actual: err.to_string(),
                })?;
            woff.to_sfnt().map(Some)
        }
        Container::Sfnt(_) | Container::Collection => Ok(None),
    }
}

impl<'a> DecodeCache<'a> {
    fn get(&self, key: &CacheKey) -> Option<Result<DecodedTable<'a>, ParseError>> {
        self.tables.borrow().get(key).cloned()
    }

    fn insert(&self, key: CacheKey, result: Result<DecodedTable<'a>, ParseError>) {
        self.tables.borrow_mut().insert(key, result);
        *self.decode_counts.borrow_mut().entry(key).or_insert(0) += 1;
    }

    fn decode_count(&self, key: &CacheKey) -> usize {
        self.decode_counts.borrow().get(key).copied().unwrap_or(0)
    }
}

impl<'a> FontObject<'a> {
    fn new(
        scope: ReadScope<'a>,
        directory: Directory<'a>,
        cache: Rc<DecodeCache<'a>>,
        options: DecodeOptions,
    ) -> FontObject<'a> {
        let mut glyph_table_flags = GlyphTableFlags::empty();
        for &(table, flag) in TABLE_TAG_FLAGS {
            if directory.offset_table.find_table_record(table).is_some() {
                glyph_table_flags |= flag
            }
        }
        FontObject {
            scope,
            directory,
            cache,
            options,
            glyph_table_flags,
            instance: None,
        }
    }

    /// A view of this font as the named instance `instance`.
    pub(crate) fn with_instance(&self, instance: Instance) -> FontObject<'a> {
        FontObject {
            instance: Some(Rc::new(instance)),
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<(), TableError> {
        for &tag in REQUIRED_TABLES.iter() {
            if self.table(tag)?.is_none() {
                return Err(TableError {
                    tag,
                    offset: self.directory.offset,
                    error: ParseError::MissingTable(tag),
                });
            }
        }
        if self.glyph_table_flags.contains(GlyphTableFlags::GLYF) {
            self.glyf()?;
        }
        if self.glyph_table_flags.contains(GlyphTableFlags::CFF) {
            self.cff()?;
        }
        Ok(())
    }

    /// Index of the font within a collection, zero otherwise.
    pub fn index(&self) -> usize {
        self.directory.index
    }

    /// Offset of the font's table directory within the file.
    pub fn offset(&self) -> usize {
        self.directory.offset
    }

    pub fn sfnt_version(&self) -> u32 {
        self.directory.offset_table.sfnt_version
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn glyph_table_flags(&self) -> GlyphTableFlags {
        self.glyph_table_flags
    }

    pub fn outline_format(&self) -> OutlineFormat {
        if self.glyph_table_flags.contains(GlyphTableFlags::GLYF) {
            OutlineFormat::Glyf
        } else if self.glyph_table_flags.contains(GlyphTableFlags::CFF) {
            OutlineFormat::Cff
        } else if self.glyph_table_flags.contains(GlyphTableFlags::SVG) {
            OutlineFormat::Svg
        } else {
            OutlineFormat::None
        }
    }

    pub fn has_table(&self, tag: u32) -> bool {
        font_data::find_table(&self.directory, tag).is_some()
    }

    /// The tags of the tables in the font's directory.
    pub fn table_tags(&self) -> impl Iterator<Item = u32> + 'a {
        self.directory
            .offset_table
            .table_records
            .iter()
            .map(|record| record.table_tag)
    }

    /// The bytes of the table `tag`, if present.
    pub fn table_scope(&self, tag: u32) -> Result<Option<ReadScope<'a>>, ParseError> {
        match font_data::find_table(&self.directory, tag) {
            Some((offset, length)) => self.scope.offset_length(offset, length).map(Some),
            None => Ok(None),
        }
    }

    /// The named instance this font represents, if any.
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_deref()
    }

    /// Decode the table `tag`, or return the cached result of an earlier decode.
    ///
    /// Tables this table depends on are decoded first. `None` if the table is absent.
    pub fn table(&self, tag: u32) -> Result<Option<DecodedTable<'a>>, TableError> {
        let (offset, length) = match font_data::find_table(&self.directory, tag) {
            Some(location) => location,
            None => return Ok(None),
        };
        let table_error = |error| TableError { tag, offset, error };
        let decode = decoder(tag).ok_or_else(|| table_error(ParseError::UnsupportedFormat(tag)))?;

        let key = self.cache_key(offset, tag);
        if let Some(result) = self.cache.get(&key) {
            return result.map(Some).map_err(table_error);
        }

        debug!("decoding '{}' table at offset {}", DisplayTag(tag), offset);
        // The cache is not borrowed here, decoders re-enter it for their dependencies
        let result = self
            .scope
            .offset_length(offset, length)
            .and_then(|scope| decode(scope, self));
        if let Err(err) = &result {
            warn!(
                "font {}: unable to decode '{}' table at offset {}: {}",
                self.index(),
                DisplayTag(tag),
                offset,
                err
            );
        }
        self.cache.insert(key, result.clone());
        result.map(Some).map_err(table_error)
    }

    /// The number of times the table `tag` of this font has been decoded.
    ///
    /// Fonts of one file share decoded tables, so this is at most one.
    pub fn decode_count(&self, tag: u32) -> usize {
        font_data::find_table(&self.directory, tag)
            .map(|(offset, _)| self.cache.decode_count(&self.cache_key(offset, tag)))
            .unwrap_or(0)
    }

    fn cache_key(&self, offset: usize, tag: u32) -> CacheKey {
        CacheKey {
            buffer: self.scope.data().as_ptr() as usize,
            offset,
            tag,
        }
    }

    fn typed<T>(
        &self,
        tag: u32,
        extract: impl FnOnce(DecodedTable<'a>) -> Option<Rc<T>>,
    ) -> Result<Option<Rc<T>>, TableError> {
        Ok(self.table(tag)?.and_then(extract))
    }

    fn required<T>(
        &self,
        tag: u32,
        extract: impl FnOnce(DecodedTable<'a>) -> Option<Rc<T>>,
    ) -> Result<Rc<T>, TableError> {
        self.typed(tag, extract)?.ok_or(TableError {
            tag,
            offset: self.directory.offset,
            error: ParseError::MissingTable(tag),
        })
    }

    // Failures are logged when the table is decoded
    fn optional<T>(
        &self,
        tag: u32,
        extract: impl FnOnce(DecodedTable<'a>) -> Option<Rc<T>>,
    ) -> Option<Rc<T>> {
        self.typed(tag, extract).ok().flatten()
    }

    fn table_error(&self, tag: u32, error: ParseError) -> TableError {
        let offset = font_data::find_table(&self.directory, tag)
            .map(|(offset, _)| offset)
            .unwrap_or(self.directory.offset);
        TableError { tag, offset, error }
    }

    pub fn head(&self) -> Result<Rc<HeadTable>, TableError> {
        self.required(tag::HEAD, decoded!(Head))
    }

    pub fn hhea(&self) -> Result<Rc<HheaTable>, TableError> {
        self.required(tag::HHEA, decoded!(Hhea))
    }

    pub fn maxp(&self) -> Result<Rc<MaxpTable>, TableError> {
        self.required(tag::MAXP, decoded!(Maxp))
    }

    pub fn hmtx(&self) -> Result<Rc<HmtxTable<'a>>, TableError> {
        self.required(tag::HMTX, decoded!(Hmtx))
    }

    pub fn loca(&self) -> Result<Option<Rc<LocaTable<'a>>>, TableError> {
        self.typed(tag::LOCA, decoded!(Loca))
    }

    pub fn glyf(&self) -> Result<Option<Rc<GlyfTable<'a>>>, TableError> {
        self.typed(tag::GLYF, decoded!(Glyf))
    }

    pub fn cff(&self) -> Result<Option<Rc<CFF<'a>>>, TableError> {
        self.typed(tag::CFF, decoded!(Cff))
    }

    pub fn cmap(&self) -> Option<Rc<Cmap<'a>>> {
        self.optional(tag::CMAP, decoded!(Cmap))
    }

    /// The font's names. A named instance has its own subfamily and PostScript names.
    pub fn names(&self) -> Option<Rc<Names>> {
        match &self.instance {
            Some(instance) => Some(Rc::clone(&instance.names)),
            None => self.optional(tag::NAME, decoded!(Name)),
        }
    }

    pub fn os2(&self) -> Option<Rc<Os2>> {
        self.optional(tag::OS_2, decoded!(Os2))
    }

    pub fn post(&self) -> Option<Rc<PostTable<'a>>> {
        self.optional(tag::POST, decoded!(Post))
    }

    pub fn kern(&self) -> Option<Rc<KernTable<'a>>> {
        self.optional(tag::KERN, decoded!(Kern))
    }

    pub fn gsub(&self) -> Option<Rc<GsubTable>> {
        self.optional(tag::GSUB, decoded!(Gsub))
    }

    pub fn cblc(&self) -> Option<Rc<CblcTable<'a>>> {
        self.optional(tag::CBLC, decoded!(Cblc))
    }

    pub fn cbdt(&self) -> Option<Rc<CbdtTable<'a>>> {
        self.optional(tag::CBDT, decoded!(Cbdt))
    }

    pub fn svg(&self) -> Option<Rc<SvgTable<'a>>> {
        self.optional(tag::SVG, decoded!(Svg))
    }

    pub fn colr(&self) -> Option<Rc<ColrTable<'a>>> {
        self.optional(tag::COLR, decoded!(Colr))
    }

    pub fn cpal(&self) -> Option<Rc<CpalTable<'a>>> {
        self.optional(tag::CPAL, decoded!(Cpal))
    }

    pub fn sbix(&self) -> Option<Rc<Sbix<'a>>> {
        self.optional(tag::SBIX, decoded!(Sbix))
    }

    pub fn fvar(&self) -> Option<Rc<FvarTable<'a>>> {
        self.optional(tag::FVAR, decoded!(Fvar))
    }

    pub fn avar(&self) -> Option<Rc<AvarTable<'a>>> {
        self.optional(tag::AVAR, decoded!(Avar))
    }

    pub fn gvar(&self) -> Option<Rc<GvarTable<'a>>> {
        self.optional(tag::GVAR, decoded!(Gvar))
    }

    pub fn stat(&self) -> Option<Rc<StatTable<'a>>> {
        self.optional(tag::STAT, decoded!(Stat))
    }

    pub fn hvar(&self) -> Option<Rc<HvarTable<'a>>> {
        self.optional(tag::HVAR, decoded!(Hvar))
    }

    /// Whether the font has an `fvar` table.
    pub fn is_variable(&self) -> bool {
        self.has_table(tag::FVAR)
    }

    /// The outline of glyph `glyph_id`. `None` for glyphs without an outline and fonts without
    /// a `glyf` table.
    pub fn glyph(&self, glyph_id: u16) -> Result<Option<Glyph<'a>>, TableError> {
        match self.glyf()? {
            Some(glyf) => glyf
                .glyph(glyph_id)
                .map_err(|error| self.table_error(tag::GLYF, error)),
            None => Ok(None),
        }
    }

    /// The advance width of `glyph_id` in font units.
    ///
    /// For a named instance the `HVAR` delta at the instance's position is applied.
    pub fn horizontal_advance(&self, glyph_id: u16) -> Result<f32, TableError> {
        let advance = self
            .hmtx()?
            .horizontal_advance(glyph_id)
            .map_err(|error| self.table_error(tag::HMTX, error))?;
        let delta = match (&self.instance, self.hvar()) {
            (Some(instance), Some(hvar)) => hvar
                .advance_delta(&instance.normalized, glyph_id, self.options.indirection)
                .map_err(|error| self.table_error(tag::HVAR, error))?,
            _ => 0.0,
        };
        Ok(f32::from(advance) + delta)
    }

    /// The `gvar` variations of `glyph_id`. Empty for fonts without `gvar`.
    pub fn glyph_variations(&self, glyph_id: u16) -> Result<Vec<GlyphVariation>, TableError> {
        let gvar = match self.gvar() {
            Some(gvar) => gvar,
            None => return Ok(Vec::new()),
        };
        let points = self
            .glyph(glyph_id)?
            .map(|glyph| glyph.number_of_points())
            .unwrap_or(0);
        let num_points = u32::try_from(points + PHANTOM_POINTS)
            .map_err(|_| self.table_error(tag::GVAR, ParseError::LimitExceeded))?;
        gvar.glyph_variations(glyph_id, num_points, self.options.indirection)
            .map_err(|error| self.table_error(tag::GVAR, error))
    }
}

impl fmt::Debug for FontObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontObject")
            .field("index", &self.directory.index)
            .field("offset", &self.directory.offset)
            .field("sfnt_version", &DisplayTag(self.sfnt_version()))
            .field("instance", &self.instance.as_ref().map(|instance| instance.index))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{
        cff_tables, collection, sfnt, truetype_tables, variable_tables, woff_from_tables,
        woff_tables, CFF_VERSION, TRUETYPE_VERSION,
    };

    fn replace_table(tables: &mut crate::tests::TableList, tag: &[u8; 4], data: Vec<u8>) {
        for (table_tag, table_data) in tables.iter_mut() {
            if table_tag == tag {
                *table_data = data.clone();
            }
        }
    }

    #[test]
    fn static_truetype_font() {
        let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
        let file = FontFile::parse(&data).unwrap();
        assert_eq!(file.container(), Container::Sfnt(TRUETYPE_VERSION));
        let fonts = file.fonts().unwrap();
        assert_eq!(fonts.len(), 1);
        let font = &fonts[0];
        assert_eq!(font.outline_format(), OutlineFormat::Glyf);
        assert!(!font.is_variable());
        assert_eq!(font.head().unwrap().units_per_em, 1000);
        assert_eq!(font.maxp().unwrap().num_glyphs, 3);
        assert_eq!(font.horizontal_advance(2).unwrap(), 600.0);
        assert_eq!(font.os2().unwrap().us_weight_class, 400);
        assert_eq!(font.names().unwrap().subfamily(), Some("Regular"));
        assert!(font.glyph(0).unwrap().is_none());
        assert_eq!(font.glyph(2).unwrap().unwrap().number_of_points(), 4);
        assert_eq!(font.cmap().unwrap().map_glyph('B').unwrap(), Some(2));
    }

    #[test]
    fn static_font_has_no_variation_tables() {
        let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
        let file = FontFile::parse(&data).unwrap();
        let font = &file.fonts().unwrap()[0];
        assert!(font.fvar().is_none());
        assert!(font.avar().is_none());
        assert!(font.gvar().is_none());
        assert!(font.hvar().is_none());
        assert!(font.stat().is_none());
        assert!(font.glyph_variations(1).unwrap().is_empty());
        assert_eq!(font.decode_count(tag::GVAR), 0);
    }

    #[test]
    fn dependencies_decoded_once() {
        let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
        let file = FontFile::parse(&data).unwrap();
        let font = &file.fonts().unwrap()[0];
        // Validation decoded glyf, which needs loca, which needs head and maxp
        for table in [tag::HEAD, tag::MAXP, tag::HHEA, tag::HMTX, tag::LOCA, tag::GLYF] {
            assert_eq!(font.decode_count(table), 1, "'{}'", DisplayTag(table));
        }
        assert_eq!(font.decode_count(tag::NAME), 0);
        font.names().unwrap();
        font.names().unwrap();
        assert_eq!(font.decode_count(tag::NAME), 1);
    }

    #[test]
    fn collection_shares_decoded_tables() {
        let regular = truetype_tables("Test", "Regular", 400);
        let bold = truetype_tables("Test", "Bold", 700);
        let data = collection(&[(TRUETYPE_VERSION, &regular[..]), (TRUETYPE_VERSION, &bold[..])]);
        let file = FontFile::parse(&data).unwrap();
        assert_eq!(file.container(), Container::Collection);
        let fonts = file.fonts().unwrap();
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[1].index(), 1);

        let first = fonts[0].glyf().unwrap().unwrap();
        let second = fonts[1].glyf().unwrap().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(fonts[0].decode_count(tag::GLYF), 1);
        assert_eq!(fonts[1].decode_count(tag::GLYF), 1);

        assert_eq!(fonts[0].names().unwrap().subfamily(), Some("Regular"));
        assert_eq!(fonts[1].names().unwrap().subfamily(), Some("Bold"));
        assert_eq!(fonts[1].decode_count(tag::NAME), 1);
    }

    #[test]
    fn cff_font() {
        let data = sfnt(CFF_VERSION, &cff_tables("Test", "Regular"));
        let file = FontFile::parse(&data).unwrap();
        let font = &file.fonts().unwrap()[0];
        assert_eq!(font.outline_format(), OutlineFormat::Cff);
        assert!(font.cff().unwrap().is_some());
        assert!(font.glyf().unwrap().is_none());
        assert!(font.glyph(1).unwrap().is_none());
    }

    #[test]
    fn woff_font() {
        let tables = truetype_tables("Test", "Regular", 400);
        let woff = woff_from_tables(&woff_tables(&tables));
        let file = FontFile::parse(&woff).unwrap();
        assert_eq!(
            file.container(),
            Container::Woff {
                flavor: TRUETYPE_VERSION
            }
        );
        let fonts = file.fonts().unwrap();
        assert_eq!(fonts[0].sfnt_version(), tag::OTTO);
        // Outlines are found by table presence, not by the version tag
        assert_eq!(fonts[0].outline_format(), OutlineFormat::Glyf);
        assert_eq!(fonts[0].names().unwrap().family(), Some("Test"));

        let owned = FontFile::from_vec(woff.clone()).unwrap();
        assert_eq!(owned.fonts().unwrap().len(), 1);
    }

    #[test]
    fn required_table_failure() {
        let mut tables = truetype_tables("Test", "Regular", 400);
        // Version 1.0 followed by too few fields
        replace_table(&mut tables, b"hhea", crate::tests::hhea_table(3)[..10].to_vec());
        let data = sfnt(TRUETYPE_VERSION, &tables);
        let file = FontFile::parse(&data).unwrap();
        match file.fonts() {
            Err(FontError::Table(err)) => {
                assert_eq!(err.tag, tag::HHEA);
                assert_eq!(err.error, ParseError::BadEof);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_required_table() {
        let tables = truetype_tables("Test", "Regular", 400)
            .into_iter()
            .filter(|(tag, _)| tag != b"maxp")
            .collect::<Vec<_>>();
        let data = sfnt(TRUETYPE_VERSION, &tables);
        let file = FontFile::parse(&data).unwrap();
        match file.fonts() {
            Err(FontError::Table(err)) => {
                assert_eq!(err.tag, tag::MAXP);
                assert_eq!(err.error, ParseError::MissingTable(tag::MAXP));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn each_required_table_is_checked() {
        for &required in REQUIRED_TABLES.iter() {
            let tables = truetype_tables("Test", "Regular", 400)
                .into_iter()
                .filter(|(tag, _)| u32::from_be_bytes(*tag) != required)
                .collect::<Vec<_>>();
            let data = sfnt(TRUETYPE_VERSION, &tables);
            let file = FontFile::parse(&data).unwrap();
            match file.fonts() {
                Err(FontError::Table(err)) => {
                    assert_eq!(err.tag, required);
                    assert_eq!(err.error, ParseError::MissingTable(required));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn non_critical_table_failure() {
        let mut tables = truetype_tables("Test", "Regular", 400);
        replace_table(&mut tables, b"OS/2", vec![0, 1, 2]);
        let data = sfnt(TRUETYPE_VERSION, &tables);
        let file = FontFile::parse(&data).unwrap();
        let font = &file.fonts().unwrap()[0];
        assert!(font.os2().is_none());
        assert_eq!(
            font.table(tag::OS_2).err().map(|err| err.error),
            Some(ParseError::BadEof)
        );
        // The failure is cached too
        assert_eq!(font.decode_count(tag::OS_2), 1);
    }

    #[test]
    fn gvar_glyph_count_must_match() {
        let mut tables = variable_tables();
        replace_table(&mut tables, b"gvar", crate::tests::empty_gvar_table(1, 2));
        let data = sfnt(TRUETYPE_VERSION, &tables);
        let file = FontFile::parse(&data).unwrap();
        let font = &file.fonts().unwrap()[0];
        assert!(font.gvar().is_none());
        assert_eq!(
            font.table(tag::GVAR).err().map(|err| err.error),
            Some(ParseError::BadValue)
        );
    }

    #[test]
    fn named_instances_follow_base_font() {
        let data = sfnt(TRUETYPE_VERSION, &variable_tables());
        let file = FontFile::parse(&data).unwrap();
        let fonts = file.fonts().unwrap();
        assert_eq!(fonts.len(), 3);
        assert!(fonts[0].instance().is_none());
        assert_eq!(fonts[1].names().unwrap().subfamily(), Some("Light"));
        assert_eq!(fonts[2].names().unwrap().postscript_name(), Some("VarSans-Bd"));
        // The base font keeps its own names
        assert_eq!(fonts[0].names().unwrap().subfamily(), Some("Regular"));
        assert_eq!(fonts[0].decode_count(tag::NAME), 1);

        // wght 700 normalizes to 0.6 of the region peaking at the maximum, 300 is outside it
        assert_eq!(fonts[0].horizontal_advance(2).unwrap(), 600.0);
        assert_eq!(fonts[1].horizontal_advance(2).unwrap(), 600.0);
        let bold_advance = fonts[2].horizontal_advance(2).unwrap();
        assert!((bold_advance - 720.0).abs() < 0.1, "{}", bold_advance);

        let without = FontFile::parse_with_options(
            &data,
            DecodeOptions {
                synthesize_instances: false,
                ..DecodeOptions::default()
            },
        )
        .unwrap();
        assert_eq!(without.fonts().unwrap().len(), 1);
    }

    #[test]
    fn unsupported_tag_in_directory() {
        let mut tables = truetype_tables("Test", "Regular", 400);
        tables.push((*b"DSIG", vec![0; 8]));
        let data = sfnt(TRUETYPE_VERSION, &tables);
        let file = FontFile::parse(&data).unwrap();
        let font = &file.fonts().unwrap()[0];
        assert!(font.has_table(tag!(b"DSIG")));
        assert_eq!(font.table_tags().count(), 11);
        assert_eq!(
            font.table(tag!(b"DSIG")).err().map(|err| err.error),
            Some(ParseError::UnsupportedFormat(tag!(b"DSIG")))
        );
        assert_eq!(font.table_scope(tag!(b"DSIG")).unwrap().unwrap().data().len(), 8);
    }
}
