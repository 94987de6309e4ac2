// Builders for synthetic font data shared by the unit and integration tests.
//
// Everything here works on plain byte vectors so that it can be included into the crate's own
// test module as well as compiled as a module of each integration test.

use std::io::Write as _;

use flate2::write::ZlibEncoder;
use flate2::Compression;

pub type TableList = Vec<([u8; 4], Vec<u8>)>;

pub const TRUETYPE_VERSION: u32 = 0x0001_0000;
pub const CFF_VERSION: u32 = u32::from_be_bytes(*b"OTTO");

/// Big-endian byte accumulator.
#[derive(Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Bytes(Vec::new())
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.0.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn tag(&mut self, tag: [u8; 4]) -> &mut Self {
        self.0.extend_from_slice(&tag);
        self
    }

    /// A 16.16 fixed point number.
    pub fn fixed(&mut self, value: f32) -> &mut Self {
        self.u32(fixed_raw(value) as u32)
    }

    /// A 2.14 fixed point number.
    pub fn f2dot14(&mut self, value: f32) -> &mut Self {
        self.i16((value * 16384.0).round() as i16)
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

pub fn fixed_raw(value: f32) -> i32 {
    (value * 65536.0).round() as i32
}

fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

pub fn search_params(num_tables: u16) -> (u16, u16, u16) {
    if num_tables == 0 {
        return (0, 0, 0);
    }
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = 16 << entry_selector;
    (
        search_range,
        entry_selector,
        num_tables * 16 - search_range,
    )
}

/// `head` with the given `indexToLocFormat` (0 short, 1 long).
pub fn head_table(index_to_loc_format: i16, units_per_em: u16) -> Vec<u8> {
    head_table_with_style(index_to_loc_format, units_per_em, 0)
}

pub fn head_table_with_style(
    index_to_loc_format: i16,
    units_per_em: u16,
    mac_style: u16,
) -> Vec<u8> {
    let mut head = Bytes::new();
    head.u16(1)
        .u16(0)
        .fixed(1.0)
        .u32(0)
        .u32(0x5F0F3CF5)
        .u16(0x000B)
        .u16(units_per_em)
        .i64(0)
        .i64(0)
        .i16(0)
        .i16(-200)
        .i16(1000)
        .i16(800)
        .u16(mac_style)
        .u16(8)
        .i16(2)
        .i16(index_to_loc_format)
        .i16(0);
    head.into_vec()
}

pub fn hhea_table(num_h_metrics: u16) -> Vec<u8> {
    let mut hhea = Bytes::new();
    hhea.u16(1).u16(0).i16(800).i16(-200).i16(0).u16(1000);
    hhea.i16(0).i16(0).i16(1000).i16(1).i16(0).i16(0);
    hhea.bytes(&[0; 8]).i16(0).u16(num_h_metrics);
    hhea.into_vec()
}

/// `maxp` version 1.0 when `truetype`, else the CFF version 0.5.
pub fn maxp_table(num_glyphs: u16, truetype: bool) -> Vec<u8> {
    let mut maxp = Bytes::new();
    if truetype {
        maxp.u32(0x0001_0000).u16(num_glyphs);
        for _ in 0..13 {
            maxp.u16(1);
        }
    } else {
        maxp.u32(0x0000_5000).u16(num_glyphs);
    }
    maxp.into_vec()
}

pub fn hmtx_table(metrics: &[(u16, i16)], left_side_bearings: &[i16]) -> Vec<u8> {
    let mut hmtx = Bytes::new();
    for &(advance, lsb) in metrics {
        hmtx.u16(advance).i16(lsb);
    }
    for &lsb in left_side_bearings {
        hmtx.i16(lsb);
    }
    hmtx.into_vec()
}

pub fn loca_table(offsets: &[u32], long: bool) -> Vec<u8> {
    let mut loca = Bytes::new();
    for &offset in offsets {
        if long {
            loca.u32(offset);
        } else {
            loca.u16((offset / 2) as u16);
        }
    }
    loca.into_vec()
}

/// A glyph with a single contour of on-curve points, padded to an even length.
pub fn simple_glyph(points: &[(i16, i16)]) -> Vec<u8> {
    let mut glyph = Bytes::new();
    let x_min = points.iter().map(|p| p.0).min().unwrap_or(0);
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(0);
    let y_min = points.iter().map(|p| p.1).min().unwrap_or(0);
    let y_max = points.iter().map(|p| p.1).max().unwrap_or(0);
    glyph.i16(1).i16(x_min).i16(y_min).i16(x_max).i16(y_max);
    glyph.u16(points.len() as u16 - 1).u16(0);
    for _ in points {
        glyph.u8(0x01);
    }
    let mut previous = (0, 0);
    for &(x, _) in points {
        glyph.i16(x - previous.0);
        previous.0 = x;
    }
    for &(_, y) in points {
        glyph.i16(y - previous.1);
        previous.1 = y;
    }
    if glyph.len() % 2 != 0 {
        glyph.u8(0);
    }
    glyph.into_vec()
}

/// Concatenate glyphs into `glyf` data, returning the data and the `loca` offsets.
pub fn glyf_table(glyphs: &[Vec<u8>]) -> (Vec<u8>, Vec<u32>) {
    let mut glyf = Vec::new();
    let mut offsets = vec![0];
    for glyph in glyphs {
        glyf.extend_from_slice(glyph);
        offsets.push(glyf.len() as u32);
    }
    (glyf, offsets)
}

/// A `cmap` with a single Windows Unicode BMP format 4 subtable. Each mapping gets its own
/// segment.
pub fn cmap_table(mappings: &[(u16, u16)]) -> Vec<u8> {
    let mut mappings = mappings.to_vec();
    mappings.sort();
    let seg_count = mappings.len() as u16 + 1;
    let (search_range, entry_selector, range_shift) = {
        let entry_selector = 15 - seg_count.leading_zeros() as u16;
        let search_range = 2 << entry_selector;
        (search_range, entry_selector, seg_count * 2 - search_range)
    };

    let mut subtable = Bytes::new();
    subtable
        .u16(4)
        .u16(16 + 8 * seg_count)
        .u16(0)
        .u16(seg_count * 2)
        .u16(search_range)
        .u16(entry_selector)
        .u16(range_shift);
    for &(ch, _) in &mappings {
        subtable.u16(ch);
    }
    subtable.u16(0xFFFF).u16(0);
    for &(ch, _) in &mappings {
        subtable.u16(ch);
    }
    subtable.u16(0xFFFF);
    for &(ch, glyph) in &mappings {
        subtable.u16(glyph.wrapping_sub(ch));
    }
    subtable.u16(1);
    for _ in 0..seg_count {
        subtable.u16(0);
    }

    let mut cmap = Bytes::new();
    cmap.u16(0).u16(1).u16(3).u16(1).u32(12);
    cmap.bytes(&subtable.0);
    cmap.into_vec()
}

/// A format 0 `name` table. Windows and Unicode strings are encoded as UTF-16BE, Macintosh
/// strings are expected to be ASCII.
pub fn name_table(records: &[(u16, u16, u16, u16, &str)]) -> Vec<u8> {
    let mut storage = Vec::new();
    let mut name = Bytes::new();
    let count = records.len() as u16;
    name.u16(0).u16(count).u16(6 + 12 * count);
    for &(platform_id, encoding_id, language_id, name_id, value) in records {
        let encoded = match platform_id {
            1 => value.as_bytes().to_vec(),
            _ => value
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect(),
        };
        name.u16(platform_id)
            .u16(encoding_id)
            .u16(language_id)
            .u16(name_id)
            .u16(encoded.len() as u16)
            .u16(storage.len() as u16);
        storage.extend(encoded);
    }
    name.bytes(&storage);
    name.into_vec()
}

/// `OS/2` of the given version with every field a version defines.
pub fn os2_table(version: u16, weight: u16, vendor: [u8; 4]) -> Vec<u8> {
    let mut os2 = Bytes::new();
    os2.u16(version).i16(500).u16(weight).u16(5).u16(0);
    for _ in 0..10 {
        os2.i16(100);
    }
    os2.i16(0).bytes(&[2, 11, 5, 2, 2, 2, 2, 2, 2, 4]);
    os2.u32(1).u32(0).u32(0).u32(0).tag(vendor);
    let fs_selection = if weight >= 700 { 1 << 5 } else { 1 << 6 };
    os2.u16(fs_selection).u16(0x20).u16(0xFFFF);
    // sTypoAscender through usWinDescent
    os2.i16(800).i16(-200).i16(0).u16(1000).u16(200);
    if version >= 1 {
        os2.u32(1).u32(0);
    }
    if version >= 2 {
        os2.i16(500).i16(700).u16(0).u16(32).u16(2);
    }
    if version >= 5 {
        os2.u16(0).u16(0xFFFE);
    }
    os2.into_vec()
}

/// `post` version 3.0, which carries no glyph names.
pub fn post_table(italic_angle: f32, is_fixed_pitch: bool) -> Vec<u8> {
    let mut post = Bytes::new();
    post.u32(0x0003_0000)
        .fixed(italic_angle)
        .i16(-100)
        .i16(50)
        .u32(u32::from(is_fixed_pitch))
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0);
    post.into_vec()
}

/// `fvar` with the given axes `(tag, min, default, max)` and instances
/// `(subfamily name id, PostScript name id, coordinates)`.
///
/// The `postScriptNameID` field is written when any instance has one.
pub fn fvar_table(
    axes: &[([u8; 4], f32, f32, f32, u16)],
    instances: &[(u16, Option<u16>, &[f32])],
) -> Vec<u8> {
    let with_ps_names = instances.iter().any(|instance| instance.1.is_some());
    let axis_count = axes.len() as u16;
    let instance_size = 4 * axis_count + 4 + if with_ps_names { 2 } else { 0 };
    let mut fvar = Bytes::new();
    fvar.u16(1)
        .u16(0)
        .u16(16)
        .u16(2)
        .u16(axis_count)
        .u16(20)
        .u16(instances.len() as u16)
        .u16(instance_size);
    for &(tag, min, default, max, name_id) in axes {
        fvar.tag(tag).fixed(min).fixed(default).fixed(max).u16(0).u16(name_id);
    }
    for &(subfamily_name_id, ps_name_id, coordinates) in instances {
        fvar.u16(subfamily_name_id).u16(0);
        for &coordinate in coordinates {
            fvar.fixed(coordinate);
        }
        if with_ps_names {
            fvar.u16(ps_name_id.unwrap_or(0xFFFF));
        }
    }
    fvar.into_vec()
}

/// `avar` with one segment map `(from, to)` per axis.
pub fn avar_table(segment_maps: &[&[(f32, f32)]]) -> Vec<u8> {
    let mut avar = Bytes::new();
    avar.u16(1).u16(0).u16(0).u16(segment_maps.len() as u16);
    for map in segment_maps {
        avar.u16(map.len() as u16);
        for &(from, to) in map.iter() {
            avar.f2dot14(from).f2dot14(to);
        }
    }
    avar.into_vec()
}

/// `gvar` in which no glyph has variation data.
pub fn empty_gvar_table(axis_count: u16, glyph_count: u16) -> Vec<u8> {
    let data_offset = 20 + 2 * (u32::from(glyph_count) + 1);
    let mut gvar = Bytes::new();
    gvar.u16(1)
        .u16(0)
        .u16(axis_count)
        .u16(0)
        .u32(data_offset)
        .u16(glyph_count)
        .u16(0)
        .u32(data_offset);
    for _ in 0..=glyph_count {
        gvar.u16(0);
    }
    gvar.into_vec()
}

/// `HVAR` for a single axis with one region peaking at the axis maximum. Glyph ids index the
/// advance deltas directly.
pub fn hvar_table(advance_deltas: &[i16]) -> Vec<u8> {
    let mut hvar = Bytes::new();
    hvar.u16(1).u16(0).u32(20).u32(0).u32(0).u32(0);
    // Item variation store
    hvar.u16(1).u32(12).u16(1).u32(22);
    hvar.u16(1).u16(1).f2dot14(0.0).f2dot14(1.0).f2dot14(1.0);
    hvar.u16(advance_deltas.len() as u16).u16(1).u16(1).u16(0);
    for &delta in advance_deltas {
        hvar.i16(delta);
    }
    hvar.into_vec()
}

/// A format 1 `STAT` axis value.
pub fn stat_value_format1(axis_index: u16, flags: u16, name_id: u16, value: f32) -> Vec<u8> {
    let mut table = Bytes::new();
    table.u16(1).u16(axis_index).u16(flags).u16(name_id).fixed(value);
    table.into_vec()
}

/// A format 3 `STAT` axis value, linking `value` to `linked_value`.
pub fn stat_value_format3(
    axis_index: u16,
    flags: u16,
    name_id: u16,
    value: f32,
    linked_value: f32,
) -> Vec<u8> {
    let mut table = Bytes::new();
    table
        .u16(3)
        .u16(axis_index)
        .u16(flags)
        .u16(name_id)
        .fixed(value)
        .fixed(linked_value);
    table.into_vec()
}

/// `STAT` version 1.2 with design axes `(tag, name id, ordering)` and the given axis values.
pub fn stat_table(
    axes: &[([u8; 4], u16, u16)],
    values: &[Vec<u8>],
    elided_fallback: u16,
) -> Vec<u8> {
    let axes_offset = 20u32;
    let offsets_offset = axes_offset + 8 * axes.len() as u32;
    let mut stat = Bytes::new();
    stat.u16(1)
        .u16(2)
        .u16(8)
        .u16(axes.len() as u16)
        .u32(axes_offset)
        .u16(values.len() as u16)
        .u32(offsets_offset)
        .u16(elided_fallback);
    for &(tag, name_id, ordering) in axes {
        stat.tag(tag).u16(name_id).u16(ordering);
    }
    let mut offset = 2 * values.len();
    for value in values {
        stat.u16(offset as u16);
        offset += value.len();
    }
    for value in values {
        stat.bytes(value);
    }
    stat.into_vec()
}

/// `GSUB` 1.0 whose features each have no lookups. Every script has a default language system.
pub fn gsub_table(scripts: &[[u8; 4]], features: &[[u8; 4]]) -> Vec<u8> {
    let script_list_len = 2 + 6 * scripts.len() + 4 * scripts.len();
    let feature_list_len = 2 + 6 * features.len() + 4 * features.len();
    let script_list_offset = 10;
    let feature_list_offset = script_list_offset + script_list_len;
    let lookup_list_offset = feature_list_offset + feature_list_len;

    let mut gsub = Bytes::new();
    gsub.u16(1)
        .u16(0)
        .u16(script_list_offset as u16)
        .u16(feature_list_offset as u16)
        .u16(lookup_list_offset as u16);
    gsub.u16(scripts.len() as u16);
    for (i, &tag) in scripts.iter().enumerate() {
        gsub.tag(tag).u16((2 + 6 * scripts.len() + 4 * i) as u16);
    }
    for _ in scripts {
        // Script table whose default LangSys is the four bytes that follow the header
        gsub.u16(0).u16(0);
    }
    gsub.u16(features.len() as u16);
    for (i, &tag) in features.iter().enumerate() {
        gsub.tag(tag).u16((2 + 6 * features.len() + 4 * i) as u16);
    }
    for _ in features {
        gsub.u16(0).u16(0);
    }
    gsub.u16(0);
    gsub.into_vec()
}

/// An INDEX with a one or two byte offset size.
pub fn cff_index(objects: &[&[u8]]) -> Vec<u8> {
    let mut data = (objects.len() as u16).to_be_bytes().to_vec();
    if objects.is_empty() {
        return data;
    }
    let total = 1 + objects.iter().map(|object| object.len()).sum::<usize>();
    let push_offset = |data: &mut Vec<u8>, offset: usize| {
        if total > 0xFF {
            data.extend_from_slice(&(offset as u16).to_be_bytes());
        } else {
            data.push(offset as u8);
        }
    };
    data.push(if total > 0xFF { 2 } else { 1 });
    let mut offset = 1;
    push_offset(&mut data, offset);
    for object in objects {
        offset += object.len();
        push_offset(&mut data, offset);
    }
    for object in objects {
        data.extend_from_slice(object);
    }
    data
}

/// A DICT operand in the fixed 5 byte encoding.
pub fn cff_int5(value: i32) -> Vec<u8> {
    let mut data = vec![29];
    data.extend_from_slice(&value.to_be_bytes());
    data
}

/// A Type 1 CFF font named `Test` with a format 0 charset, one global subroutine and three
/// glyphs: an empty .notdef, a glyph that moves with an explicit width and calls the global
/// subroutine, and a glyph with a stem hint and hint mask.
pub fn sample_cff() -> Vec<u8> {
    let name_index = cff_index(&[&b"Test"[..]]);
    let string_index = cff_index(&[&b"Test Regular"[..]]);
    // 10 20 rlineto return
    let global_subrs = cff_index(&[&[149, 159, 5, 11][..]]);
    let charset = [0, 0, 34, 0, 35];
    let char_strings = cff_index(&[
        &[14][..],
        // 50 0 0 rmoveto -107 callgsubr endchar
        &[189, 139, 139, 21, 32, 29, 14][..],
        // 10 20 hstem hintmask 0x80 endchar
        &[149, 159, 1, 19, 0x80, 14][..],
    ]);
    let mut private_dict = cff_int5(100);
    private_dict.push(21);

    // Top DICT: charset, CharStrings, Private and FullName, each with 5 byte operands
    let top_dict_len = 6 + 6 + 11 + 6;
    let top_dict_index_len = 2 + 1 + 2 + top_dict_len;
    let charset_offset =
        4 + name_index.len() + top_dict_index_len + string_index.len() + global_subrs.len();
    let char_strings_offset = charset_offset + charset.len();
    let private_offset = char_strings_offset + char_strings.len();

    let mut top_dict = Vec::new();
    top_dict.extend(cff_int5(charset_offset as i32));
    top_dict.push(15);
    top_dict.extend(cff_int5(char_strings_offset as i32));
    top_dict.push(17);
    top_dict.extend(cff_int5(private_dict.len() as i32));
    top_dict.extend(cff_int5(private_offset as i32));
    top_dict.push(18);
    top_dict.extend(cff_int5(391));
    top_dict.push(2);
    assert_eq!(top_dict.len(), top_dict_len);

    let mut data = vec![1, 0, 4, 1];
    data.extend(name_index);
    data.extend(cff_index(&[&top_dict[..]]));
    data.extend(string_index);
    data.extend(global_subrs);
    data.extend(charset);
    data.extend(char_strings);
    data.extend(private_dict);
    data
}

fn postscript_name(family: &str, subfamily: &str) -> String {
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    format!("{}-{}", strip(family), strip(subfamily))
}

/// Tables for a complete three glyph TrueType font mapping `A` and `B`.
pub fn truetype_tables(family: &str, subfamily: &str, weight: u16) -> TableList {
    let glyphs = [
        Vec::new(),
        simple_glyph(&[(0, 0), (250, 700), (500, 0)]),
        simple_glyph(&[(50, 0), (50, 700), (550, 700), (550, 0)]),
    ];
    let (glyf, offsets) = glyf_table(&glyphs);
    let mac_style = u16::from(weight >= 700);
    vec![
        (*b"OS/2", os2_table(4, weight, *b"TEST")),
        (*b"cmap", cmap_table(&[(u16::from(b'A'), 1), (u16::from(b'B'), 2)])),
        (*b"glyf", glyf),
        (*b"head", head_table_with_style(0, 1000, mac_style)),
        (*b"hhea", hhea_table(3)),
        (*b"hmtx", hmtx_table(&[(500, 0), (500, 0), (600, 50)], &[])),
        (*b"loca", loca_table(&offsets, false)),
        (*b"maxp", maxp_table(3, true)),
        (*b"name", naming(family, subfamily, &[])),
        (*b"post", post_table(0.0, false)),
    ]
}

/// A `name` table of Windows English records.
pub fn english_name_table(names: &[(u16, &str)]) -> Vec<u8> {
    let records = names
        .iter()
        .map(|&(name_id, value)| (3, 1, 0x0409, name_id, value))
        .collect::<Vec<_>>();
    name_table(&records)
}

/// Family, subfamily and PostScript names followed by `extra` name ids.
pub fn naming(family: &str, subfamily: &str, extra: &[(u16, &str)]) -> Vec<u8> {
    let ps_name = postscript_name(family, subfamily);
    let mut names = vec![(1, family), (2, subfamily), (6, ps_name.as_str())];
    names.extend_from_slice(extra);
    english_name_table(&names)
}

/// Tables for a CFF flavoured font around [sample_cff].
pub fn cff_tables(family: &str, subfamily: &str) -> TableList {
    vec![
        (*b"CFF ", sample_cff()),
        (*b"OS/2", os2_table(3, 400, *b"TEST")),
        (*b"cmap", cmap_table(&[(u16::from(b'A'), 1), (u16::from(b'B'), 2)])),
        (*b"head", head_table(0, 1000)),
        (*b"hhea", hhea_table(3)),
        (*b"hmtx", hmtx_table(&[(500, 0), (550, 0), (600, 50)], &[])),
        (*b"maxp", maxp_table(3, false)),
        (*b"name", naming(family, subfamily, &[])),
        (*b"post", post_table(0.0, false)),
    ]
}

/// Name ids used by [variable_tables].
pub const WEIGHT_AXIS_NAME_ID: u16 = 256;
pub const LIGHT_NAME_ID: u16 = 257;
pub const BOLD_NAME_ID: u16 = 258;
pub const BOLD_PS_NAME_ID: u16 = 259;
pub const REGULAR_NAME_ID: u16 = 260;

/// A variable TrueType font "Var Sans" with a weight axis from 100 to 900, named instances
/// Light (300) and Bold (700, with a PostScript name), and `STAT`, `HVAR`, `gvar` and `GSUB`
/// tables.
pub fn variable_tables() -> TableList {
    let mut tables = truetype_tables("Var Sans", "Regular", 400);
    let names = naming(
        "Var Sans",
        "Regular",
        &[
            (WEIGHT_AXIS_NAME_ID, "Weight"),
            (LIGHT_NAME_ID, "Light"),
            (BOLD_NAME_ID, "Bold"),
            (BOLD_PS_NAME_ID, "VarSans-Bd"),
            (REGULAR_NAME_ID, "Regular"),
        ],
    );
    for (tag, data) in tables.iter_mut() {
        if tag == b"name" {
            *data = names.clone();
        }
    }
    tables.extend([
        (*b"GSUB", gsub_table(&[*b"DFLT", *b"latn"], &[*b"liga", *b"smcp"])),
        (*b"HVAR", hvar_table(&[0, 100, 200])),
        (
            *b"STAT",
            stat_table(
                &[(*b"wght", WEIGHT_AXIS_NAME_ID, 0)],
                &[
                    stat_value_format1(0, 0, LIGHT_NAME_ID, 300.0),
                    stat_value_format3(0, 2, REGULAR_NAME_ID, 400.0, 700.0),
                    stat_value_format1(0, 0, BOLD_NAME_ID, 700.0),
                ],
                REGULAR_NAME_ID,
            ),
        ),
        (
            *b"fvar",
            fvar_table(
                &[(*b"wght", 100.0, 400.0, 900.0, WEIGHT_AXIS_NAME_ID)],
                &[
                    (LIGHT_NAME_ID, None, &[300.0][..]),
                    (BOLD_NAME_ID, Some(BOLD_PS_NAME_ID), &[700.0][..]),
                ],
            ),
        ),
        (*b"gvar", empty_gvar_table(1, 3)),
    ]);
    tables
}

struct Member<'a> {
    sfnt_version: u32,
    tables: &'a [([u8; 4], Vec<u8>)],
}

// Lay out one or more table directories followed by the table data. Identical tables are
// stored once and shared between directories.
fn layout(members: &[Member<'_>], collection: bool) -> Vec<u8> {
    let header_len = if collection { 12 + 4 * members.len() } else { 0 };
    let directory_lens = members
        .iter()
        .map(|member| 12 + 16 * member.tables.len())
        .collect::<Vec<_>>();
    let data_start = header_len + directory_lens.iter().sum::<usize>();

    let mut table_data = Vec::new();
    let mut stored: Vec<(&[u8; 4], &Vec<u8>, usize)> = Vec::new();
    let mut directories = Vec::new();
    for member in members {
        let mut records = Vec::new();
        for (tag, data) in member.tables {
            let offset = match stored
                .iter()
                .find(|(stored_tag, stored_data, _)| *stored_tag == tag && *stored_data == data)
            {
                Some(&(_, _, offset)) => offset,
                None => {
                    let offset = data_start + table_data.len();
                    table_data.extend_from_slice(data);
                    pad4(&mut table_data);
                    stored.push((tag, data, offset));
                    offset
                }
            };
            records.push((*tag, table_checksum(data), offset as u32, data.len() as u32));
        }
        records.sort_by_key(|record| record.0);
        directories.push((member.sfnt_version, records));
    }

    let mut font = Bytes::new();
    if collection {
        font.tag(*b"ttcf").u16(1).u16(0).u32(members.len() as u32);
        let mut offset = header_len;
        for len in &directory_lens {
            font.u32(offset as u32);
            offset += len;
        }
    }
    for (sfnt_version, records) in directories {
        let num_tables = records.len() as u16;
        let (search_range, entry_selector, range_shift) = search_params(num_tables);
        font.u32(sfnt_version)
            .u16(num_tables)
            .u16(search_range)
            .u16(entry_selector)
            .u16(range_shift);
        for (tag, checksum, offset, length) in records {
            font.tag(tag).u32(checksum).u32(offset).u32(length);
        }
    }
    font.bytes(&table_data);
    font.into_vec()
}

/// An sfnt font file holding `tables`.
pub fn sfnt(sfnt_version: u32, tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    layout(
        &[Member {
            sfnt_version,
            tables,
        }],
        false,
    )
}

/// A TrueType collection of `fonts`. Tables with identical tag and data are shared.
pub fn collection(fonts: &[(u32, &[([u8; 4], Vec<u8>)])]) -> Vec<u8> {
    let members = fonts
        .iter()
        .map(|&(sfnt_version, tables)| Member {
            sfnt_version,
            tables,
        })
        .collect::<Vec<_>>();
    layout(&members, true)
}

/// A WOFF file holding `tables`. Tables are zlib compressed where that makes them smaller.
pub fn woff_from_tables(tables: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len();
    let directory_end = 44 + 20 * num_tables;
    let mut entries = Vec::new();
    let mut data = Vec::new();
    let mut total_sfnt_size = 12 + 16 * num_tables;
    for (tag, table) in tables {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(table).expect("compress table");
        let compressed = encoder.finish().expect("finish compression");
        let stored = if compressed.len() < table.len() {
            compressed
        } else {
            table.clone()
        };
        let offset = directory_end + data.len();
        entries.push((
            *tag,
            offset as u32,
            stored.len() as u32,
            table.len() as u32,
            table_checksum(table),
        ));
        data.extend(stored);
        pad4(&mut data);
        total_sfnt_size += (table.len() + 3) & !3;
    }

    let mut woff = Bytes::new();
    woff.tag(*b"wOFF")
        .u32(TRUETYPE_VERSION)
        .u32((directory_end + data.len()) as u32)
        .u16(num_tables as u16)
        .u16(0)
        .u32(total_sfnt_size as u32)
        .u16(1)
        .u16(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0);
    for (tag, offset, comp_length, orig_length, checksum) in entries {
        woff.u32(tag)
            .u32(offset)
            .u32(comp_length)
            .u32(orig_length)
            .u32(checksum);
    }
    woff.bytes(&data);
    woff.into_vec()
}

/// Convert a table list with array tags to the `u32` tags used by [woff_from_tables].
pub fn woff_tables(tables: &[([u8; 4], Vec<u8>)]) -> Vec<(u32, Vec<u8>)> {
    tables
        .iter()
        .map(|(tag, data)| (u32::from_be_bytes(*tag), data.clone()))
        .collect()
}
