//! Text layout: classifies characters as narrow or wide, places one quad
//! per visible glyph along a single line, and groups adjacent quads that
//! sample the same texture into runs.
//!
//! Layout is pure. It reads pack metrics through a [`PackSet`] and never
//! touches the GPU, so every rule here is unit-testable.

mod options;

pub use options::{Align, Baseline, DrawOptions, Mode, VAlign};

use std::ops::Range;

use crate::atlas::{PackId, PackKey, PackKeySet, PackSet, QuoteMark, TileSize};

/// Highest codepoint the narrow pack is responsible for in mixed text.
const NARROW_LIMIT: u32 = 0x7F;

const SPACE: char = ' ';

/// Nominal line height, in unscaled pixels.
const LINE_UNIT: f32 = 16.0;

/// Wide-space advance when the `00` pack is unavailable (full tile + padding).
const WIDE_SPACE_FALLBACK: u16 = 17;

/// Narrow slot used for codepoints the narrow pack cannot address.
const NARROW_FALLBACK_SLOT: u8 = b'?';

/// Round half up. Differs from `f32::round` on negative halves.
pub(crate) fn round_half_up(x: f32) -> f32 {
    (x + 0.5).floor()
}

fn is_wide_char(ch: char) -> bool {
    u32::from(ch) > NARROW_LIMIT
}

/// Which pack family a character is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlyphClass {
    Narrow,
    Wide,
}

/// Character routing for one call, resolved from `Mode` and the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Narrow,
    Wide,
    Mixed,
}

impl Route {
    fn resolve(text: &str, mode: Mode) -> Self {
        match mode {
            Mode::Default => Self::Narrow,
            Mode::Glyph => Self::Wide,
            Mode::Mixed => Self::Mixed,
            Mode::Auto => {
                if text.chars().any(is_wide_char) {
                    Self::Mixed
                } else {
                    Self::Narrow
                }
            }
        }
    }

    fn class_of(self, ch: char) -> GlyphClass {
        match self {
            Self::Narrow => GlyphClass::Narrow,
            Self::Wide => GlyphClass::Wide,
            Self::Mixed if is_wide_char(ch) => GlyphClass::Wide,
            Self::Mixed => GlyphClass::Narrow,
        }
    }

    /// Whether this call draws any glyph from a wide pack.
    fn has_glyph(self, text: &str) -> bool {
        match self {
            Self::Narrow => false,
            Self::Wide => true,
            Self::Mixed => text.chars().any(is_wide_char),
        }
    }
}

/// Wide packs a call to `layout` will look up, plus `00` whenever any wide
/// glyph is drawn (it backs wide spaces and is the first fallback).
pub fn required_keys(text: &str, mode: Mode) -> PackKeySet {
    let route = Route::resolve(text, mode);
    let mut keys: PackKeySet = text
        .chars()
        .filter(|&ch| route.class_of(ch) == GlyphClass::Wide)
        .map(PackKey::of)
        .collect();
    if route.has_glyph(text) {
        keys.insert(PackKey::BASE);
    }
    keys
}

/// One positioned, textured quad. Position is relative to the layout origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub pack: PackId,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// `[u0, v0, u1, v1]`.
    pub uv: [f32; 4],
}

/// Consecutive spans sampling the same texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub pack: PackId,
    pub spans: Range<usize>,
}

/// Result of laying out one line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub spans: Vec<Span>,
    pub runs: Vec<Run>,
    /// Total pen advance, including trailing spaces.
    pub width: f32,
    pub line_height: f32,
    /// Top-left of the line after applying `align`/`valign`.
    pub origin: [f32; 2],
}

impl TextLayout {
    pub fn run_spans(&self, run: &Run) -> &[Span] {
        &self.spans[run.spans.clone()]
    }

    /// Absolute `[x0, y0, x1, y1]` of a span.
    pub fn span_rect(&self, span: &Span) -> [f32; 4] {
        let x0 = self.origin[0] + span.x;
        let y0 = self.origin[1] + span.y;
        [x0, y0, x0 + span.w, y0 + span.h]
    }
}

/// Mutable per-call state threaded through the character loop.
#[derive(Debug, Default)]
struct LayoutCursor {
    pen_x: f32,
    /// Class of the previous non-space character; reset by spaces.
    prev: Option<GlyphClass>,
    double_quotes: u32,
    single_quotes: u32,
}

impl LayoutCursor {
    /// Count an occurrence of `mark`; odd occurrences open a quotation.
    fn quote_opens(&mut self, mark: QuoteMark) -> bool {
        let count = match mark {
            QuoteMark::Double => &mut self.double_quotes,
            QuoteMark::Single => &mut self.single_quotes,
        };
        *count += 1;
        *count % 2 == 1
    }
}

/// Per-call constants shared by every character.
struct LineContext<'a, T> {
    opts: &'a DrawOptions,
    packs: &'a PackSet<T>,
    route: Route,
    ref_center: f32,
}

impl<T> LineContext<'_, T> {
    /// Scale to device pixels and round.
    fn dp(&self, n: f32) -> f32 {
        round_half_up(n * self.opts.scale)
    }

    fn narrow_space(&self) -> f32 {
        let adv = self.packs.narrow().metrics.advance(b' ');
        round_half_up(self.dp(f32::from(adv) * self.opts.ds) * self.opts.space_mul)
    }

    fn wide_space(&self) -> f32 {
        let adv = self
            .packs
            .wide(PackKey::BASE)
            .map_or(WIDE_SPACE_FALLBACK, |p| p.metrics.advance(b' '));
        round_half_up(self.dp(f32::from(adv)) * self.opts.space_mul)
    }

    /// Advance for the space at `chars[i]`. Mixed text uses the narrow width
    /// only when the nearest non-space neighbours on both sides are narrow.
    fn space_advance(&self, chars: &[char], i: usize) -> f32 {
        match self.route {
            Route::Narrow => self.narrow_space(),
            Route::Wide => self.wide_space(),
            Route::Mixed => {
                let prev = chars[..i].iter().rev().find(|&&c| c != SPACE);
                let next = chars[i + 1..].iter().find(|&&c| c != SPACE);
                let both_narrow = matches!(
                    (prev, next),
                    (Some(&p), Some(&n)) if !is_wide_char(p) && !is_wide_char(n)
                );
                if both_narrow {
                    self.narrow_space()
                } else {
                    self.wide_space()
                }
            }
        }
    }

    fn place_narrow(&self, ch: char, cursor: &mut LayoutCursor) -> Span {
        let opts = self.opts;
        let narrow = &self.packs.narrow().metrics;

        if self.route == Route::Mixed
            && cursor.prev == Some(GlyphClass::Wide)
            && opts.ascii_after_glyph_pad_px > 0.0
        {
            cursor.pen_x += round_half_up(opts.scale * opts.ascii_after_glyph_pad_px);
        }

        let slot = u8::try_from(u32::from(ch)).unwrap_or(NARROW_FALLBACK_SLOT);
        let mut pack = PackId::Narrow;
        let mut uv = narrow.cell_uv(slot);
        if let Some(mark) = QuoteMark::from_char(ch) {
            if cursor.quote_opens(mark) && self.packs.has_quote_alternate(mark) {
                pack = PackId::QuoteAlt(mark);
                uv = [0.0, 0.0, 1.0, 1.0];
            }
        }

        let span = Span {
            pack,
            x: cursor.pen_x,
            y: self.dp(self.ref_center - narrow.center_row * opts.ds),
            w: self.dp(narrow.tile.w as f32 * opts.ds),
            h: self.dp(narrow.tile.h as f32 * opts.ds),
            uv,
        };

        let adv = f32::from(narrow.advance(slot));
        cursor.pen_x += round_half_up(self.dp(adv * opts.ds) * opts.spacing_mul);
        cursor.prev = Some(GlyphClass::Narrow);
        span
    }

    fn place_wide(&self, ch: char, cursor: &mut LayoutCursor) -> Span {
        let opts = self.opts;

        if opts.glyph_track_px > 0.0 && cursor.prev == Some(GlyphClass::Wide) {
            cursor.pen_x += round_half_up(opts.scale * opts.glyph_track_px);
        }

        let (pack, source) = self.packs.resolve_wide(PackKey::of(ch));
        let lo = (u32::from(ch) & 0xFF) as u8;
        let size = self.dp(TileSize::WIDE.w as f32);

        let span = Span {
            pack,
            x: cursor.pen_x,
            y: self.dp(self.ref_center - source.metrics.center_row),
            w: size,
            h: size,
            uv: source.metrics.cell_uv(lo),
        };

        let adv = f32::from(source.metrics.advance(lo));
        cursor.pen_x += round_half_up(self.dp(adv) * opts.spacing_mul);
        cursor.prev = Some(GlyphClass::Wide);
        span
    }
}

/// Shared vertical reference all glyphs are centered against.
fn reference_center<T>(opts: &DrawOptions, packs: &PackSet<T>, has_glyph: bool) -> f32 {
    let narrow = packs.narrow().metrics.center_row;
    let base = packs.wide(PackKey::BASE).map(|p| p.metrics.center_row);
    match opts.baseline {
        Baseline::Ascii => narrow * if has_glyph { 2.0 } else { opts.ds },
        Baseline::Glyph => base.unwrap_or(narrow * 2.0),
        Baseline::Auto if has_glyph => base.unwrap_or(narrow * 2.0),
        Baseline::Auto => narrow * opts.ds,
    }
}

fn line_height(opts: &DrawOptions, narrow_tile: TileSize, has_glyph: bool) -> f32 {
    let unscaled = if opts.lock_line_h || has_glyph {
        LINE_UNIT
    } else {
        (narrow_tile.h as f32 * opts.ds).max(LINE_UNIT)
    };
    round_half_up(unscaled * opts.scale)
}

fn anchor(opts: &DrawOptions, width: f32, line_height: f32) -> [f32; 2] {
    let x = match opts.align {
        Align::Left => opts.x,
        Align::Center => opts.x - width / 2.0,
        Align::Right => opts.x - width,
    };
    let y = match opts.valign {
        VAlign::Top => opts.y,
        VAlign::Middle => opts.y - line_height / 2.0,
        VAlign::Bottom => opts.y - line_height,
    };
    [round_half_up(x), round_half_up(y)]
}

/// Merge adjacent spans of the same pack. Draw order is preserved.
fn batch_runs(spans: &[Span]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (i, span) in spans.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.pack == span.pack => run.spans.end = i + 1,
            _ => runs.push(Run {
                pack: span.pack,
                spans: i..i + 1,
            }),
        }
    }
    runs
}

/// Lay out `text` as a single line.
///
/// Wide packs should already be ensured (see [`required_keys`]); missing
/// ones fall back to `00`, then to the narrow pack.
pub fn layout<T>(text: &str, opts: &DrawOptions, packs: &PackSet<T>) -> TextLayout {
    let route = Route::resolve(text, opts.mode);
    let has_glyph = route.has_glyph(text);
    let ctx = LineContext {
        opts,
        packs,
        route,
        ref_center: reference_center(opts, packs, has_glyph),
    };

    let chars: Vec<char> = text.chars().collect();
    let mut cursor = LayoutCursor::default();
    let mut spans = Vec::with_capacity(chars.len());

    for (i, &ch) in chars.iter().enumerate() {
        if ch == SPACE {
            cursor.pen_x += ctx.space_advance(&chars, i);
            cursor.prev = None;
            continue;
        }
        let span = match route.class_of(ch) {
            GlyphClass::Narrow => ctx.place_narrow(ch, &mut cursor),
            GlyphClass::Wide => ctx.place_wide(ch, &mut cursor),
        };
        spans.push(span);
    }

    let width = cursor.pen_x;
    let line_height = line_height(opts, packs.narrow().metrics.tile, has_glyph);
    TextLayout {
        runs: batch_runs(&spans),
        spans,
        width,
        line_height,
        origin: anchor(opts, width, line_height),
    }
}

#[cfg(test)]
mod tests;
