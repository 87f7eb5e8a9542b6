//! Layout unit tests against synthetic pack metrics.

use super::*;
use crate::atlas::PackMetrics;
use crate::atlas::testing::AtlasBuilder;
use crate::atlas::{Pack, QuoteMark};
use crate::error::LoadError;

const GA: char = '\u{AC00}';
const GAK: char = '\u{AC01}';
const HANGUL: PackKey = PackKey(0xAC);

/// Narrow glyphs all span rows 1..=6 (center 3.5).
fn narrow_metrics() -> PackMetrics {
    AtlasBuilder::new(TileSize::NARROW)
        .block(b'A', 0, 1, 5, 6) // advance 7
        .block(b'B', 0, 1, 4, 6) // advance 6
        .block(b'H', 1, 1, 5, 6) // advance 6
        .block(b'i', 3, 1, 3, 6) // advance 2
        .block(b'?', 1, 1, 5, 6) // advance 6
        .block(b'"', 1, 1, 3, 6)
        .block(b'\'', 2, 1, 2, 6)
        .metrics()
}

/// `00` pack: 'A' fills 15 columns over the full height (center 7.5).
fn base_metrics() -> PackMetrics {
    AtlasBuilder::new(TileSize::WIDE)
        .block(0x41, 0, 0, 14, 15)
        .metrics()
}

/// `AC` pack: U+AC00 and U+AC01, 13 columns wide, rows 2..=13.
fn hangul_metrics() -> PackMetrics {
    AtlasBuilder::new(TileSize::WIDE)
        .block(0x00, 1, 2, 13, 13)
        .block(0x01, 1, 2, 13, 13)
        .metrics()
}

fn packs(wide: &[(PackKey, PackMetrics)]) -> PackSet<()> {
    let mut set = PackSet::new(Pack {
        metrics: narrow_metrics(),
        texture: (),
    });
    let keys: PackKeySet = wide.iter().map(|(k, _)| *k).collect();
    let failures = set.ensure_wide(
        &keys,
        |key| {
            wide.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, m)| m.clone())
                .ok_or_else(|| LoadError::Fetch {
                    name: key.file_name(),
                    reason: "missing".to_owned(),
                })
        },
        |_, metrics| Pack { metrics, texture: () },
    );
    assert!(failures.is_empty());
    set
}

fn full_packs() -> PackSet<()> {
    packs(&[(PackKey::BASE, base_metrics()), (HANGUL, hangul_metrics())])
}

fn with_mode(mode: Mode) -> DrawOptions {
    DrawOptions {
        mode,
        ..DrawOptions::default()
    }
}

fn xs(layout: &TextLayout) -> Vec<f32> {
    layout.spans.iter().map(|s| s.x).collect()
}

fn pack_ids(layout: &TextLayout) -> Vec<PackId> {
    layout.spans.iter().map(|s| s.pack).collect()
}

// Rounding.

#[test]
fn round_half_up_matches_browser_rounding() {
    assert_eq!(round_half_up(2.5), 3.0);
    assert_eq!(round_half_up(3.5), 4.0);
    assert_eq!(round_half_up(-1.0), -1.0);
    assert_eq!(round_half_up(-1.5), -1.0);
    assert_eq!(round_half_up(-0.5), 0.0);
    assert_eq!(round_half_up(4.49), 4.0);
}

// Narrow path.

#[test]
fn narrow_text_positions() {
    let set = packs(&[]);
    let out = layout("Hi", &DrawOptions::default(), &set);

    let narrow = &set.narrow().metrics;
    assert_eq!(
        out.spans,
        vec![
            Span {
                pack: PackId::Narrow,
                x: 0.0,
                y: 0.0,
                w: 24.0,
                h: 24.0,
                uv: narrow.cell_uv(b'H'),
            },
            Span {
                pack: PackId::Narrow,
                x: 18.0,
                y: 0.0,
                w: 24.0,
                h: 24.0,
                uv: narrow.cell_uv(b'i'),
            },
        ]
    );
    assert_eq!(out.width, 24.0);
    assert_eq!(out.line_height, 32.0);
    assert_eq!(out.origin, [0.0, 0.0]);
    assert_eq!(
        out.runs,
        vec![Run {
            pack: PackId::Narrow,
            spans: 0..2,
        }]
    );
}

#[test]
fn scale_and_spacing_multiply_advances() {
    let set = packs(&[]);
    let opts = DrawOptions {
        scale: 1.0,
        ..DrawOptions::default()
    };
    let out = layout("Hi", &opts, &set);
    assert_eq!(xs(&out), vec![0.0, 9.0]);
    assert_eq!(out.spans[0].w, 12.0);

    let opts = DrawOptions {
        spacing_mul: 1.5,
        ..DrawOptions::default()
    };
    assert_eq!(xs(&layout("Hi", &opts, &set)), vec![0.0, 27.0]);
}

#[test]
fn empty_text_has_no_spans() {
    let out = layout("", &DrawOptions::default(), &full_packs());
    assert!(out.spans.is_empty());
    assert!(out.runs.is_empty());
    assert_eq!(out.width, 0.0);
    assert_eq!(out.line_height, 32.0);
}

#[test]
fn trailing_spaces_count_toward_width() {
    let set = packs(&[]);
    let out = layout("H  ", &DrawOptions::default(), &set);
    assert_eq!(out.spans.len(), 1);
    // 18 + two narrow spaces of round(24 * 0.5).
    assert_eq!(out.width, 42.0);
}

#[test]
fn auto_matches_default_for_ascii() {
    let mut set = full_packs();
    set.set_quote_alternate(QuoteMark::Double, ());
    let text = "Hi, \"there\" 'A' B?";
    assert_eq!(
        layout(text, &with_mode(Mode::Auto), &set),
        layout(text, &with_mode(Mode::Default), &set)
    );
}

#[test]
fn default_mode_routes_everything_narrow() {
    let set = full_packs();
    let narrow = &set.narrow().metrics;
    let out = layout("\u{e9}A\u{AC00}", &with_mode(Mode::Default), &set);
    assert_eq!(pack_ids(&out), vec![PackId::Narrow; 3]);
    assert_eq!(out.spans[0].uv, narrow.cell_uv(0xE9));
    // Beyond one byte the narrow path draws '?'.
    assert_eq!(out.spans[2].uv, narrow.cell_uv(b'?'));
    // Empty 0xE9 slot (24), 'A' (21), '?' (18).
    assert_eq!(out.width, 63.0);
}

// Wide and mixed paths.

#[test]
fn mixed_ascii_then_wide_has_no_pad() {
    let set = full_packs();
    let out = layout(&format!("A{GA}"), &DrawOptions::default(), &set);

    assert_eq!(pack_ids(&out), vec![PackId::Narrow, PackId::Wide(HANGUL)]);
    assert_eq!(xs(&out), vec![0.0, 21.0]);
    // Shared reference 3.5 * 2 = 7: narrow shifts down, wide up.
    assert_eq!(out.spans[0].y, 4.0);
    assert_eq!(out.spans[1].y, -1.0);
    assert_eq!(out.spans[0].w, 24.0);
    assert_eq!(out.spans[1].w, 32.0);
    assert_eq!(out.spans[1].h, 32.0);
    assert_eq!(out.spans[1].uv, hangul_metrics().cell_uv(0x00));
    assert_eq!(out.width, 49.0);
}

#[test]
fn ascii_after_wide_gets_pad() {
    let out = layout(&format!("{GA}A"), &DrawOptions::default(), &full_packs());
    // 28 advance + round(2 * 2.5).
    assert_eq!(xs(&out), vec![0.0, 33.0]);
    assert_eq!(out.width, 54.0);

    let opts = DrawOptions {
        ascii_after_glyph_pad_px: 0.0,
        ..DrawOptions::default()
    };
    assert_eq!(xs(&layout(&format!("{GA}A"), &opts, &full_packs())), vec![0.0, 28.0]);
}

#[test]
fn consecutive_wide_glyphs_get_track() {
    let set = full_packs();
    let out = layout(&format!("{GA}{GAK}"), &DrawOptions::default(), &set);
    assert_eq!(xs(&out), vec![0.0, 32.0]);
    assert_eq!(
        out.runs,
        vec![Run {
            pack: PackId::Wide(HANGUL),
            spans: 0..2,
        }]
    );

    let opts = DrawOptions {
        glyph_track_px: 0.0,
        ..DrawOptions::default()
    };
    assert_eq!(xs(&layout(&format!("{GA}{GAK}"), &opts, &set)), vec![0.0, 28.0]);
}

#[test]
fn space_resets_previous_class() {
    // Wide space (round(32 * 0.5)) and no track after it.
    let out = layout(&format!("{GA} {GAK}"), &DrawOptions::default(), &full_packs());
    assert_eq!(xs(&out), vec![0.0, 44.0]);
}

#[test]
fn mixed_space_width_depends_on_both_neighbors() {
    let set = full_packs();
    let mixed = with_mode(Mode::Mixed);

    // Both neighbours narrow: round(dp(8 * 1.5) * 0.5) = 12.
    assert_eq!(xs(&layout("A B", &mixed, &set)), vec![0.0, 33.0]);
    // Narrow then wide: wide space, round(dp(16) * 0.5) = 16.
    assert_eq!(xs(&layout(&format!("A {GA}"), &mixed, &set)), vec![0.0, 37.0]);
    // Runs of spaces look past each other to the nearest glyph.
    assert_eq!(xs(&layout(&format!("A  {GA}"), &mixed, &set)), vec![0.0, 53.0]);
    // Leading space has no left neighbour, so it is wide.
    assert_eq!(xs(&layout(" A", &mixed, &set)), vec![16.0]);
}

#[test]
fn wide_space_without_base_pack_uses_fallback_advance() {
    let set = packs(&[]);
    // round(dp(17) * 0.5) = 17.
    assert_eq!(xs(&layout(" A", &with_mode(Mode::Glyph), &set)), vec![17.0]);
}

#[test]
fn glyph_mode_draws_ascii_from_base_pack() {
    let set = full_packs();
    let out = layout("A A", &with_mode(Mode::Glyph), &set);
    assert_eq!(pack_ids(&out), vec![PackId::Wide(PackKey::BASE); 2]);
    assert_eq!(out.spans[0].uv, base_metrics().cell_uv(0x41));
    assert_eq!(xs(&out), vec![0.0, 48.0]);
}

#[test]
fn wide_lookup_falls_back_to_base_then_narrow() {
    let base_only = packs(&[(PackKey::BASE, base_metrics())]);
    let out = layout(&GA.to_string(), &DrawOptions::default(), &base_only);
    assert_eq!(pack_ids(&out), vec![PackId::Wide(PackKey::BASE)]);
    assert_eq!(out.spans[0].uv, base_metrics().cell_uv(0x00));
    assert_eq!(out.width, 32.0);

    let none = packs(&[]);
    let out = layout(&GA.to_string(), &DrawOptions::default(), &none);
    assert_eq!(pack_ids(&out), vec![PackId::Narrow]);
    assert_eq!(out.spans[0].uv, none.narrow().metrics.cell_uv(0x00));
    assert_eq!(out.spans[0].w, 32.0);
    assert_eq!(out.width, 16.0);
}

#[test]
fn failed_wide_packs_fall_back_to_narrow() {
    let mut set = packs(&[]);
    let keys: PackKeySet = [PackKey::BASE, HANGUL].into_iter().collect();
    let failures = set.ensure_wide(
        &keys,
        |key| -> Result<PackMetrics, LoadError> {
            Err(LoadError::Fetch {
                name: key.file_name(),
                reason: "not found".to_owned(),
            })
        },
        |_, metrics| Pack { metrics, texture: () },
    );
    assert_eq!(failures.len(), 2);
    assert!(set.wide_cache().is_failed(PackKey::BASE));
    assert!(set.wide_cache().is_failed(HANGUL));

    let out = layout(&GA.to_string(), &DrawOptions::default(), &set);
    assert_eq!(pack_ids(&out), vec![PackId::Narrow]);
    assert_eq!(out.spans[0].uv, set.narrow().metrics.cell_uv(0x00));
    assert_eq!(out.spans[0].w, 32.0);
    assert_eq!(required_keys(&GA.to_string(), Mode::Auto), keys);
}

#[test]
fn runs_split_on_pack_changes_only() {
    let out = layout(&format!("AB{GA}{GAK}B"), &DrawOptions::default(), &full_packs());
    assert_eq!(
        out.runs,
        vec![
            Run {
                pack: PackId::Narrow,
                spans: 0..2,
            },
            Run {
                pack: PackId::Wide(HANGUL),
                spans: 2..4,
            },
            Run {
                pack: PackId::Narrow,
                spans: 4..5,
            },
        ]
    );
    assert_eq!(out.run_spans(&out.runs[1]).len(), 2);
}

// Quotes.

#[test]
fn opening_quotes_alternate() {
    let mut set = packs(&[]);
    set.set_quote_alternate(QuoteMark::Double, ());
    let out = layout("\"\"\"", &DrawOptions::default(), &set);
    let alt = PackId::QuoteAlt(QuoteMark::Double);
    assert_eq!(pack_ids(&out), vec![alt, PackId::Narrow, alt]);
    assert_eq!(out.spans[0].uv, [0.0, 0.0, 1.0, 1.0]);
    assert_eq!(out.spans[1].uv, set.narrow().metrics.cell_uv(b'"'));
    assert_eq!(out.runs.len(), 3);
}

#[test]
fn quote_counters_are_independent() {
    let mut set = packs(&[]);
    set.set_quote_alternate(QuoteMark::Double, ());
    set.set_quote_alternate(QuoteMark::Single, ());
    let out = layout("'\"'\"", &DrawOptions::default(), &set);
    assert_eq!(
        pack_ids(&out),
        vec![
            PackId::QuoteAlt(QuoteMark::Single),
            PackId::QuoteAlt(QuoteMark::Double),
            PackId::Narrow,
            PackId::Narrow,
        ]
    );
}

#[test]
fn quotes_without_alternates_stay_narrow() {
    let out = layout("\"a\"", &DrawOptions::default(), &packs(&[]));
    assert_eq!(pack_ids(&out), vec![PackId::Narrow; 3]);
}

// Vertical metrics.

#[test]
fn baseline_selects_reference_center() {
    let set = full_packs();
    let narrow_only = packs(&[]);
    let opts = |baseline| DrawOptions {
        baseline,
        ..DrawOptions::default()
    };

    // Ascii without wide glyphs: 3.5 * ds, so narrow glyphs sit at 0.
    assert_eq!(layout("H", &opts(Baseline::Ascii), &set).spans[0].y, 0.0);
    // Glyph: `00` center 7.5, round(2 * 2.25) = 5.
    assert_eq!(layout("H", &opts(Baseline::Glyph), &set).spans[0].y, 5.0);
    // Glyph without `00`: narrow center doubled.
    assert_eq!(layout("H", &opts(Baseline::Glyph), &narrow_only).spans[0].y, 4.0);
    // Auto follows Ascii for narrow-only text and Glyph otherwise.
    assert_eq!(layout("H", &opts(Baseline::Auto), &set).spans[0].y, 0.0);
    let mixed = layout(&format!("H{GA}"), &opts(Baseline::Auto), &set);
    assert_eq!(mixed.spans[0].y, 5.0);
    assert_eq!(mixed.spans[1].y, 0.0);
}

#[test]
fn line_height_rules() {
    let set = full_packs();
    let unlocked = |ds| DrawOptions {
        lock_line_h: false,
        ds,
        ..DrawOptions::default()
    };

    assert_eq!(layout("H", &DrawOptions::default(), &set).line_height, 32.0);
    assert_eq!(layout("H", &unlocked(1.5), &set).line_height, 32.0);
    assert_eq!(layout("H", &unlocked(3.0), &set).line_height, 48.0);
    assert_eq!(layout(&format!("H{GA}"), &unlocked(3.0), &set).line_height, 32.0);
}

#[test]
fn ds_scales_narrow_glyphs_only() {
    let opts = DrawOptions {
        ds: 3.0,
        ..DrawOptions::default()
    };
    let out = layout(&format!("A{GA}"), &opts, &full_packs());
    assert_eq!(out.spans[0].w, 48.0);
    assert_eq!(out.spans[1].w, 32.0);
}

// Anchoring.

#[test]
fn horizontal_anchoring() {
    let set = packs(&[]);
    let base = DrawOptions::default().at(100.0, 0.0);

    let right = DrawOptions {
        align: Align::Right,
        ..base.clone()
    };
    let out = layout("Hi", &right, &set);
    assert_eq!(out.origin[0], 76.0);
    assert_eq!(out.origin[0] + out.width, 100.0);

    let center = DrawOptions {
        align: Align::Center,
        ..base
    };
    let out = layout("Hi", &center, &set);
    assert_eq!(out.origin[0], 88.0);
    assert_eq!(out.origin[0] + out.width / 2.0, 100.0);
}

#[test]
fn vertical_anchoring() {
    let set = packs(&[]);
    let anchored = |valign| DrawOptions {
        valign,
        ..DrawOptions::default().at(0.0, 50.0)
    };
    assert_eq!(layout("H", &anchored(VAlign::Top), &set).origin[1], 50.0);
    assert_eq!(layout("H", &anchored(VAlign::Middle), &set).origin[1], 34.0);
    assert_eq!(layout("H", &anchored(VAlign::Bottom), &set).origin[1], 18.0);
}

#[test]
fn span_rect_is_absolute() {
    let set = packs(&[]);
    let out = layout("Hi", &DrawOptions::default().at(10.0, 20.0), &set);
    assert_eq!(out.span_rect(&out.spans[1]), [28.0, 20.0, 52.0, 44.0]);
}

// Required packs.

#[test]
fn required_keys_per_mode() {
    let keys = |text: &str, mode| required_keys(text, mode).iter().collect::<Vec<_>>();

    assert!(keys("Hi", Mode::Auto).is_empty());
    assert!(keys("AB", Mode::Mixed).is_empty());
    assert!(keys(&GA.to_string(), Mode::Default).is_empty());
    assert_eq!(keys(&format!("A{GA} B"), Mode::Auto), vec![PackKey::BASE, HANGUL]);
    assert_eq!(keys(&format!("{GA}{GAK}"), Mode::Mixed), vec![PackKey::BASE, HANGUL]);
    assert_eq!(keys("A", Mode::Glyph), vec![PackKey::BASE]);
    assert_eq!(keys("\u{3042}", Mode::Auto), vec![PackKey::BASE, PackKey(0x30)]);
}
