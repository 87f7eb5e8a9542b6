//! Loaded packs: the mandatory narrow pack, the wide-pack cache, and the
//! opening-quote alternates, all parameterized over the texture type so the
//! layout engine can run without a GPU.

use crate::error::LoadError;

use super::cache::PackCache;
use super::fixups::QuoteMark;
use super::key::{PackKey, PackKeySet};
use super::metrics::PackMetrics;

/// One glyph atlas: measured metrics plus its uploaded texture.
pub struct Pack<T> {
    pub metrics: PackMetrics,
    pub texture: T,
}

/// Texture identity of a laid-out glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackId {
    Narrow,
    Wide(PackKey),
    QuoteAlt(QuoteMark),
}

/// Every pack a renderer owns.
pub struct PackSet<T> {
    narrow: Pack<T>,
    wide: PackCache<Pack<T>>,
    quote_alternates: [Option<T>; 2],
}

impl<T> PackSet<T> {
    pub fn new(narrow: Pack<T>) -> Self {
        Self {
            narrow,
            wide: PackCache::new(),
            quote_alternates: [None, None],
        }
    }

    pub fn narrow(&self) -> &Pack<T> {
        &self.narrow
    }

    pub fn wide(&self, key: PackKey) -> Option<&Pack<T>> {
        self.wide.get(key)
    }

    pub fn wide_cache(&self) -> &PackCache<Pack<T>> {
        &self.wide
    }

    pub fn set_quote_alternate(&mut self, mark: QuoteMark, texture: T) {
        self.quote_alternates[mark.index()] = Some(texture);
    }

    pub fn has_quote_alternate(&self, mark: QuoteMark) -> bool {
        self.quote_alternates[mark.index()].is_some()
    }

    /// Resolve a wide-path lookup: the key's own pack, then `00`, then narrow.
    pub fn resolve_wide(&self, key: PackKey) -> (PackId, &Pack<T>) {
        if let Some(pack) = self.wide.get(key) {
            (PackId::Wide(key), pack)
        } else if let Some(pack) = self.wide.get(PackKey::BASE) {
            (PackId::Wide(PackKey::BASE), pack)
        } else {
            (PackId::Narrow, &self.narrow)
        }
    }

    /// Texture behind a laid-out glyph, if it is loaded.
    pub fn texture(&self, id: PackId) -> Option<&T> {
        match id {
            PackId::Narrow => Some(&self.narrow.texture),
            PackId::Wide(key) => self.wide.get(key).map(|p| &p.texture),
            PackId::QuoteAlt(mark) => self.quote_alternates[mark.index()].as_ref(),
        }
    }

    /// Load any wide packs in `keys` not attempted before. See [`PackCache::ensure`].
    pub fn ensure_wide<D, F, B>(
        &mut self,
        keys: &PackKeySet,
        fetch: F,
        build: B,
    ) -> Vec<(PackKey, LoadError)>
    where
        D: Send,
        F: Fn(PackKey) -> Result<D, LoadError> + Sync,
        B: FnMut(PackKey, D) -> Pack<T>,
    {
        self.wide.ensure(keys, fetch, build)
    }
}
