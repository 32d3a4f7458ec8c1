//! Preset library: named scenario bundles per market and the market
//! catalogue (display names, control bounds).

pub mod catalog;
pub mod library;

pub use library::{MarketProfile, Preset, PresetLibrary, PresetSet};
