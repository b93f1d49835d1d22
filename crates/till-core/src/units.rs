//! # Unit Conversion
//!
//! Converts quantities between measurement units through the base unit of
//! their family.
//!
//! ## Families
//! ```text
//! ┌──────────────┬────────────────────────────────────┬──────────────────┐
//! │ Family       │ Units (factor into base)           │ Base             │
//! ├──────────────┼────────────────────────────────────┼──────────────────┤
//! │ Mass         │ g 0.001 · kg 1 · t 1000            │ kg               │
//! │ Volume       │ ml 0.001 · l 1                     │ l                │
//! │ Length       │ mm 0.001 · cm 0.01 · m 1 · in .0254│ m                │
//! │ Area         │ cm2 0.0001 · m2 1                  │ m2               │
//! │ CubicVolume  │ cm3 0.000001 · m3 1                │ m3               │
//! │ Voltage      │ v 1                                │ v                │
//! │ Current      │ a 1                                │ a                │
//! │ Power        │ w 1                                │ w                │
//! │ Count        │ unit 1 · dozen 12 · hundred 100    │ unit             │
//! │ Box/Crate/   │ 1 each, one family per unit: the   │ itself           │
//! │ Bundle       │ content differs per product        │                  │
//! └──────────────┴────────────────────────────────────┴──────────────────┘
//! ```
//!
//! ## Fail-Open Policy
//! Conversion never fails. Converting across families, or from a symbol
//! nobody recognizes, returns the quantity unchanged. Pricing code depends
//! on this; callers that must not mix families check
//! [`Unit::is_convertible_to`] first.
//!
//! ```rust
//! use till_core::units::{convert_unit, Unit};
//!
//! assert_eq!(convert_unit(1.5, Unit::Kilogram, Unit::Gram), 1500.0);
//! assert_eq!(convert_unit(3.0, Unit::Dozen, Unit::Unit), 36.0);
//! // Different families: identity
//! assert_eq!(convert_unit(2.0, Unit::Liter, Unit::Kilogram), 2.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use ts_rs::TS;

// =============================================================================
// Unit Family
// =============================================================================

/// The dimension a unit measures. Conversion is defined only inside a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    Mass,
    Volume,
    Length,
    Area,
    CubicVolume,
    Voltage,
    Current,
    Power,
    Count,
    Box,
    Crate,
    Bundle,
}

// =============================================================================
// Unit
// =============================================================================

/// A measurement unit, serialized (and stored) as its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Unit {
    #[serde(rename = "g")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "g"))]
    Gram,
    #[serde(rename = "kg")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "kg"))]
    Kilogram,
    #[serde(rename = "t")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "t"))]
    Ton,
    #[serde(rename = "ml")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ml"))]
    Milliliter,
    #[serde(rename = "l")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "l"))]
    Liter,
    #[serde(rename = "mm")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "mm"))]
    Millimeter,
    #[serde(rename = "cm")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cm"))]
    Centimeter,
    #[serde(rename = "m")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "m"))]
    Meter,
    #[serde(rename = "in")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "in"))]
    Inch,
    #[serde(rename = "cm2")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cm2"))]
    SquareCentimeter,
    #[serde(rename = "m2")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "m2"))]
    SquareMeter,
    #[serde(rename = "cm3")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cm3"))]
    CubicCentimeter,
    #[serde(rename = "m3")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "m3"))]
    CubicMeter,
    #[serde(rename = "v")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "v"))]
    Volt,
    #[serde(rename = "a")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "a"))]
    Ampere,
    #[serde(rename = "w")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "w"))]
    Watt,
    #[serde(rename = "unit")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "unit"))]
    Unit,
    #[serde(rename = "dozen")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "dozen"))]
    Dozen,
    #[serde(rename = "hundred")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "hundred"))]
    Hundred,
    #[serde(rename = "box")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "box"))]
    Box,
    #[serde(rename = "crate")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "crate"))]
    Crate,
    #[serde(rename = "bundle")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bundle"))]
    Bundle,
}

impl Unit {
    /// Every supported unit, in display order.
    pub const ALL: [Unit; 22] = [
        Unit::Gram,
        Unit::Kilogram,
        Unit::Ton,
        Unit::Milliliter,
        Unit::Liter,
        Unit::Millimeter,
        Unit::Centimeter,
        Unit::Meter,
        Unit::Inch,
        Unit::SquareCentimeter,
        Unit::SquareMeter,
        Unit::CubicCentimeter,
        Unit::CubicMeter,
        Unit::Volt,
        Unit::Ampere,
        Unit::Watt,
        Unit::Unit,
        Unit::Dozen,
        Unit::Hundred,
        Unit::Box,
        Unit::Crate,
        Unit::Bundle,
    ];

    /// The symbol used in storage, JSON and UI selects.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Ton => "t",
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Millimeter => "mm",
            Unit::Centimeter => "cm",
            Unit::Meter => "m",
            Unit::Inch => "in",
            Unit::SquareCentimeter => "cm2",
            Unit::SquareMeter => "m2",
            Unit::CubicCentimeter => "cm3",
            Unit::CubicMeter => "m3",
            Unit::Volt => "v",
            Unit::Ampere => "a",
            Unit::Watt => "w",
            Unit::Unit => "unit",
            Unit::Dozen => "dozen",
            Unit::Hundred => "hundred",
            Unit::Box => "box",
            Unit::Crate => "crate",
            Unit::Bundle => "bundle",
        }
    }

    pub const fn family(&self) -> UnitFamily {
        match self {
            Unit::Gram | Unit::Kilogram | Unit::Ton => UnitFamily::Mass,
            Unit::Milliliter | Unit::Liter => UnitFamily::Volume,
            Unit::Millimeter | Unit::Centimeter | Unit::Meter | Unit::Inch => UnitFamily::Length,
            Unit::SquareCentimeter | Unit::SquareMeter => UnitFamily::Area,
            Unit::CubicCentimeter | Unit::CubicMeter => UnitFamily::CubicVolume,
            Unit::Volt => UnitFamily::Voltage,
            Unit::Ampere => UnitFamily::Current,
            Unit::Watt => UnitFamily::Power,
            Unit::Unit | Unit::Dozen | Unit::Hundred => UnitFamily::Count,
            Unit::Box => UnitFamily::Box,
            Unit::Crate => UnitFamily::Crate,
            Unit::Bundle => UnitFamily::Bundle,
        }
    }

    /// How many base units one of this unit is.
    pub const fn factor(&self) -> f64 {
        match self {
            Unit::Gram => 0.001,
            Unit::Kilogram => 1.0,
            Unit::Ton => 1000.0,
            Unit::Milliliter => 0.001,
            Unit::Liter => 1.0,
            Unit::Millimeter => 0.001,
            Unit::Centimeter => 0.01,
            Unit::Meter => 1.0,
            Unit::Inch => 0.0254,
            Unit::SquareCentimeter => 0.0001,
            Unit::SquareMeter => 1.0,
            Unit::CubicCentimeter => 0.000_001,
            Unit::CubicMeter => 1.0,
            Unit::Volt | Unit::Ampere | Unit::Watt => 1.0,
            Unit::Unit => 1.0,
            Unit::Dozen => 12.0,
            Unit::Hundred => 100.0,
            Unit::Box | Unit::Crate | Unit::Bundle => 1.0,
        }
    }

    /// The base unit of this unit's family.
    pub const fn base_unit(&self) -> Unit {
        match self.family() {
            UnitFamily::Mass => Unit::Kilogram,
            UnitFamily::Volume => Unit::Liter,
            UnitFamily::Length => Unit::Meter,
            UnitFamily::Area => Unit::SquareMeter,
            UnitFamily::CubicVolume => Unit::CubicMeter,
            UnitFamily::Voltage => Unit::Volt,
            UnitFamily::Current => Unit::Ampere,
            UnitFamily::Power => Unit::Watt,
            UnitFamily::Count => Unit::Unit,
            UnitFamily::Box => Unit::Box,
            UnitFamily::Crate => Unit::Crate,
            UnitFamily::Bundle => Unit::Bundle,
        }
    }

    #[inline]
    pub fn is_convertible_to(&self, other: Unit) -> bool {
        self.family() == other.family()
    }

    /// Parses a symbol or English name, case-insensitively.
    ///
    /// ```rust
    /// use till_core::units::Unit;
    ///
    /// assert_eq!(Unit::from_symbol("KG"), Some(Unit::Kilogram));
    /// assert_eq!(Unit::from_symbol(" liter "), Some(Unit::Liter));
    /// assert_eq!(Unit::from_symbol("furlong"), None);
    /// ```
    pub fn from_symbol(symbol: &str) -> Option<Unit> {
        let symbol = symbol.trim().to_lowercase();
        if let Some(unit) = Unit::ALL.iter().find(|u| u.symbol() == symbol) {
            return Some(*unit);
        }

        let unit = match symbol.as_str() {
            "gram" | "grams" => Unit::Gram,
            "kilogram" | "kilograms" => Unit::Kilogram,
            "ton" | "tons" => Unit::Ton,
            "milliliter" | "milliliters" => Unit::Milliliter,
            "liter" | "liters" | "lt" => Unit::Liter,
            "millimeter" | "millimeters" => Unit::Millimeter,
            "centimeter" | "centimeters" => Unit::Centimeter,
            "meter" | "meters" => Unit::Meter,
            "inch" | "inches" => Unit::Inch,
            "volt" | "volts" => Unit::Volt,
            "ampere" | "amperes" | "amp" => Unit::Ampere,
            "watt" | "watts" => Unit::Watt,
            "units" | "u" | "pc" | "pcs" => Unit::Unit,
            _ => return None,
        };
        Some(unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::from_symbol(s).ok_or_else(|| format!("unknown unit: {s}"))
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Converts `quantity` of `unit` into the family's base unit.
#[inline]
pub fn convert_to_base_unit(quantity: f64, unit: Unit) -> f64 {
    quantity * unit.factor()
}

/// Converts `quantity` expressed in the base unit into `unit`.
#[inline]
pub fn convert_from_base_unit(quantity: f64, unit: Unit) -> f64 {
    quantity / unit.factor()
}

/// Converts between two units of the same family.
///
/// Identity when the units are equal or belong to different families.
pub fn convert_unit(quantity: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return quantity;
    }

    if !from.is_convertible_to(to) {
        debug!(%from, %to, "Units are not convertible, keeping quantity");
        return quantity;
    }

    (quantity * from.factor()) / to.factor()
}

/// Symbol-level conversion for untyped input (imports, UI text fields).
///
/// An unrecognized symbol on either side leaves the quantity unchanged.
///
/// ```rust
/// use till_core::units::convert_symbols;
///
/// assert_eq!(convert_symbols(500.0, "g", "kg"), 0.5);
/// assert_eq!(convert_symbols(7.0, "g", "bushel"), 7.0);
/// ```
pub fn convert_symbols(quantity: f64, from: &str, to: &str) -> f64 {
    match (Unit::from_symbol(from), Unit::from_symbol(to)) {
        (Some(from), Some(to)) => convert_unit(quantity, from, to),
        _ => {
            debug!(from, to, "Unrecognized unit symbol, keeping quantity");
            quantity
        }
    }
}

/// Symbol-level [`convert_to_base_unit`]; unknown symbols are identity.
pub fn symbol_to_base_unit(quantity: f64, unit: &str) -> f64 {
    Unit::from_symbol(unit)
        .map(|u| convert_to_base_unit(quantity, u))
        .unwrap_or(quantity)
}

/// Symbol-level [`convert_from_base_unit`]; unknown symbols are identity.
pub fn symbol_from_base_unit(quantity: f64, unit: &str) -> f64 {
    Unit::from_symbol(unit)
        .map(|u| convert_from_base_unit(quantity, u))
        .unwrap_or(quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
