//! Supplement domain model.
//!
//! # Responsibility
//! - Define the canonical supplement record and its partial-update shape.
//! - Own validation and merge rules used by the service layer.
//!
//! # Invariants
//! - `gtin` is the natural key: exactly 13 ASCII digits, never changed after
//!   creation, never part of a partial update.
//! - `name`, `brand` and `flavor` are non-empty.
//! - Every nutrient quantity is finite and `>= 0`.
//! - Validation reports every violation, not just the first one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

// ASCII class on purpose: `\d` would also match non-ASCII digits.
static GTIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{13}$").expect("valid gtin regex"));

/// Nutritional facts for one product, keyed by its GTIN barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplement {
    /// 13-digit Global Trade Item Number. Unique and immutable.
    pub gtin: String,
    pub name: String,
    pub brand: String,
    pub flavor: String,
    pub carbohydrates: f32,
    pub electrolytes: f32,
    pub maltodextrose: f32,
    pub fructose: f32,
    pub caffeine: f32,
    pub sodium: f32,
    pub protein: f32,
}

/// Sparse update for a stored supplement.
///
/// `None` means "leave unchanged". There is deliberately no `gtin` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrolytes: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maltodextrose: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fructose: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caffeine: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f32>,
}

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum SupplementViolation {
    /// `gtin` is not exactly 13 ASCII digits.
    InvalidGtin(String),
    /// A required text field is empty.
    EmptyField(&'static str),
    /// A nutrient quantity is negative, NaN or infinite.
    InvalidNutrient { field: &'static str, value: f32 },
}

impl Display for SupplementViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGtin(gtin) => {
                write!(f, "gtin {gtin:?} is invalid, it must be a 13-digit number")
            }
            Self::EmptyField(field) => write!(f, "{field} \"\" is invalid, it must not be empty"),
            Self::InvalidNutrient { field, value } => write!(
                f,
                "{field} {value:.6} is invalid, it must be finite and greater or equal to zero"
            ),
        }
    }
}

/// Validation failure carrying every violated rule.
///
/// Renders as all violations joined with `"; "`, so one round-trip shows the
/// caller every problem.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplementValidationError {
    pub violations: Vec<SupplementViolation>,
}

impl SupplementValidationError {
    /// Returns whether a violation of the given field is present.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|violation| match violation {
            SupplementViolation::InvalidGtin(_) => field == "gtin",
            SupplementViolation::EmptyField(name) => *name == field,
            SupplementViolation::InvalidNutrient { field: name, .. } => *name == field,
        })
    }
}

impl Display for SupplementValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join("; "))
    }
}

impl Error for SupplementValidationError {}

impl Supplement {
    /// Checks every field rule and reports all violations together.
    pub fn validate(&self) -> Result<(), SupplementValidationError> {
        let mut violations = Vec::new();

        if !GTIN_RE.is_match(&self.gtin) {
            violations.push(SupplementViolation::InvalidGtin(self.gtin.clone()));
        }

        for (field, value) in [
            ("name", &self.name),
            ("brand", &self.brand),
            ("flavor", &self.flavor),
        ] {
            if value.is_empty() {
                violations.push(SupplementViolation::EmptyField(field));
            }
        }

        for (field, value) in self.nutrients() {
            // JSON cannot carry NaN or infinity, so neither may be stored.
            if !(value.is_finite() && value >= 0.0) {
                violations.push(SupplementViolation::InvalidNutrient { field, value });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SupplementValidationError { violations })
        }
    }

    /// Returns a copy with every field present in `patch` replaced.
    ///
    /// Pure merge: `self` is untouched and absent patch fields keep their
    /// current value. The result is not validated here.
    pub fn apply_update(&self, patch: &SupplementPatch) -> Supplement {
        let mut merged = self.clone();

        if let Some(name) = &patch.name {
            merged.name = name.clone();
        }
        if let Some(brand) = &patch.brand {
            merged.brand = brand.clone();
        }
        if let Some(flavor) = &patch.flavor {
            merged.flavor = flavor.clone();
        }
        if let Some(value) = patch.carbohydrates {
            merged.carbohydrates = value;
        }
        if let Some(value) = patch.electrolytes {
            merged.electrolytes = value;
        }
        if let Some(value) = patch.maltodextrose {
            merged.maltodextrose = value;
        }
        if let Some(value) = patch.fructose {
            merged.fructose = value;
        }
        if let Some(value) = patch.caffeine {
            merged.caffeine = value;
        }
        if let Some(value) = patch.sodium {
            merged.sodium = value;
        }
        if let Some(value) = patch.protein {
            merged.protein = value;
        }

        merged
    }

    /// Nutrient quantities paired with their field names, in schema order.
    pub fn nutrients(&self) -> [(&'static str, f32); 7] {
        [
            ("carbohydrates", self.carbohydrates),
            ("electrolytes", self.electrolytes),
            ("maltodextrose", self.maltodextrose),
            ("fructose", self.fructose),
            ("caffeine", self.caffeine),
            ("sodium", self.sodium),
            ("protein", self.protein),
        ]
    }
}

impl SupplementPatch {
    /// Returns whether the patch would leave every field unchanged.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Tri-state field as seen on the wire: absent, explicit `null`, or a value.
///
/// Use with `#[serde(default)]` so a missing key decodes as `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchField<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for PatchField<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PatchField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

/// Decoded partial-update request body, before it is collapsed into a
/// [`SupplementPatch`].
///
/// Unknown keys are rejected so a misspelled field cannot silently turn into
/// a no-op update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchDocument {
    #[serde(default)]
    pub gtin: PatchField<String>,
    #[serde(default)]
    pub name: PatchField<String>,
    #[serde(default)]
    pub brand: PatchField<String>,
    #[serde(default)]
    pub flavor: PatchField<String>,
    #[serde(default)]
    pub carbohydrates: PatchField<f32>,
    #[serde(default)]
    pub electrolytes: PatchField<f32>,
    #[serde(default)]
    pub maltodextrose: PatchField<f32>,
    #[serde(default)]
    pub fructose: PatchField<f32>,
    #[serde(default)]
    pub caffeine: PatchField<f32>,
    #[serde(default)]
    pub sodium: PatchField<f32>,
    #[serde(default)]
    pub protein: PatchField<f32>,
}

/// Malformed partial-update body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// A field was sent as explicit `null`; no supplement field is nullable.
    NullField(&'static str),
    /// The body names a different gtin than the update target.
    GtinMismatch { expected: String, found: String },
}

impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullField(field) => write!(f, "field `{field}` must not be null"),
            Self::GtinMismatch { expected, found } => write!(
                f,
                "gtin is immutable: body names `{found}` but target is `{expected}`"
            ),
        }
    }
}

impl Error for PatchError {}

impl PatchDocument {
    /// Collapses the tri-state body into set/unset fields for `target_gtin`.
    ///
    /// # Errors
    /// - `NullField` for any explicit `null`.
    /// - `GtinMismatch` when the body carries a gtin other than the target.
    pub fn into_patch(self, target_gtin: &str) -> Result<SupplementPatch, PatchError> {
        match collapse(self.gtin, "gtin")? {
            Some(found) if found != target_gtin => {
                return Err(PatchError::GtinMismatch {
                    expected: target_gtin.to_string(),
                    found,
                });
            }
            _ => {}
        }

        Ok(SupplementPatch {
            name: collapse(self.name, "name")?,
            brand: collapse(self.brand, "brand")?,
            flavor: collapse(self.flavor, "flavor")?,
            carbohydrates: collapse(self.carbohydrates, "carbohydrates")?,
            electrolytes: collapse(self.electrolytes, "electrolytes")?,
            maltodextrose: collapse(self.maltodextrose, "maltodextrose")?,
            fructose: collapse(self.fructose, "fructose")?,
            caffeine: collapse(self.caffeine, "caffeine")?,
            sodium: collapse(self.sodium, "sodium")?,
            protein: collapse(self.protein, "protein")?,
        })
    }
}

fn collapse<T>(field: PatchField<T>, name: &'static str) -> Result<Option<T>, PatchError> {
    match field {
        PatchField::Absent => Ok(None),
        PatchField::Null => Err(PatchError::NullField(name)),
        PatchField::Value(value) => Ok(Some(value)),
    }
}
