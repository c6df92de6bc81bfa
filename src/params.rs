//! Candidate configurations: the parameter settings whose rankings get fused.
//!
//! [`ScoringParams`] is a fixed set of per-field boosts and smoothing values
//! for a field-weighted entity/word retrieval model. Aggregation never reads
//! these values; they label rankers so a selection can be mapped back to a
//! concrete setting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AggregationError, Result};

macro_rules! scoring_params {
    ($( $(#[$doc:meta])* $field:ident : $key:literal = $default:expr ),+ $(,)?) => {
        /// Per-field boosts and smoothing parameters of one candidate setting.
        ///
        /// Every recognised field is listed; unknown keys are rejected by
        /// [`ScoringParams::set`], [`FromStr`] and serde.
        ///
        /// # Example
        ///
        /// ```rust
        /// use concord::ScoringParams;
        ///
        /// let params: ScoringParams = "title:15,entity_lambda:0.3".parse().unwrap();
        /// assert_eq!(params.title, 15.0);
        /// assert_eq!(params.abstract_, 5.0); // anchor default
        /// assert!("titel:15".parse::<ScoringParams>().is_err());
        /// ```
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct ScoringParams {
            $( $(#[$doc])* pub $field: f64, )+
        }

        impl Default for ScoringParams {
            fn default() -> Self {
                Self { $( $field: $default, )+ }
            }
        }

        impl ScoringParams {
            /// Recognised field names, in declaration order.
            pub const FIELDS: &'static [&'static str] = &[$( $key, )+];

            /// Set one field by name.
            ///
            /// # Errors
            ///
            /// [`AggregationError::UnknownParameter`] for an unrecognised name,
            /// [`AggregationError::InvalidParameter`] for a non-finite value.
            pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
                if !value.is_finite() {
                    return Err(AggregationError::InvalidParameter {
                        name: name.to_string(),
                        reason: format!("value must be finite, got {value}"),
                    });
                }
                let slot = self
                    .field_mut(name)
                    .ok_or_else(|| AggregationError::UnknownParameter(name.to_string()))?;
                *slot = value;
                Ok(())
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
                match name {
                    $( $key => Some(&mut self.$field), )+
                    _ => None,
                }
            }

            /// Read one field by name.
            #[must_use]
            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $( $key => Some(self.$field), )+
                    _ => None,
                }
            }
        }
    };
}

scoring_params! {
    /// Word match boost on the title field.
    title: "title" = 20.0,
    /// Word match boost on the abstract field (`abstract` is a reserved word).
    #[serde(rename = "abstract")]
    abstract_: "abstract" = 5.0,
    /// Word match boost on the keyphrase field.
    keyphrase: "keyphrase" = 16.0,
    /// Entity match boost on the annotated title.
    title_ana: "title_ana" = 20.0,
    /// Entity match boost on the annotated abstract.
    abstract_ana: "abstract_ana" = 5.0,
    /// Entity match boost on annotated keyphrases.
    keyphrase_ana: "keyphrase_ana" = 16.0,
    /// Entity match boost on the annotated body text.
    bodytext_ana: "bodytext_ana" = 1.0,
    /// Dirichlet smoothing for the title field.
    title_mu: "title_mu" = 1000.0,
    /// Dirichlet smoothing for the abstract field.
    abstract_mu: "abstract_mu" = 1100.0,
    keyphrase_mu: "keyphrase_mu" = 1000.0,
    title_ana_mu: "title_ana_mu" = 1000.0,
    abstract_ana_mu: "abstract_ana_mu" = 1000.0,
    keyphrase_ana_mu: "keyphrase_ana_mu" = 1000.0,
    bodytext_ana_mu: "bodytext_ana_mu" = 1000.0,
    /// Mix between entity space (1.0) and word space (0.0).
    entity_lambda: "entity_lambda" = 0.5,
    type_interaction: "type_interaction" = 1.0,
    /// Flags stored as 0.0 / 1.0.
    consider_entity_set: "consider_entity_set" = 1.0,
    consider_word_set: "consider_word_set" = 1.0,
    consider_type: "consider_type" = 1.0,
    word_dependency: "word_dependency" = 1.0,
}

impl FromStr for ScoringParams {
    type Err = AggregationError;

    /// Parse `"name:value,name:value"` over the anchor defaults.
    fn from_str(s: &str) -> Result<Self> {
        let mut params = Self::default();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once(':').ok_or_else(|| {
                AggregationError::InvalidParameter {
                    name: pair.to_string(),
                    reason: "expected `name:value`".to_string(),
                }
            })?;
            let name = name.trim();
            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|e| AggregationError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("{e}"),
                })?;
            params.set(name, value)?;
        }
        Ok(params)
    }
}

impl fmt::Display for ScoringParams {
    /// Render as `"name:value,..."` in field order; parses back losslessly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in Self::FIELDS.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}:{:?}", self.get(name).unwrap_or_default())?;
        }
        Ok(())
    }
}

/// Named axes of candidate values, expanded over an anchor setting.
///
/// # Example
///
/// ```rust
/// use concord::{ParamGrid, ScoringParams};
///
/// let grid = ParamGrid::new()
///     .axis("title", vec![5.0, 10.0])
///     .unwrap()
///     .axis("entity_lambda", vec![0.2, 0.5, 0.8])
///     .unwrap();
/// let candidates = grid.expand(&ScoringParams::default());
///
/// assert_eq!(candidates.len(), 6);
/// // Last axis varies fastest.
/// assert_eq!((candidates[1].title, candidates[1].entity_lambda), (5.0, 0.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    axes: Vec<(&'static str, Vec<f64>)>,
}

impl ParamGrid {
    /// Empty grid; expands to the anchor alone.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis.
    ///
    /// # Errors
    ///
    /// [`AggregationError::UnknownParameter`] for an unrecognised field,
    /// [`AggregationError::InvalidParameter`] for an empty or non-finite axis.
    pub fn axis(mut self, name: &str, values: Vec<f64>) -> Result<Self> {
        let field = ScoringParams::FIELDS
            .iter()
            .copied()
            .find(|f| *f == name)
            .ok_or_else(|| AggregationError::UnknownParameter(name.to_string()))?;
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return Err(AggregationError::InvalidParameter {
                name: name.to_string(),
                reason: "axis needs at least one finite value".to_string(),
            });
        }
        self.axes.push((field, values));
        Ok(self)
    }

    /// Number of candidates [`expand`](Self::expand) produces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.axes.iter().map(|(_, v)| v.len()).product()
    }

    /// True if the grid expands to nothing. Never true: an empty grid is the anchor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of all axes applied over `anchor`.
    ///
    /// The last axis varies fastest.
    #[must_use]
    pub fn expand(&self, anchor: &ScoringParams) -> Vec<ScoringParams> {
        let total = self.len();
        let mut out = Vec::with_capacity(total);
        let mut digits = vec![0usize; self.axes.len()];
        for _ in 0..total {
            let mut params = *anchor;
            for ((name, values), &d) in self.axes.iter().zip(&digits) {
                // Names and values were checked in `axis`.
                if let Some(slot) = params.field_mut(name) {
                    *slot = values[d];
                }
            }
            out.push(params);

            for (digit, (_, values)) in digits.iter_mut().zip(&self.axes).rev() {
                *digit += 1;
                if *digit < values.len() {
                    break;
                }
                *digit = 0;
            }
        }
        out
    }
}
