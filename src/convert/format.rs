//! Numeric formatting of raw values
//!
//! Raw device numbers are often in a different unit than the published
//! variable (seconds vs hours, tenths of a volt). A [`Formatter`] applies a
//! multiplier/divisor pair and prints with a fixed precision; backward
//! parsing undoes the scaling.

use super::InvalidValue;
use serde::{Deserialize, Serialize};

fn unit() -> f64 {
    1.0
}

/// Scaling and precision applied when no converter produced a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    /// `raw * multiplier / divisor`, printed with `precision` decimals
    Scaled {
        #[serde(default = "unit")]
        multiplier: f64,
        #[serde(default = "unit")]
        divisor: f64,
        #[serde(default)]
        precision: usize,
    },
    /// Like `Scaled`, negative results are published as zero
    #[serde(rename = "clamped")]
    ClampedScaled {
        #[serde(default = "unit")]
        multiplier: f64,
        #[serde(default = "unit")]
        divisor: f64,
        #[serde(default)]
        precision: usize,
    },
    /// Raw value printed as-is
    PassThrough,
    /// Fixed text (command payloads and defaults of absent variables)
    Literal(String),
}

impl Formatter {
    /// No scaling, `precision` decimals
    pub fn fixed(precision: usize) -> Self {
        Formatter::Scaled {
            multiplier: 1.0,
            divisor: 1.0,
            precision,
        }
    }

    pub fn divided(divisor: f64, precision: usize) -> Self {
        Formatter::Scaled {
            multiplier: 1.0,
            divisor,
            precision,
        }
    }

    pub fn multiplied(multiplier: f64, precision: usize) -> Self {
        Formatter::Scaled {
            multiplier,
            divisor: 1.0,
            precision,
        }
    }

    pub fn clamped(divisor: f64, precision: usize) -> Self {
        Formatter::ClampedScaled {
            multiplier: 1.0,
            divisor,
            precision,
        }
    }

    pub fn literal<S: Into<String>>(text: S) -> Self {
        Formatter::Literal(text.into())
    }

    /// Literal payload, if this formatter carries one
    pub fn literal_text(&self) -> Option<&str> {
        match self {
            Formatter::Literal(text) => Some(text),
            _ => None,
        }
    }

    pub fn format(&self, raw: f64) -> String {
        match self {
            Formatter::Scaled {
                multiplier,
                divisor,
                precision,
            } => format!("{:.*}", *precision, raw * multiplier / divisor),
            Formatter::ClampedScaled {
                multiplier,
                divisor,
                precision,
            } => {
                let value = (raw * multiplier / divisor).max(0.0);
                format!("{:.*}", *precision, value)
            }
            Formatter::PassThrough => format!("{}", raw),
            Formatter::Literal(text) => text.clone(),
        }
    }

    /// Parse a label back into a raw value
    pub fn parse(&self, label: &str) -> Result<f64, InvalidValue> {
        let text = match self {
            Formatter::Literal(text) => text.as_str(),
            _ => label,
        };
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|_| InvalidValue::not_a_number(label))?;
        if !value.is_finite() {
            return Err(InvalidValue::not_a_number(label));
        }
        let raw = match self {
            Formatter::Scaled {
                multiplier,
                divisor,
                ..
            }
            | Formatter::ClampedScaled {
                multiplier,
                divisor,
                ..
            } => value * divisor / multiplier,
            Formatter::PassThrough | Formatter::Literal(_) => value,
        };
        // a zero factor in a mapping file must not reach the device
        if !raw.is_finite() {
            return Err(InvalidValue::not_a_number(label));
        }
        Ok(raw)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::fixed(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_formats_with_precision() {
        assert_eq!(Formatter::divided(3600.0, 2).format(7200.0), "2.00");
        assert_eq!(Formatter::fixed(1).format(229.96), "230.0");
        assert_eq!(Formatter::multiplied(100.0, 0).format(0.42), "42");
    }

    #[test]
    fn clamped_floors_negative_results() {
        assert_eq!(Formatter::clamped(1.0, 0).format(-3.0), "0");
        assert_eq!(Formatter::clamped(10.0, 1).format(125.0), "12.5");
    }

    #[test]
    fn pass_through_keeps_raw_digits() {
        assert_eq!(Formatter::PassThrough.format(12.25), "12.25");
    }

    #[test]
    fn parse_inverts_scaling() {
        assert_eq!(Formatter::divided(3600.0, 2).parse("2.00"), Ok(7200.0));
        assert_eq!(Formatter::fixed(0).parse(" 30 "), Ok(30.0));
        assert!(Formatter::fixed(0).parse("soon").is_err());
        assert!(Formatter::fixed(0).parse("NaN").is_err());
    }

    #[test]
    fn zero_scale_factors_reject_writes() {
        let no_multiplier = Formatter::Scaled {
            multiplier: 0.0,
            divisor: 1.0,
            precision: 0,
        };
        assert_eq!(no_multiplier.parse("5"), Err(InvalidValue::not_a_number("5")));
        assert!(no_multiplier.parse("0").is_err());

        let no_divisor = Formatter::ClampedScaled {
            multiplier: 0.0,
            divisor: 0.0,
            precision: 1,
        };
        assert!(no_divisor.parse("5").is_err());
    }

    #[test]
    fn literal_parses_its_own_payload() {
        let fmt = Formatter::literal("1");
        assert_eq!(fmt.format(99.0), "1");
        assert_eq!(fmt.parse("ignored"), Ok(1.0));
    }
}
