//! Decimal token amounts and fixed-point scaling

use alloy_primitives::U256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest power of ten that fits into 256 bits
const MAX_POW10: u64 = 77;

/// Exponents beyond this are printed in scientific notation
const MAX_EXPANDED_DIGITS: u64 = 96;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount {0} is negative")]
    Negative(String),

    #[error("amount {0:?} is not a decimal number")]
    Malformed(String),

    #[error("amount {0} does not fit into 256 bits after scaling")]
    Overflow(String),
}

/// Exact decimal quantity `mantissa * 10^exponent`, as read from a holder list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalAmount {
    negative: bool,
    mantissa: U256,
    exponent: i64,
}

impl DecimalAmount {
    /// Wraps an already scaled integer, e.g. to print a batch total in token units.
    pub fn from_base_units(value: U256, decimals: u8) -> Self {
        Self { negative: false, mantissa: value, exponent: -i64::from(decimals) }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Exact product, used for `tokenCount * unit amount` holder entries.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, AmountError> {
        let overflow = || AmountError::Overflow(format!("{self} * {other}"));
        let mantissa = self.mantissa.checked_mul(other.mantissa).ok_or_else(overflow)?;
        let exponent = self.exponent.checked_add(other.exponent).ok_or_else(overflow)?;

        Ok(Self {
            negative: (self.negative != other.negative) && !mantissa.is_zero(),
            mantissa,
            exponent,
        })
    }

    /// Converts to the token's smallest unit: `round(self * 10^decimals)`, half-up.
    pub fn to_base_units(&self, decimals: u8) -> Result<U256, AmountError> {
        if self.negative {
            return Err(AmountError::Negative(self.to_string()));
        }
        if self.mantissa.is_zero() {
            return Ok(U256::ZERO);
        }

        let shift = self
            .exponent
            .checked_add(i64::from(decimals))
            .ok_or_else(|| AmountError::Overflow(self.to_string()))?;

        if shift >= 0 {
            let factor = pow10(shift.unsigned_abs())
                .ok_or_else(|| AmountError::Overflow(self.to_string()))?;
            return self
                .mantissa
                .checked_mul(factor)
                .ok_or_else(|| AmountError::Overflow(self.to_string()));
        }

        // mantissa < 10^78, so anything shifted further right rounds to zero
        let Some(divisor) = pow10(shift.unsigned_abs()) else {
            return Ok(U256::ZERO);
        };
        let quotient = self.mantissa / divisor;
        let remainder = self.mantissa % divisor;

        if remainder >= divisor - remainder {
            Ok(quotient + U256::from(1))
        } else {
            Ok(quotient)
        }
    }
}

fn pow10(exp: u64) -> Option<U256> {
    if exp > MAX_POW10 {
        return None;
    }
    U256::from(10).checked_pow(U256::from(exp))
}

impl FromStr for DecimalAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AmountError::Malformed(s.to_string());
        let text = s.trim();

        let (negative, unsigned) = if let Some(rest) = text.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = text.strip_prefix('+') {
            (false, rest)
        } else {
            (false, text)
        };

        let (coefficient, exp) = match unsigned.find(|c| c == 'e' || c == 'E') {
            Some(idx) => {
                let exp: i64 = unsigned[idx + 1..].parse().map_err(|_| malformed())?;
                (&unsigned[..idx], exp)
            }
            None => (unsigned, 0),
        };

        let (int_part, frac_part) = coefficient.split_once('.').unwrap_or((coefficient, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        // zero padding never reaches the mantissa, it only moves the exponent
        let frac_part = frac_part.trim_end_matches('0');
        let digits = format!("{int_part}{frac_part}");
        let digits = digits.trim_start_matches('0');
        let significant = digits.trim_end_matches('0');

        let mantissa = if significant.is_empty() {
            U256::ZERO
        } else {
            significant
                .parse::<U256>()
                .map_err(|_| AmountError::Overflow(s.trim().to_string()))?
        };

        let frac_len = i64::try_from(frac_part.len()).map_err(|_| malformed())?;
        let trailing_zeros = i64::try_from(digits.len() - significant.len()).map_err(|_| malformed())?;
        let exponent = if mantissa.is_zero() {
            0
        } else {
            exp.checked_sub(frac_len)
                .and_then(|e| e.checked_add(trailing_zeros))
                .ok_or_else(malformed)?
        };

        Ok(Self {
            negative: negative && !mantissa.is_zero(),
            mantissa,
            exponent,
        })
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let digits = self.mantissa.to_string();

        if self.exponent.unsigned_abs() > MAX_EXPANDED_DIGITS {
            return write!(f, "{digits}e{}", self.exponent);
        }

        if self.exponent >= 0 {
            f.write_str(&digits)?;
            for _ in 0..self.exponent {
                f.write_str("0")?;
            }
            return Ok(());
        }

        let frac_len = self.exponent.unsigned_abs() as usize;
        if digits.len() > frac_len {
            let (int_part, frac_part) = digits.split_at(digits.len() - frac_len);
            write!(f, "{int_part}.{frac_part}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat(frac_len - digits.len()))
        }
    }
}

/// Parses a human-readable amount and scales it to `decimals` places.
pub fn scale_amount(text: &str, decimals: u8) -> Result<U256, AmountError> {
    text.parse::<DecimalAmount>()?.to_base_units(decimals)
}

/// Formats a scaled integer back into token units for logs.
pub fn format_base_units(value: U256, decimals: u8) -> String {
    DecimalAmount::from_base_units(value, decimals).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        s.parse().unwrap()
    }

    #[test]
    fn test_scale_fractional_ether() {
        assert_eq!(scale_amount("2.5", 18).unwrap(), wei("2500000000000000000"));
        assert_eq!(scale_amount("1.0", 18).unwrap(), wei("1000000000000000000"));
        assert_eq!(scale_amount("0.0000115740741", 18).unwrap(), wei("11574074100000"));
    }

    #[test]
    fn test_scale_integer_and_zero_decimals() {
        assert_eq!(scale_amount("10000", 18).unwrap(), wei("10000000000000000000000"));
        assert_eq!(scale_amount("42", 0).unwrap(), U256::from(42));
        assert_eq!(scale_amount("0", 18).unwrap(), U256::ZERO);
        assert_eq!(scale_amount("-0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_scale_rounds_half_up() {
        assert_eq!(scale_amount("1.25", 1).unwrap(), U256::from(13));
        assert_eq!(scale_amount("1.24", 1).unwrap(), U256::from(12));
        assert_eq!(scale_amount("0.5", 0).unwrap(), U256::from(1));
        assert_eq!(scale_amount("0.49", 0).unwrap(), U256::ZERO);
        assert_eq!(scale_amount("1e-100", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_scale_exponent_notation() {
        assert_eq!(scale_amount("1e21", 0).unwrap(), wei("1000000000000000000000"));
        assert_eq!(scale_amount("2.5E-1", 2).unwrap(), U256::from(25));
        assert_eq!(scale_amount("+3", 2).unwrap(), U256::from(300));
    }

    #[test]
    fn test_scale_rejects_negative() {
        assert_eq!(scale_amount("-1", 18), Err(AmountError::Negative("-1".to_string())));
        assert!(matches!(scale_amount("-0.001", 18), Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_scale_rejects_malformed() {
        for bad in ["", "abc", "1.2.3", "0x10", ".", "1e", "1_000", "--1", "1 000"] {
            assert!(
                matches!(scale_amount(bad, 18), Err(AmountError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_scale_rejects_overflow() {
        assert!(matches!(scale_amount("1e60", 18), Err(AmountError::Overflow(_))));
        let huge = "9".repeat(80);
        assert!(matches!(scale_amount(&huge, 0), Err(AmountError::Overflow(_))));
        assert!(matches!(scale_amount("1e9223372036854775807", 18), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn test_scale_ignores_zero_padding() {
        let padded = format!("1.{}", "0".repeat(80));
        assert_eq!(scale_amount(&padded, 18).unwrap(), wei("1000000000000000000"));

        let padded = format!("0.5{}", "0".repeat(100));
        assert_eq!(scale_amount(&padded, 1).unwrap(), U256::from(5));

        let long_integer = format!("1{}", "0".repeat(79));
        assert_eq!(scale_amount(&format!("{long_integer}e-70"), 0).unwrap(), wei("1000000000"));
        assert!(matches!(scale_amount(&long_integer, 0), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn test_checked_mul_holder_units() {
        let count: DecimalAmount = "3".parse().unwrap();
        let unit: DecimalAmount = "0.5".parse().unwrap();
        let product = count.checked_mul(&unit).unwrap();
        assert_eq!(product.to_string(), "1.5");
        assert_eq!(product.to_base_units(18).unwrap(), wei("1500000000000000000"));

        let negative: DecimalAmount = "-2".parse().unwrap();
        assert!(negative.checked_mul(&unit).unwrap().is_negative());
    }

    #[test]
    fn test_display() {
        assert_eq!("2.50".parse::<DecimalAmount>().unwrap().to_string(), "2.5");
        assert_eq!("1.000".parse::<DecimalAmount>().unwrap().to_string(), "1");
        assert_eq!("0.001".parse::<DecimalAmount>().unwrap().to_string(), "0.001");
        assert_eq!("12e3".parse::<DecimalAmount>().unwrap().to_string(), "12000");
        assert_eq!(format_base_units(wei("3500000000000000000"), 18), "3.500000000000000000");
        assert_eq!(format_base_units(U256::from(5), 3), "0.005");
    }
}
