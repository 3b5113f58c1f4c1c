use std::fmt;
use std::ops::Range;

use crate::errors::FlipError;
use crate::types::Mode;
use rust_decimal::Decimal;

/// One occurrence of the balance tag's value inside a file.
///
/// `start..end` is a byte range into the content the field was located in,
/// already trimmed of surrounding whitespace, so `&content[start..end] == raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceField {
    pub tag: String,
    pub start: usize,
    pub end: usize,
    pub raw: String,
}

impl BalanceField {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

/// A parsed balance that remembers its exact magnitude text.
///
/// Serializing with `Display` gives back the sign character (if any) followed
/// by the magnitude exactly as it was read, so no float formatting ever leaks
/// into the file. Any number of digits is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAmount {
    sign: Sign,
    explicit_sign: bool,
    magnitude: String,
    zero: bool,
}

impl SignedAmount {
    /// Parses `[+-]digits[(.|,)digits]`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let (sign, explicit_sign, magnitude) = match text.as_bytes().first()? {
            b'-' => (Sign::Negative, true, &text[1..]),
            b'+' => (Sign::Positive, true, &text[1..]),
            _ => (Sign::Positive, false, text),
        };

        let mut has_digits = false;
        let mut has_separator = false;
        let mut zero = true;
        for c in magnitude.chars() {
            match c {
                '0'..='9' => {
                    has_digits = true;
                    zero &= c == '0';
                }
                '.' | ',' if !has_separator => has_separator = true,
                _ => return None,
            }
        }

        if !has_digits {
            return None;
        }

        Some(Self {
            sign,
            explicit_sign,
            magnitude: magnitude.to_string(),
            zero,
        })
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn magnitude(&self) -> &str {
        &self.magnitude
    }

    pub fn is_zero(&self) -> bool {
        self.zero
    }

    /// The exact value, or `None` when it does not fit a `Decimal`
    /// (more than 28 fractional digits, or a mantissa of 2^96 and up).
    pub fn value(&self) -> Option<Decimal> {
        let mut digits = String::with_capacity(self.magnitude.len());
        let mut scale = 0;
        let mut fractional = false;
        for c in self.magnitude.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                if fractional {
                    scale += 1;
                }
            } else {
                fractional = true;
            }
        }

        let mantissa: i128 = digits.parse().ok()?;
        let value = Decimal::try_from_i128_with_scale(mantissa, scale).ok()?;
        match self.sign {
            Sign::Negative if !self.zero => Some(-value),
            _ => Some(value),
        }
    }

    /// Returns the amount with its sign forced according to `mode`.
    ///
    /// Zero is always unsigned. An explicit `+` survives `Undo` but is
    /// replaced by `-` under `Flip`.
    pub fn with_mode(&self, mode: Mode) -> Self {
        let (sign, explicit_sign) = match mode {
            _ if self.zero => (Sign::Positive, false),
            Mode::Flip => (Sign::Negative, true),
            Mode::Undo if self.sign == Sign::Negative => (Sign::Positive, false),
            Mode::Undo => (self.sign, self.explicit_sign),
        };

        Self {
            sign,
            explicit_sign,
            magnitude: self.magnitude.clone(),
            zero: self.zero,
        }
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.sign, self.explicit_sign) {
            (Sign::Negative, _) => write!(f, "-{}", self.magnitude),
            (Sign::Positive, true) => write!(f, "+{}", self.magnitude),
            (Sign::Positive, false) => f.write_str(&self.magnitude),
        }
    }
}

impl TryFrom<&BalanceField> for SignedAmount {
    type Error = FlipError;

    fn try_from(field: &BalanceField) -> Result<Self, Self::Error> {
        Self::parse(&field.raw).ok_or_else(|| FlipError::MalformedValue {
            tag: field.tag.clone(),
            value: field.raw.clone(),
            offset: field.start,
        })
    }
}
