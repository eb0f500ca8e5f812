/*!
The owned CBOR data model shared by the decoder and the encoder.
*/

use alloc::{string::String, vec::Vec};
use core::{fmt, str::FromStr};
use thiserror::Error;

/// Sign of a [`BigInt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    Negative,
}

/// An integer held as a sign and a big-endian magnitude.
///
/// The magnitude never carries leading zero bytes, and zero is always
/// [`Sign::Positive`], so two `BigInt`s compare equal exactly when their
/// numeric values do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInt {
    sign: Sign,
    magnitude: Vec<u8>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid decimal integer")]
pub struct ParseBigIntError;

impl BigInt {
    pub fn new<M>(sign: Sign, magnitude: M) -> Self
    where
        M: Into<Vec<u8>>,
    {
        let mut magnitude = magnitude.into();
        let zeros = magnitude.iter().take_while(|b| **b == 0).count();
        magnitude.drain(..zeros);
        Self {
            sign: if magnitude.is_empty() {
                Sign::Positive
            } else {
                sign
            },
            magnitude,
        }
    }

    pub fn from_i128(value: i128) -> Self {
        Self::new(
            if value < 0 {
                Sign::Negative
            } else {
                Sign::Positive
            },
            value.unsigned_abs().to_be_bytes(),
        )
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// The absolute value, big-endian, without leading zero bytes.
    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative
    }

    pub fn to_i128(&self) -> Option<i128> {
        let magnitude = magnitude_to_u128(&self.magnitude)?;
        match self.sign {
            Sign::Positive => i128::try_from(magnitude).ok(),
            Sign::Negative if magnitude == i128::MIN.unsigned_abs() => Some(i128::MIN),
            Sign::Negative => i128::try_from(magnitude).ok().map(|m| -m),
        }
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }

        // Repeated division by 10, least significant digit first
        let mut remaining = self.magnitude.clone();
        let mut digits = Vec::new();
        while !remaining.is_empty() {
            let mut rem = 0u32;
            for b in remaining.iter_mut() {
                let cur = (rem << 8) | *b as u32;
                *b = (cur / 10) as u8;
                rem = cur % 10;
            }
            digits.push(b'0' + rem as u8);
            let zeros = remaining.iter().take_while(|b| **b == 0).count();
            remaining.drain(..zeros);
        }

        if self.is_negative() {
            f.write_str("-")?;
        }
        for d in digits.iter().rev() {
            write!(f, "{}", *d as char)?;
        }
        Ok(())
    }
}

impl FromStr for BigInt {
    type Err = ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sign, digits) = match s.as_bytes() {
            [b'-', rest @ ..] => (Sign::Negative, rest),
            [b'+', rest @ ..] => (Sign::Positive, rest),
            rest => (Sign::Positive, rest),
        };
        if digits.is_empty() {
            return Err(ParseBigIntError);
        }

        let mut magnitude: Vec<u8> = Vec::new();
        for d in digits {
            if !d.is_ascii_digit() {
                return Err(ParseBigIntError);
            }
            let mut carry = (d - b'0') as u32;
            for b in magnitude.iter_mut().rev() {
                let cur = *b as u32 * 10 + carry;
                *b = cur as u8;
                carry = cur >> 8;
            }
            if carry != 0 {
                magnitude.insert(0, carry as u8);
            }
        }
        Ok(Self::new(sign, magnitude))
    }
}

/// An unassigned CBOR simple value: 0..=19 or 32..=255.
///
/// 20..=23 are `false`, `true`, `null` and `undefined`, and 24..=31 are
/// reserved by the encoding itself, so neither range can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Simple(u8);

impl Simple {
    pub fn new(value: u8) -> Option<Self> {
        match value {
            20..=31 => None,
            _ => Some(Self(value)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// A decoded (or to-be-encoded) CBOR data item.
///
/// Maps keep their entries in encounter order, duplicates included.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UnsignedInt(u64),
    SignedInt(i64),
    BigInt(BigInt),
    Bool(bool),
    Null,
    Undefined,
    Simple(Simple),
    Float(f64),
    ByteString(Vec<u8>),
    TextString(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// The value `-1 - m` of a major type 1 item.
    pub(crate) fn negative(m: u64) -> Self {
        match i64::try_from(m) {
            Ok(m) => Value::SignedInt(-1 - m),
            Err(_) => Value::BigInt(BigInt::new(
                Sign::Negative,
                (m as u128 + 1).to_be_bytes(),
            )),
        }
    }

    /// The value carried by a tag 2 or tag 3 byte string, narrowed to a
    /// native integer where it fits.
    pub(crate) fn from_bignum(sign: Sign, encoded: &[u8]) -> Self {
        let encoded = strip_leading_zeros(encoded);
        match (sign, magnitude_to_u64(encoded)) {
            (Sign::Positive, Some(v)) => Value::UnsignedInt(v),
            (Sign::Negative, Some(m)) => Value::negative(m),
            (Sign::Positive, None) => Value::BigInt(BigInt::new(Sign::Positive, encoded)),
            (Sign::Negative, None) => {
                Value::BigInt(BigInt::new(Sign::Negative, magnitude_add_one(encoded)))
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::UnsignedInt(_) => "Unsigned Integer",
            Value::SignedInt(_) => "Signed Integer",
            Value::BigInt(_) => "Bignum",
            Value::Bool(_) => "Boolean",
            Value::Null => "Null",
            Value::Undefined => "Undefined",
            Value::Simple(_) => "Simple Value",
            Value::Float(_) => "Float",
            Value::ByteString(_) => "Byte String",
            Value::TextString(_) => "Text String",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UnsignedInt(v) => Some(*v),
            Value::SignedInt(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::UnsignedInt(v) => i64::try_from(*v).ok(),
            Value::SignedInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::UnsignedInt(v) => Some(*v as i128),
            Value::SignedInt(v) => Some(*v as i128),
            Value::BigInt(b) => b.to_i128(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::ByteString(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::TextString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up the first entry of a map whose key is the text string `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

macro_rules! impl_from_uint {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::UnsignedInt(value as u64)
                }
            }
        )*
    };
}

impl_from_uint!(u8, u16, u32, u64);

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    if value < 0 {
                        Value::SignedInt(value as i64)
                    } else {
                        Value::UnsignedInt(value as u64)
                    }
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64);

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        if let Ok(v) = u64::try_from(value) {
            Value::UnsignedInt(v)
        } else if let Ok(v) = i64::try_from(value) {
            Value::SignedInt(v)
        } else {
            Value::BigInt(BigInt::from_i128(value))
        }
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        match value.sign() {
            Sign::Positive => match magnitude_to_u64(value.magnitude()) {
                Some(v) => Value::UnsignedInt(v),
                None => Value::BigInt(value),
            },
            Sign::Negative => match magnitude_to_u64(value.magnitude()) {
                Some(v) if v <= i64::MIN.unsigned_abs() => {
                    Value::SignedInt(0i64.wrapping_sub_unsigned(v))
                }
                _ => Value::BigInt(value),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::TextString(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::TextString(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::ByteString(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::ByteString(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Vec<(Value, Value)>> for Value {
    fn from(value: Vec<(Value, Value)>) -> Self {
        Value::Map(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// RFC 8949 section 8 diagnostic notation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::UnsignedInt(v) => write!(f, "{v}"),
            Value::SignedInt(v) => write!(f, "{v}"),
            Value::BigInt(b) => write!(f, "{b}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
            Value::Undefined => f.write_str("undefined"),
            Value::Simple(s) => write!(f, "simple({})", s.get()),
            Value::Float(v) if v.is_nan() => f.write_str("NaN"),
            Value::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(v) => write!(f, "{v:?}"),
            Value::ByteString(b) => {
                f.write_str("h'")?;
                for b in b {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("'")
            }
            Value::TextString(s) => write_quoted(f, s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

pub(crate) fn strip_leading_zeros(magnitude: &[u8]) -> &[u8] {
    let zeros = magnitude.iter().take_while(|b| **b == 0).count();
    &magnitude[zeros..]
}

pub(crate) fn magnitude_to_u64(magnitude: &[u8]) -> Option<u64> {
    let magnitude = strip_leading_zeros(magnitude);
    if magnitude.len() > 8 {
        return None;
    }
    Some(magnitude.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

fn magnitude_to_u128(magnitude: &[u8]) -> Option<u128> {
    let magnitude = strip_leading_zeros(magnitude);
    if magnitude.len() > 16 {
        return None;
    }
    Some(magnitude.iter().fold(0u128, |acc, b| (acc << 8) | *b as u128))
}

pub(crate) fn magnitude_add_one(magnitude: &[u8]) -> Vec<u8> {
    let mut r = magnitude.to_vec();
    for b in r.iter_mut().rev() {
        let (v, overflow) = b.overflowing_add(1);
        *b = v;
        if !overflow {
            return r;
        }
    }
    r.insert(0, 1);
    r
}

/// `magnitude - 1`, for a non-zero magnitude.
pub(crate) fn magnitude_sub_one(magnitude: &[u8]) -> Vec<u8> {
    let mut r = magnitude.to_vec();
    for b in r.iter_mut().rev() {
        let (v, borrow) = b.overflowing_sub(1);
        *b = v;
        if !borrow {
            break;
        }
    }
    let zeros = r.iter().take_while(|b| **b == 0).count();
    r.drain(..zeros);
    r
}
