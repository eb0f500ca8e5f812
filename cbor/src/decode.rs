use super::decode_seq::Reader;
use super::value::Value;
use thiserror::Error;

/// Nesting limit used by [`Decoder::default`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

pub(crate) const TAG_POSITIVE_BIGNUM: u64 = 2;
pub(crate) const TAG_NEGATIVE_BIGNUM: u64 = 3;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Not enough data for encoded value")]
    UnexpectedEof,

    #[error("Reserved additional information value")]
    ReservedEncoding,

    #[error("Indefinite length not allowed for this major type")]
    InvalidIndefiniteLength,

    #[error("Chunked string contains an invalid chunk")]
    MalformedChunking,

    #[error("Map has a key with no value")]
    TruncatedMap,

    #[error("Break marker outside an indefinite-length item")]
    UnexpectedBreak,

    #[error("Text string is not valid UTF-8")]
    InvalidUtf8,

    #[error("Bignum tag does not wrap a definite-length byte string")]
    InvalidTaggedValue,

    #[error("Additional data after encoded value")]
    TrailingData,

    #[error("Maximum nesting depth exceeded")]
    DepthExceeded,

    #[error("Invalid simple value {0}")]
    InvalidSimpleValue(u8),
}

/// Decoder limits, loadable from a host application's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecodeOptions {
    /// The deepest permitted nesting of arrays, maps and tags.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The result of a detailed decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: Value,
    /// Number of bytes consumed.
    pub len: usize,
    /// An indefinite-length header was consumed somewhere in the item.
    pub indefinite: bool,
    /// Every header had a definite length and every integer or length
    /// argument used its shortest form.
    pub canonical: bool,
    /// The input is exactly what [`encode`](crate::encode::encode) emits for `value`.
    ///
    /// Implies `canonical`. Floats wider than needed, dropped tags and
    /// bignums that fit in 64 bits are canonical but not exact.
    pub exact: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode exactly one item occupying the whole of `data`.
    pub fn decode(&self, data: &[u8]) -> Result<Value, Error> {
        self.decode_detail(data).map(|d| d.value)
    }

    /// Decode one item from the front of `data`, returning the unconsumed remainder.
    pub fn decode_prefix<'a>(&self, data: &'a [u8]) -> Result<(Value, &'a [u8]), Error> {
        let d = Reader::new(data, self.options.max_depth).read_item()?;
        Ok((d.value, &data[d.len..]))
    }

    pub fn decode_detail(&self, data: &[u8]) -> Result<Decoded, Error> {
        let d = Reader::new(data, self.options.max_depth).read_item()?;
        if d.len != data.len() {
            return Err(Error::TrailingData);
        }
        Ok(d)
    }
}

pub fn decode(data: &[u8]) -> Result<Value, Error> {
    Decoder::default().decode(data)
}

pub fn decode_prefix(data: &[u8]) -> Result<(Value, &[u8]), Error> {
    Decoder::default().decode_prefix(data)
}

pub fn decode_detail(data: &[u8]) -> Result<Decoded, Error> {
    Decoder::default().decode_detail(data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Argument {
    Definite(u64),
    Indefinite,
}

/// Parse the argument that follows an initial byte with additional
/// information `minor`, returning it and the number of bytes it occupied.
pub(crate) fn parse_argument(minor: u8, data: &[u8]) -> Result<(Argument, usize), Error> {
    match minor {
        val if val < 24 => Ok((Argument::Definite(val as u64), 0)),
        24 => Ok((Argument::Definite(read_be::<1>(data)?[0] as u64), 1)),
        25 => Ok((
            Argument::Definite(u16::from_be_bytes(read_be(data)?) as u64),
            2,
        )),
        26 => Ok((
            Argument::Definite(u32::from_be_bytes(read_be(data)?) as u64),
            4,
        )),
        27 => Ok((Argument::Definite(u64::from_be_bytes(read_be(data)?)), 8)),
        28..=30 => Err(Error::ReservedEncoding),
        _ => Ok((Argument::Indefinite, 0)),
    }
}

/// True if `minor` is the smallest encoding able to carry `arg`.
pub(crate) fn is_shortest(minor: u8, arg: Argument) -> bool {
    match (minor, arg) {
        (24, Argument::Definite(v)) => v >= 24,
        (25, Argument::Definite(v)) => v > u8::MAX as u64,
        (26, Argument::Definite(v)) => v > u16::MAX as u64,
        (27, Argument::Definite(v)) => v > u32::MAX as u64,
        _ => true,
    }
}

fn read_be<const N: usize>(data: &[u8]) -> Result<[u8; N], Error> {
    data.get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(Error::UnexpectedEof)
}
