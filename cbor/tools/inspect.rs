/*!
Inspect command - display CBOR data in various formats
*/

use super::io::{Input, Output};
use anyhow::Context;
use base64::prelude::*;
use clap::Parser;
use credman_cbor::{Decoder, Value};
use tracing::info;

/// Inspect and display CBOR data
#[derive(Parser, Debug)]
#[command(about = "Inspect and display CBOR information", long_about = None)]
pub struct Command {
    /// Output format
    #[arg(
        long,
        default_value = "diag",
        value_name = "FORMAT",
        help = "Output format: diag/diagnostic (human-readable), json (lossy), hex"
    )]
    format: OutputFormat,

    /// How the input bytes are written
    #[arg(
        long,
        default_value = "binary",
        value_name = "FORMAT",
        help = "Input format: binary, hex, base64 (standard or url-safe)"
    )]
    input_format: InputFormat,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input CBOR file (use '-' for stdin)
    input: Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// CBOR Diagnostic Notation
    #[value(alias = "diagnostic")]
    Diag,
    /// JSON format (lossy - byte strings become base64url, no undefined or simple values)
    Json,
    /// Hexadecimal dump
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    Binary,
    Hex,
    Base64,
}

impl InputFormat {
    pub fn read(self, input: &Input) -> anyhow::Result<Vec<u8>> {
        if self == InputFormat::Binary {
            return Ok(input.read_all()?);
        }

        let text: String = input
            .read_to_string()?
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        match self {
            InputFormat::Hex => hex::decode(&text).context("Invalid hex input"),
            _ => BASE64_STANDARD
                .decode(&text)
                .or_else(|_| BASE64_URL_SAFE_NO_PAD.decode(text.trim_end_matches('=')))
                .context("Invalid base64 input"),
        }
    }
}

impl Command {
    pub fn exec(self, decoder: &Decoder) -> anyhow::Result<()> {
        let cbor_bytes = self.input_format.read(&self.input)?;
        let decoded = decoder
            .decode_detail(&cbor_bytes)
            .with_context(|| format!("Failed to decode {}", self.input))?;

        info!(
            "Decoded {} bytes: {}, indefinite-length: {}, canonical: {}, exact: {}",
            decoded.len,
            decoded.value.type_name(),
            decoded.indefinite,
            decoded.canonical,
            decoded.exact
        );

        let output_text = match self.format {
            OutputFormat::Diag => decoded.value.to_string(),
            OutputFormat::Json => serde_json::to_string_pretty(&value_to_json(&decoded.value))?,
            OutputFormat::Hex => hex::encode(&cbor_bytes),
        };

        self.output
            .unwrap_or(Output::Stdout)
            .write_line(&output_text)?;
        Ok(())
    }
}

/// Convert a CBOR value to JSON (lossy)
fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as J;

    match value {
        Value::UnsignedInt(n) => J::from(*n),
        Value::SignedInt(n) => J::from(*n),
        // Decimal text is a valid JSON number of any size
        Value::BigInt(b) => b
            .to_string()
            .parse::<serde_json::Number>()
            .map_or(J::Null, J::Number),
        Value::Bool(b) => J::Bool(*b),
        // JSON has no undefined or simple values
        Value::Null | Value::Undefined | Value::Simple(_) => J::Null,
        // NaN and Infinity have no JSON form
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(J::Null, J::Number),
        Value::ByteString(b) => J::String(BASE64_URL_SAFE_NO_PAD.encode(b)),
        Value::TextString(s) => J::String(s.clone()),
        Value::Array(items) => J::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => J::Object(
            entries
                .iter()
                .map(|(k, v)| {
                    // In JSON, all keys must be strings
                    let key = match k {
                        Value::TextString(s) => s.clone(),
                        k => k.to_string(),
                    };
                    (key, value_to_json(v))
                })
                .collect(),
        ),
    }
}
