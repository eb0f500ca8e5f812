/*!
Compose command - convert various formats to CBOR
*/

use crate::io::{Input, Output};
use anyhow::Context;
use clap::Parser;
use credman_cbor::{BigInt, Decoder, Value};

/// Input format for compose command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum InputFormat {
    /// JSON format (lossy - no tags, byte strings or undefined)
    Json,
    /// Hex encoded CBOR, re-encoded in canonical form
    Hex,
}

/// Convert text formats to canonical CBOR binary
#[derive(Parser, Debug)]
#[command(
    about = "Convert text formats to CBOR binary",
    long_about = "Parse JSON, or hex encoded CBOR, and write its canonical CBOR encoding.\n\n\
                  JSON integers of any size are kept exactly, objects keep their key order."
)]
pub struct Command {
    /// Input format
    #[arg(
        long,
        default_value = "json",
        value_name = "FORMAT",
        help = "Input format: json, hex"
    )]
    format: InputFormat,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input file (use '-' for stdin)
    input: Input,
}

impl Command {
    pub fn exec(self, decoder: &Decoder) -> anyhow::Result<()> {
        let input_text = self.input.read_to_string()?;

        let value = match self.format {
            InputFormat::Json => {
                let json_value: serde_json::Value =
                    serde_json::from_str(&input_text).context("Failed to parse JSON")?;
                json_to_value(&json_value)?
            }
            InputFormat::Hex => {
                let data: String = input_text
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                decoder
                    .decode(&hex::decode(data).context("Invalid hex input")?)
                    .context("Failed to decode CBOR")?
            }
        };

        let output = self.output.unwrap_or(Output::Stdout);
        output.write_all(&credman_cbor::encode(&value))?;
        Ok(())
    }
}

/// Convert a JSON value to a CBOR value
///
/// Numbers are taken from their exact text, so integers narrow the same
/// way decoded ones do and anything beyond 64 bits becomes a bignum.
pub fn json_to_value(value: &serde_json::Value) -> anyhow::Result<Value> {
    use serde_json::Value as J;

    Ok(match value {
        J::Null => Value::Null,
        J::Bool(b) => Value::Bool(*b),
        J::Number(n) => {
            let text = n.to_string();
            if text.contains(['.', 'e', 'E']) {
                Value::Float(
                    text.parse::<f64>()
                        .with_context(|| format!("Invalid JSON number: {text}"))?,
                )
            } else {
                Value::from(
                    text.parse::<BigInt>()
                        .with_context(|| format!("Invalid JSON number: {text}"))?,
                )
            }
        }
        J::String(s) => Value::TextString(s.clone()),
        J::Array(arr) => Value::Array(arr.iter().map(json_to_value).collect::<Result<_, _>>()?),
        J::Object(obj) => {
            let mut pairs = Vec::with_capacity(obj.len());
            for (key, val) in obj {
                pairs.push((Value::TextString(key.clone()), json_to_value(val)?));
            }
            Value::Map(pairs)
        }
    })
}
