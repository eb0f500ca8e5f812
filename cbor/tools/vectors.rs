/*!
Vectors command - run a JSON file of test vectors through the codec
*/

use crate::compose::json_to_value;
use crate::io::Input;
use anyhow::Context;
use base64::prelude::*;
use clap::Parser;
use credman_cbor::Decoder;
use serde::Deserialize;
use tracing::{debug, warn};

/// Check the decoder and encoder against conformance vectors
#[derive(Parser, Debug)]
#[command(
    about = "Run conformance vectors through the decoder and encoder",
    long_about = "Reads a JSON array of {cbor, hex, roundtrip, decoded | diagnostic} objects.\n\n\
                  Every vector must decode, `decoded` must match the value, and vectors\n\
                  flagged `roundtrip` must re-encode to exactly the same bytes."
)]
pub struct Command {
    /// Vector file (use '-' for stdin)
    file: Input,
}

#[derive(Deserialize, Debug)]
struct Vector {
    /// Base64 of the encoded item
    cbor: String,
    hex: String,
    roundtrip: bool,
    #[serde(default)]
    decoded: Option<serde_json::Value>,
    #[serde(default)]
    diagnostic: Option<String>,
}

#[derive(Debug, Default)]
struct Summary {
    passed: usize,
    failed: usize,
    /// Vectors with only a diagnostic form, which is not compared
    unchecked: usize,
}

impl Command {
    pub fn exec(self, decoder: &Decoder) -> anyhow::Result<()> {
        let vectors: Vec<Vector> = serde_json::from_str(&self.file.read_to_string()?)
            .with_context(|| format!("Failed to parse vectors from {}", self.file))?;

        let mut summary = Summary::default();
        for (i, vector) in vectors.iter().enumerate() {
            match check(decoder, vector) {
                Ok(true) => summary.passed += 1,
                Ok(false) => summary.unchecked += 1,
                Err(e) => {
                    warn!("Vector {i} ({}) failed: {e:#}", vector.hex);
                    summary.failed += 1;
                }
            }
        }

        println!(
            "{} vectors: {} passed, {} failed, {} value not checked",
            vectors.len(),
            summary.passed,
            summary.failed,
            summary.unchecked
        );
        if summary.failed != 0 {
            anyhow::bail!("{} of {} vectors failed", summary.failed, vectors.len());
        }
        Ok(())
    }
}

/// Returns false if the vector decoded but had no `decoded` value to compare.
fn check(decoder: &Decoder, vector: &Vector) -> anyhow::Result<bool> {
    let data = BASE64_STANDARD
        .decode(&vector.cbor)
        .context("Invalid base64 in 'cbor'")?;
    if hex::encode(&data) != vector.hex.to_ascii_lowercase() {
        anyhow::bail!("'cbor' and 'hex' disagree");
    }

    let decoded = decoder.decode_detail(&data).context("Decode failed")?;
    debug!(
        "{} => {} (indefinite-length: {}, canonical: {}, exact: {})",
        vector.hex, decoded.value, decoded.indefinite, decoded.canonical, decoded.exact
    );

    if vector.roundtrip {
        let encoded = credman_cbor::encode(&decoded.value);
        if encoded != data {
            anyhow::bail!("Re-encoded as {}", hex::encode(encoded));
        }
    }

    match (&vector.decoded, &vector.diagnostic) {
        (Some(json), _) => {
            let expected = json_to_value(json)?;
            if expected != decoded.value {
                anyhow::bail!("Decoded {}, expected {expected}", decoded.value);
            }
            Ok(true)
        }
        (None, Some(diagnostic)) => {
            debug!("{} has diagnostic {diagnostic} only", vector.hex);
            Ok(false)
        }
        (None, None) => Ok(false),
    }
}
