/*!
CBOR Tools - A CLI for working with credential-manager CBOR payloads

# Commands

- `inspect`: Decode CBOR and display it as diagnostic notation, JSON or hex
- `compose`: Convert JSON (or hex CBOR) to canonical CBOR binary
- `vectors`: Run a JSON file of conformance vectors through the codec

# Examples

```bash
# Inspect an attestation object (diagnostic notation)
cbor inspect attestation.cbor

# Inspect base64url text copied out of a WebAuthn response
cbor inspect --input-format base64 response.txt

# Inspect as JSON (lossy)
cbor inspect --format json data.cbor

# Convert JSON to CBOR
echo '{"fmt": "none", "attStmt": {}}' | cbor compose -o data.cbor

# Re-encode hex CBOR in canonical form
echo '9f018202039f0405ffff' | cbor compose --format hex - | cbor inspect --format hex -

# Run the conformance vectors
cbor vectors cbor/tests/vectors.json
```
*/

use clap::{Parser, Subcommand};
use credman_cbor::decode::{DEFAULT_MAX_DEPTH, Decoder};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

mod compose;
mod inspect;
mod io;
mod vectors;

/// A CLI tool for working with CBOR data
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A CLI tool for inspecting and composing CBOR data",
    long_about = "CBOR Tools decodes, inspects and encodes RFC 8949 CBOR, as carried in\n\
                  WebAuthn attestation objects and credential-manager responses.\n\n\
                  Features:\n\
                  - Inspect CBOR data in human-readable formats\n\
                  - Build canonical CBOR from JSON\n\
                  - Check the codec against a JSON file of test vectors"
)]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    log_level: tracing::Level,

    /// Maximum nesting depth accepted by the decoder
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH, value_name = "N")]
    max_depth: usize,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect and display CBOR data in various formats
    Inspect(inspect::Command),

    /// Convert JSON or hex to canonical CBOR binary
    Compose(compose::Command),

    /// Run conformance vectors through the decoder and encoder
    Vectors(vectors::Command),
}

fn init_logger(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let decoder = Decoder::new().with_max_depth(cli.max_depth);
    match cli.command {
        Commands::Inspect(args) => args.exec(&decoder),
        Commands::Compose(args) => args.exec(&decoder),
        Commands::Vectors(args) => args.exec(&decoder),
    }
}
