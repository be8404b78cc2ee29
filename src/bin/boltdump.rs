//! boltdump - decode a captured Bolt client stream
//!
//! Usage:
//!   boltdump capture.bin [--protocol-version 1|2] [--config boltdump.json] [--max-depth N]
//!   boltdump - < capture.bin
//!
//! Input is the client side of a connection after the handshake: chunked
//! request messages. Each request is printed as one JSON line on stdout.
//! Auth token credentials are redacted. Logs go to stderr (`RUST_LOG`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use boltwire::framing::read_message;
use boltwire::{
    PackStreamUnpacker, PlainValue, ProtocolVersion, Request, RequestMessageReader, UnpackerConfig,
};

const REDACTED: &str = "******";

#[derive(Parser, Debug)]
#[command(name = "boltdump")]
#[command(about = "Decode Bolt request messages from a captured client stream")]
#[command(version)]
struct Args {
    /// Capture file, or `-` for stdin
    input: PathBuf,

    /// Bolt protocol version of the connection (overrides config)
    #[arg(long, value_parser = parse_version)]
    protocol_version: Option<ProtocolVersion>,

    /// JSON decoder config (protocolVersion, maxDepth, maxValueSize)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum value nesting (overrides config)
    #[arg(long)]
    max_depth: Option<usize>,
}

fn parse_version(s: &str) -> Result<ProtocolVersion, String> {
    let v: u32 = s.parse().map_err(|_| format!("not a version number: {}", s))?;
    ProtocolVersion::try_from(v)
}

impl Args {
    fn unpacker_config(&self) -> anyhow::Result<UnpackerConfig> {
        let mut config = match &self.config {
            Some(path) => UnpackerConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => UnpackerConfig::default(),
        };
        if let Some(version) = self.protocol_version {
            config = config.with_protocol_version(version);
        }
        if let Some(depth) = self.max_depth {
            config = config.with_max_depth(depth);
        }
        Ok(config)
    }
}

/// Replace secrets in a request before it is printed.
fn redact(mut request: Request) -> Request {
    if let Request::Init { auth_token, .. } = &mut request {
        if let Some(credentials) = auth_token.get_mut("credentials") {
            *credentials = PlainValue::from(REDACTED);
        }
    }
    request
}

/// Decode every message in `input`, writing one JSON line per request.
/// Returns the number of requests written.
fn dump<R: Read, W: Write>(input: &mut R, output: &mut W, config: &UnpackerConfig) -> anyhow::Result<usize> {
    let mut count = 0;

    while let Some(frame) = read_message(input).context("Failed to read message frame")? {
        let mut reader = RequestMessageReader::new(PackStreamUnpacker::with_config(&frame[..], config.clone()));

        let request = match reader.read_request() {
            Ok(request) => request,
            Err(e) => {
                let line = serde_json::json!({ "error": e.code(), "message": e.to_string() });
                writeln!(output, "{}", line)?;
                bail!("Message {} rejected: {}", count + 1, e);
            }
        };

        let trailing = reader.unpacker().get_ref().len();
        if trailing > 0 {
            warn!(message = count + 1, trailing, "Trailing bytes after request");
        }

        debug!(message = count + 1, kind = %request.kind(), "Decoded request");
        serde_json::to_writer(&mut *output, &redact(request))?;
        writeln!(output)?;
        count += 1;
    }

    output.flush()?;
    Ok(count)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.unpacker_config()?;
    info!(
        protocol_version = config.protocol_version.as_u32(),
        max_depth = config.max_depth,
        "Decoding {}",
        args.input.display()
    );

    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());

    let count = if args.input.as_os_str() == "-" {
        dump(&mut io::stdin().lock(), &mut output, &config)?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("Failed to open {}", args.input.display()))?;
        dump(&mut BufReader::new(file), &mut output, &config)?
    };

    info!("Decoded {} requests", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boltwire::framing::write_message;
    use std::io::Seek;

    fn pack_str(s: &str) -> Vec<u8> {
        assert!(s.len() < 16);
        let mut out = vec![0x80 | s.len() as u8];
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn init_message() -> Vec<u8> {
        let mut msg = vec![0xB2, 0x01];
        msg.extend(pack_str("test-client"));
        msg.push(0xA3);
        for (k, v) in [("scheme", "basic"), ("principal", "neo4j"), ("credentials", "secret")] {
            msg.extend(pack_str(k));
            msg.extend(pack_str(v));
        }
        msg
    }

    fn run_message() -> Vec<u8> {
        let mut msg = vec![0xB2, 0x10];
        msg.extend(pack_str("RETURN $x"));
        msg.push(0xA1);
        msg.extend(pack_str("x"));
        msg.push(0x01);
        msg
    }

    fn lines(output: &[u8]) -> Vec<serde_json::Value> {
        std::str::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_dump_capture_file() {
        let mut file = tempfile::tempfile().unwrap();
        write_message(&mut file, &init_message()).unwrap();
        write_message(&mut file, &run_message()).unwrap();
        write_message(&mut file, &[0xB0, 0x3F]).unwrap();
        file.rewind().unwrap();

        let mut output: Vec<u8> = Vec::new();
        let count = dump(&mut file, &mut output, &UnpackerConfig::default()).unwrap();
        assert_eq!(count, 3);

        let lines = lines(&output);
        assert_eq!(lines[0]["type"], "INIT");
        assert_eq!(lines[0]["client_name"], "test-client");
        assert_eq!(lines[0]["auth_token"]["principal"], "neo4j");
        assert_eq!(lines[0]["auth_token"]["credentials"], REDACTED);
        assert_eq!(lines[1], serde_json::json!({"type": "RUN", "statement": "RETURN $x", "parameters": {"x": 1}}));
        assert_eq!(lines[2], serde_json::json!({"type": "PULL_ALL"}));
    }

    #[test]
    fn test_dump_stops_at_rejected_message() {
        let mut capture: Vec<u8> = Vec::new();
        write_message(&mut capture, &[0xB0, 0x0F]).unwrap();
        write_message(&mut capture, &[0xB0, 0x7F]).unwrap();
        write_message(&mut capture, &[0xB0, 0x3F]).unwrap();

        let mut output: Vec<u8> = Vec::new();
        let err = dump(&mut &capture[..], &mut output, &UnpackerConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Message 2 rejected"));

        let lines = lines(&output);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "RESET");
        assert_eq!(lines[1]["error"], "Neo.ClientError.Request.Invalid");
    }

    #[test]
    fn test_config_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boltdump.json");
        std::fs::write(&path, r#"{"protocolVersion": 1, "maxDepth": 8}"#).unwrap();

        let args = Args::parse_from(["boltdump", "capture.bin", "--config", path.to_str().unwrap()]);
        let config = args.unpacker_config().unwrap();
        assert_eq!(config.protocol_version, ProtocolVersion::V1);
        assert_eq!(config.max_depth, 8);

        let args = Args::parse_from([
            "boltdump",
            "capture.bin",
            "--config",
            path.to_str().unwrap(),
            "--protocol-version",
            "2",
            "--max-depth",
            "3",
        ]);
        let config = args.unpacker_config().unwrap();
        assert_eq!(config.protocol_version, ProtocolVersion::V2);
        assert_eq!(config.max_depth, 3);
    }

    #[test]
    fn test_rejects_unknown_protocol_version() {
        assert!(Args::try_parse_from(["boltdump", "x", "--protocol-version", "3"]).is_err());
    }
}
