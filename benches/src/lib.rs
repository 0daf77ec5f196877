//! Fixture generation for eddn-replay benchmarks.

use bzip2::Compression;
use bzip2::write::BzEncoder;
use chrono::{Duration, NaiveDate};
use std::io::Write;

/// A compressed archive and what it contains.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// bzip2 compressed JSONL.
    pub compressed: Vec<u8>,
    /// Size of the uncompressed JSONL in bytes.
    pub raw_bytes: u64,
    /// Number of records.
    pub records: u64,
}

/// Builds one synthetic FSDJump record for `day`, numbered `n`.
///
/// Records are shaped like archive entries so that line lengths and
/// compression ratios are realistic.
pub fn fsd_jump_record(day: NaiveDate, n: u64) -> String {
    let seconds = i64::try_from(n % 86_400).unwrap_or_default();
    let timestamp = day
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight + Duration::seconds(seconds))
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string())
        .unwrap_or_default();

    serde_json::json!({
        "$schemaRef": "https://eddn.edcd.io/schemas/journal/1",
        "header": {
            "gatewayTimestamp": timestamp,
            "softwareName": "E:D Market Connector [Windows]",
            "softwareVersion": "5.12.1",
            "uploaderID": format!("{:016x}", n.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        },
        "message": {
            "event": "FSDJump",
            "StarSystem": format!("Synuefe {} {}", (b'A' + (n % 26) as u8) as char, n % 1000),
            "SystemAddress": 1_000_000 + n,
            "StarPos": [n as f64 * 0.5, -12.25, 48.0 - (n % 97) as f64],
            "Population": n * 1_337,
            "SystemAllegiance": "Federation",
            "SystemEconomy": "$economy_Industrial;",
            "SystemGovernment": "$government_Democracy;",
            "SystemSecurity": "$SYSTEM_SECURITY_medium;",
            "timestamp": timestamp,
        }
    })
    .to_string()
}

/// Builds a compressed archive of `records` records for `day`.
///
/// # Panics
///
/// Panics if the encoder fails.
pub fn archive(day: NaiveDate, records: u64) -> Fixture {
    let mut raw = Vec::new();
    for n in 0..records {
        raw.extend_from_slice(fsd_jump_record(day, n).as_bytes());
        raw.push(b'\n');
    }

    let mut encoder = BzEncoder::new(Vec::with_capacity(raw.len() / 8), Compression::default());
    encoder
        .write_all(&raw)
        .expect("Failed to compress fixture");
    let compressed = encoder.finish().expect("Failed to finish fixture stream");

    Fixture {
        compressed,
        raw_bytes: raw.len() as u64,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_single_line_json() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let record = fsd_jump_record(day, 42);
        assert!(!record.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&record).unwrap();
        assert_eq!(
            value["header"]["gatewayTimestamp"],
            "2025-01-02T00:00:42.000000Z"
        );
    }

    #[test]
    fn test_archive_fixture() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let fixture = archive(day, 100);
        assert_eq!(fixture.records, 100);
        assert!(!fixture.compressed.is_empty());
        assert!((fixture.compressed.len() as u64) < fixture.raw_bytes);
    }
}
