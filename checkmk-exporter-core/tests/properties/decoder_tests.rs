//! Property-based tests for the subsystem decoders

use checkmk_exporter_core::decoder::df::FilesystemStats;
use checkmk_exporter_core::decoder::diskstat::DiskStats;
use checkmk_exporter_core::decoder::{BlockDeviceIo, FilesystemUsage, parse_value};
use checkmk_exporter_core::{SampleSink, SubsystemDecoder, drain_samples};
use proptest::prelude::*;

/// Whitespace-free tokens, numeric or not; no `i`/`n` so no inf/nan
fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u64..10_000_000).prop_map(|n| n.to_string()),
        "[a-hj-mo-z/_-]{1,8}",
    ]
}

fn expected(field: &str) -> f64 {
    field.parse().unwrap_or(0.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Non-numeric fields become zero instead of dropping the line
    #[test]
    fn prop_df_line_never_dropped(fields in prop::collection::vec(arb_field(), 7..10)) {
        let line = fields.join(" ");
        let fs = FilesystemStats::parse_line(&line).unwrap();
        prop_assert_eq!(&fs.device, &fields[0]);
        prop_assert_eq!(&fs.mount_point, &fields[6]);
        prop_assert_eq!(fs.size, expected(&fields[2]));
        prop_assert_eq!(fs.avail, expected(&fields[4]));
    }

    /// df emits exactly four samples per line with seven or more fields
    #[test]
    fn prop_df_sample_count(
        lines in prop::collection::vec(prop::collection::vec(arb_field(), 0..10), 0..10)
    ) {
        let text: Vec<String> = lines.iter().map(|f| f.join(" ")).collect();
        let usable = lines.iter().filter(|f| f.len() >= 7).count();

        let (sink, mut rx) = SampleSink::channel();
        FilesystemUsage::new().update(&text, &sink).unwrap();
        prop_assert_eq!(drain_samples(&mut rx).len(), usable * 4);
    }

    /// Lines with 14 or more fields parse, shorter ones are dropped
    #[test]
    fn prop_diskstat_field_threshold(fields in prop::collection::vec(arb_field(), 0..20)) {
        let parsed = DiskStats::parse_line(&fields.join(" "));
        prop_assert_eq!(parsed.is_some(), fields.len() >= 14);
        if let Some(disk) = parsed {
            prop_assert_eq!(disk.weighted_time_io, expected(&fields[13]));
            let discards = fields.get(14).map_or(0.0, |f| expected(f));
            prop_assert_eq!(disk.discards_completed, discards);
        }
    }

    /// The header line is never decoded, whatever it contains
    #[test]
    fn prop_diskstat_header_skipped(header in prop::collection::vec(arb_field(), 14..18)) {
        let (sink, mut rx) = SampleSink::channel();
        BlockDeviceIo::new().update(&[header.join(" ")], &sink).unwrap();
        prop_assert!(drain_samples(&mut rx).is_empty());
    }

    /// Parsing a field never fails
    #[test]
    fn prop_parse_value_total(field in ".{0,20}") {
        let value = parse_value(&field);
        prop_assert!(value.is_nan() || value == field.parse::<f64>().unwrap_or(0.0));
    }
}
