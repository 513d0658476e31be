//! Integration tests for scrape orchestration
//!
//! The connection provider is replaced by in-memory implementations so the
//! whole fetch → demux → decode → render path runs without a network.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use checkmk_exporter_core::decoder::MetricDesc;
use checkmk_exporter_core::exposition::render;
use checkmk_exporter_core::{
    ConnectionError, ConnectionProvider, ConnectionResult, DecoderError, DecoderRegistry,
    DecoderResult, RawOutput, SampleSink, ScrapeOrchestrator, SubsystemDecoder, Target,
    drain_samples,
};

const AGENT_OUTPUT: &str = "\
<<<check_mk>>>
Version: 2.2.0p12
AgentOS: linux
<<<df>>>
/dev/sda1     ext4     102400   40960   61440  40% /
tmpfs         tmpfs      8192       0    8192   0% /run
/dev/sda1     ext4     102400   40960   61440  40% /
<<<diskstat>>>
1700000000
   8       0 sda 120 4 2048 300 80 10 1024 200 0 450 500
   8       1 sda1 100 3 1900 250 70 9 1000 180 0 400 430 5 0 64 2
<<<mem>>>
MemTotal:       16384000 kB
";

/// Provider returning fixed output and counting calls
struct StaticProvider {
    output: &'static str,
    calls: AtomicUsize,
}

impl StaticProvider {
    fn new(output: &'static str) -> Self {
        Self {
            output,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConnectionProvider for StaticProvider {
    async fn fetch(&self, _target: &Target) -> ConnectionResult<RawOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawOutput::from(self.output))
    }
}

/// Provider failing at the authentication stage
struct RejectingProvider;

#[async_trait]
impl ConnectionProvider for RejectingProvider {
    async fn fetch(&self, target: &Target) -> ConnectionResult<RawOutput> {
        Err(ConnectionError::Authentication {
            path: target.identity_file.clone(),
            reason: "unable to parse private key: no PEM private key block found".into(),
        })
    }
}

/// Decoder that counts invocations and emits one sample per line
struct CountingDecoder {
    name: &'static str,
    desc: Arc<MetricDesc>,
    invocations: Arc<AtomicUsize>,
}

impl SubsystemDecoder for CountingDecoder {
    fn subsystem(&self) -> &'static str {
        self.name
    }

    fn update(&self, lines: &[String], sink: &SampleSink) -> DecoderResult<()> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        for line in lines {
            sink.gauge(&self.desc, 1.0, &[line.as_str()])?;
        }
        Ok(())
    }
}

/// Decoder whose task panics
struct PanickingDecoder;

impl SubsystemDecoder for PanickingDecoder {
    fn subsystem(&self) -> &'static str {
        "df"
    }

    fn update(&self, _lines: &[String], _sink: &SampleSink) -> DecoderResult<()> {
        panic!("decoder bug");
    }
}

fn counting_registry(names: &[&'static str]) -> (DecoderRegistry, Vec<Arc<AtomicUsize>>) {
    let mut registry = DecoderRegistry::new();
    let mut counters = Vec::new();
    for &name in names {
        let counter = Arc::new(AtomicUsize::new(0));
        counters.push(Arc::clone(&counter));
        registry.register(name, move || {
            Ok(Box::new(CountingDecoder {
                name,
                desc: MetricDesc::new(name, "lines", "Lines seen", &["line"]),
                invocations: Arc::clone(&counter),
            }) as Box<dyn SubsystemDecoder>)
        });
    }
    (registry, counters)
}

#[tokio::test]
async fn test_full_pipeline_with_builtin_decoders() {
    let scraper = ScrapeOrchestrator::new(
        Arc::new(StaticProvider::new(AGENT_OUTPUT)),
        Arc::new(DecoderRegistry::builtin()),
    );
    let (sink, mut rx) = SampleSink::channel();
    let report = scraper.collect(&Target::new("web01"), &sink).await;
    let samples = drain_samples(&mut rx);

    assert!(report.is_success());
    assert_eq!(report.target, "web01");
    assert!(report.collector("df").is_some_and(|c| c.is_success()));
    assert!(report.collector("diskstat").is_some_and(|c| c.is_success()));
    assert!(report.collector("mem").is_none());

    // duplicate df line collapsed: 2 filesystems x 4 + 2 devices x 15
    assert_eq!(samples.len(), 8 + 30);

    let discards = samples
        .iter()
        .find(|s| {
            s.name() == "check_mk_diskstat_discards_completed_successfully"
                && s.label("device_name") == Some("sda1")
        })
        .map(|s| s.value);
    assert_eq!(discards, Some(5.0));

    let text = render(&samples, &report).unwrap();
    assert!(text.contains(
        r#"check_mk_df_fs_percentage_used{device="/dev/sda1",fstype="ext4",mountpoint="/"} 40"#
    ));
    assert!(text.contains(
        r#"check_mk_diskstat_sectors_read{device_name="sda",major_number="8",minor_number="0"} 2048"#
    ));
    assert!(text.contains("check_mk_scrape_success 1"));
}

#[tokio::test]
async fn test_provider_failure_returns_promptly_without_samples() {
    let (registry, counters) = counting_registry(&["df", "diskstat"]);
    let scraper = ScrapeOrchestrator::new(Arc::new(RejectingProvider), Arc::new(registry));
    let (sink, mut rx) = SampleSink::channel();

    let report = tokio::time::timeout(
        Duration::from_secs(1),
        scraper.collect(&Target::new("db01"), &sink),
    )
    .await
    .expect("scrape did not return promptly");

    assert!(!report.is_success());
    assert_eq!(report.failure.as_ref().map(|f| f.stage), Some("authentication"));
    assert!(drain_samples(&mut rx).is_empty());
    assert!(counters.iter().all(|c| c.load(Ordering::SeqCst) == 0));

    let text = render(&[], &report).unwrap();
    assert!(text.contains("check_mk_scrape_success 0"));
    assert!(text.contains(r#"stage="authentication""#));
}

#[tokio::test]
async fn test_only_decoders_with_sections_run() {
    let (registry, counters) = counting_registry(&["alpha", "beta"]);
    let scraper = ScrapeOrchestrator::new(
        Arc::new(StaticProvider::new("<<<alpha>>>\none\ntwo\n<<<gamma>>>\nignored\n")),
        Arc::new(registry),
    );
    let (sink, mut rx) = SampleSink::channel();
    let report = scraper.collect(&Target::new("web01"), &sink).await;

    assert_eq!(counters[0].load(Ordering::SeqCst), 1);
    assert_eq!(counters[1].load(Ordering::SeqCst), 0);
    assert_eq!(report.collectors.len(), 1);
    assert_eq!(drain_samples(&mut rx).len(), 2);
}

#[tokio::test]
async fn test_panicking_decoder_does_not_abort_scrape() {
    let registry = DecoderRegistry::builtin()
        .with("df", || Ok(Box::new(PanickingDecoder) as Box<dyn SubsystemDecoder>));
    let scraper = ScrapeOrchestrator::new(
        Arc::new(StaticProvider::new(AGENT_OUTPUT)),
        Arc::new(registry),
    );
    let (sink, mut rx) = SampleSink::channel();
    let report = scraper.collect(&Target::new("web01"), &sink).await;

    let df = report.collector("df").unwrap();
    assert!(!df.is_success());
    assert!(df.error.as_deref().unwrap_or_default().contains("aborted"));
    assert!(report.collector("diskstat").is_some_and(|c| c.is_success()));
    assert_eq!(drain_samples(&mut rx).len(), 30);
}

#[tokio::test]
async fn test_failing_factory_excludes_only_that_subsystem() {
    let registry = DecoderRegistry::builtin().with("diskstat", || {
        Err(DecoderError::Factory {
            subsystem: "diskstat".into(),
            reason: "descriptor conflict".into(),
        })
    });
    let scraper = ScrapeOrchestrator::new(
        Arc::new(StaticProvider::new(AGENT_OUTPUT)),
        Arc::new(registry),
    );
    let (sink, mut rx) = SampleSink::channel();
    let report = scraper.collect(&Target::new("web01"), &sink).await;

    assert!(report.is_success());
    let diskstat = report.collector("diskstat").unwrap();
    assert!(diskstat.error.as_deref().unwrap_or_default().contains("descriptor conflict"));
    assert_eq!(drain_samples(&mut rx).len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scrapes_are_independent() {
    let provider = Arc::new(StaticProvider::new(AGENT_OUTPUT));
    let scraper = ScrapeOrchestrator::new(
        Arc::clone(&provider) as Arc<dyn ConnectionProvider>,
        Arc::new(DecoderRegistry::builtin()),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let scraper = scraper.clone();
            tokio::spawn(async move {
                let (sink, mut rx) = SampleSink::channel();
                let report = scraper.collect(&Target::new(format!("host{i}")), &sink).await;
                (report, drain_samples(&mut rx).len())
            })
        })
        .collect();

    for handle in handles {
        let (report, samples) = handle.await.unwrap();
        assert!(report.is_success());
        assert_eq!(samples, 38);
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 8);
}
