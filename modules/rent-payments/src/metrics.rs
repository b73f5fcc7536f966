use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // Counters
    pub webhook_events_total: IntCounterVec,
    pub ledger_writes_total: IntCounterVec,
    pub intents_total: IntCounterVec,
    pub rate_limited_total: IntCounterVec,

    // Histograms
    pub http_request_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let webhook_events_total = IntCounterVec::new(
            Opts::new("payments_webhook_events_total", "Webhook deliveries by outcome"),
            &["event_type", "outcome"], // outcome: applied|skipped|ignored|rejected|error
        )?;

        let ledger_writes_total = IntCounterVec::new(
            Opts::new("payments_ledger_writes_total", "Ledger writes by source and result"),
            &["source", "result"], // source: webhook|confirmation, result: created|updated|unchanged|rejected
        )?;

        let intents_total = IntCounterVec::new(
            Opts::new("payments_intents_total", "Payment intent issuance attempts"),
            &["result"],
        )?;

        let rate_limited_total = IntCounterVec::new(
            Opts::new("payments_rate_limited_total", "Requests rate limited"),
            &["scope"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration seconds"),
            &["path", "method", "status"],
        )?;

        registry.register(Box::new(webhook_events_total.clone()))?;
        registry.register(Box::new(ledger_writes_total.clone()))?;
        registry.register(Box::new(intents_total.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            webhook_events_total,
            ledger_writes_total,
            intents_total,
            rate_limited_total,
            http_request_duration_seconds,
        })
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&mf, &mut buf).map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}
