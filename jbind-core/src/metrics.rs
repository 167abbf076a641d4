//! Codec metrics
//!
//! OpenTelemetry instruments recorded at the conversion boundary. They are
//! obtained from the global meter provider, so they cost nothing until the
//! host application installs one.
//!
//! # Metrics Collected
//!
//! - **jbind.codec.decoded**: messages that decoded successfully (counter)
//! - **jbind.codec.rejected**: messages that failed to decode (counter)
//! - **jbind.codec.violations**: violations per rejected message (histogram)
//! - **jbind.codec.batch.size**: items per decoded batch (histogram)
//!
//! Every counter carries a `kind` attribute (`request`, `notification`,
//! `response`, `batch` or `invalid`).
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::CodecMetrics;
//!
//! let metrics = CodecMetrics::new("my-service");
//! metrics.record_decoded("request");
//! metrics.record_rejected("response", 2);
//! metrics.record_batch(10);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::sync::OnceLock;

/// Instruments for the conversion boundary
pub struct CodecMetrics {
    /// Messages decoded successfully
    pub decoded_total: Counter<u64>,
    /// Messages rejected by the decoder
    pub rejected_total: Counter<u64>,
    /// Violations found per rejected message
    pub violations: Histogram<u64>,
    /// Items per decoded batch
    pub batch_size: Histogram<u64>,
}

impl CodecMetrics {
    /// Create instruments on a meter named after the service
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            decoded_total: meter
                .u64_counter("jbind.codec.decoded")
                .with_description("Number of messages decoded successfully")
                .build(),
            rejected_total: meter
                .u64_counter("jbind.codec.rejected")
                .with_description("Number of messages rejected by the decoder")
                .build(),
            violations: meter
                .u64_histogram("jbind.codec.violations")
                .with_description("Invariant violations per rejected message")
                .build(),
            batch_size: meter
                .u64_histogram("jbind.codec.batch.size")
                .with_description("Number of items in decoded batches")
                .build(),
        }
    }

    /// Instruments used by the codec functions
    pub fn global() -> &'static CodecMetrics {
        static GLOBAL: OnceLock<CodecMetrics> = OnceLock::new();
        GLOBAL.get_or_init(|| CodecMetrics::new("jbind"))
    }

    /// Record a successful decode
    pub fn record_decoded(&self, kind: &'static str) {
        self.decoded_total.add(1, &[KeyValue::new("kind", kind)]);
    }

    /// Record a rejected message and how many violations it had
    pub fn record_rejected(&self, kind: &'static str, violations: usize) {
        let attributes = &[KeyValue::new("kind", kind)];
        self.rejected_total.add(1, attributes);
        self.violations.record(violations as u64, attributes);
    }

    /// Record the size of a decoded batch
    pub fn record_batch(&self, size: usize) {
        self.batch_size.record(size as u64, &[]);
    }
}
