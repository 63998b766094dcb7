//! Latency and error instruments for object storage operations.

use std::time::Instant;

use opentelemetry::{
    KeyValue,
    global,
    metrics::{Counter, Histogram, Meter},
};

use crate::{Provider, StorageError};

const METER_NAME: &str = "objstorage";

#[derive(Clone)]
pub struct StorageMetrics {
    /// Operation latency, labelled by provider, operation and outcome.
    pub operations: Histogram<f64>,

    /// Failed operations, labelled by provider and operation.
    pub errors: Counter<u64>,
}

impl StorageMetrics {
    pub fn new(meter: &Meter) -> Self {
        let operations = meter
            .f64_histogram("objstorage_operation_duration_seconds")
            .with_description("Duration of object storage operations in seconds")
            .build();

        let errors = meter
            .u64_counter("objstorage_errors_total")
            .with_description("Total number of failed object storage operations")
            .build();

        Self { operations, errors }
    }

    /// Instruments registered on the process-wide meter provider.
    pub fn global() -> Self {
        Self::new(&global::meter(METER_NAME))
    }

    pub fn start(&self, provider: Provider, operation: &'static str) -> OperationTimer {
        OperationTimer {
            start: Instant::now(),
            metrics: self.clone(),
            labels: [
                KeyValue::new("provider", provider.as_str()),
                KeyValue::new("operation", operation),
            ],
            outcome: "aborted",
        }
    }
}

/// Records one operation when dropped; a dropped, unfinished timer counts
/// as an aborted call.
pub struct OperationTimer {
    start: Instant,
    metrics: StorageMetrics,
    labels: [KeyValue; 2],
    outcome: &'static str,
}

impl OperationTimer {
    pub fn finish<T>(mut self, result: &Result<T, StorageError>) {
        self.outcome = match result {
            Ok(_) => "ok",
            Err(err) if err.is_cancelled() => "cancelled",
            Err(_) => "error",
        };
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        let mut labels = self.labels.to_vec();
        labels.push(KeyValue::new("outcome", self.outcome));
        self.metrics.operations.record(duration, &labels);
        if self.outcome == "error" {
            self.metrics.errors.add(1, &self.labels);
        }
    }
}
