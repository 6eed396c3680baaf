//! Dispatch pipeline (C11): for each decoded batch, log every record,
//! publish the wire-order-last record as the device's live position, persist
//! the whole batch, persist the raw bytes, and ack. Steps 2-4 are
//! best-effort: failures are logged but never fail the ack (spec.md §4.11,
//! §7).

use crate::publisher::{last_point_subject, Publisher};
use crate::record::AvlRecord;
use crate::store::AvlStore;
use crate::wire_publish::encode_last_point;
use log::{error, info};
use std::sync::Arc;
use tokio::task::JoinSet;

pub struct Dispatcher {
    pub store: Arc<dyn AvlStore>,
    pub publisher: Arc<dyn Publisher>,
    /// spec.md §9 Open Question 1: canonical behavior publishes the last
    /// record in wire order; set true to publish the max-timestamp record
    /// instead.
    pub sorted_last_point: bool,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn AvlStore>, publisher: Arc<dyn Publisher>) -> Self {
        Dispatcher {
            store,
            publisher,
            sorted_last_point: false,
        }
    }

    fn log_records(&self, records: &[AvlRecord]) {
        for rec in records {
            let when = chrono::DateTime::from_timestamp_millis(rec.timestamp_ms as i64)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| rec.timestamp_ms.to_string());
            info!(
                "new point imei={} priority={:?} timestamp={} longitude={} latitude={} io_elements={}",
                rec.imei,
                rec.priority,
                when,
                rec.gps.longitude,
                rec.gps.latitude,
                rec.io_elements.len(),
            );
        }
    }

    fn pick_last_point<'a>(&self, records: &'a [AvlRecord]) -> Option<&'a AvlRecord> {
        if self.sorted_last_point {
            records.iter().max_by_key(|r| r.timestamp_ms)
        } else {
            records.last()
        }
    }

    /// Runs steps 1-4 of the pipeline. Returns once persistence and publish
    /// have been spawned; the caller is responsible for joining the
    /// returned `JoinSet` before its next read (spec.md §5 ordering rule).
    pub fn dispatch(&self, imei: &str, records: Vec<AvlRecord>, raw: Vec<u8>) -> JoinSet<()> {
        self.log_records(&records);

        let mut tasks = JoinSet::new();

        if let Some(last) = self.pick_last_point(&records) {
            let publisher = self.publisher.clone();
            let subject = last_point_subject(imei);
            let payload = encode_last_point(last);
            tasks.spawn(async move {
                if let Err(e) = publisher.publish(&subject, &payload).await {
                    error!("publish last point failed: {e}");
                }
            });
        }

        let store = self.store.clone();
        let records_for_batch = records;
        tasks.spawn(async move {
            if let Err(e) = store.save_batch(&records_for_batch).await {
                error!("save batch failed: {e}");
            }
        });

        let store = self.store.clone();
        let imei = imei.to_owned();
        tasks.spawn(async move {
            let payload_hex = hex_encode(&raw);
            if let Err(e) = store.save_raw(&imei, &payload_hex).await {
                error!("save raw data failed: {e}");
            }
        });

        tasks
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}
