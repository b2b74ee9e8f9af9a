//! Outbound side effects of placing an order or issuing a promo code.
//!
//! Sinks are best-effort: [`Notifiers`] logs a failing sink and moves on, so a
//! mail or export outage never affects an order that has already committed.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Debug, Clone, Serialize)]
pub struct PlacedItem {
    pub product_type: String,
    pub name: String,
    pub quantity: i32,
    pub size: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub customer_email: String,
    pub customer_name: String,
    pub delivery_address: String,
    pub phone_number: String,
    pub status: String,
    pub subtotal: Decimal,
    pub discount_percent: i32,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub items: Vec<PlacedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoIssued {
    pub email: String,
    pub customer_name: String,
    pub code: String,
    pub discount_percent: i32,
    pub expiry_date: DateTime<Utc>,
}

#[async_trait]
pub trait OrderNotifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn order_placed(&self, event: &OrderPlaced) -> anyhow::Result<()>;

    async fn promo_issued(&self, _event: &PromoIssued) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Renders customer emails into the log instead of handing them to an MTA.
pub struct LogMailer;

#[async_trait]
impl OrderNotifier for LogMailer {
    fn name(&self) -> &'static str {
        "log-mailer"
    }

    async fn order_placed(&self, event: &OrderPlaced) -> anyhow::Result<()> {
        tracing::info!(
            to = %event.customer_email,
            order_id = %event.order_id,
            items = event.items.len(),
            total = %event.total_amount,
            discount_percent = event.discount_percent,
            "order confirmation email"
        );
        Ok(())
    }

    async fn promo_issued(&self, event: &PromoIssued) -> anyhow::Result<()> {
        tracing::info!(
            to = %event.email,
            code = %event.code,
            discount_percent = event.discount_percent,
            expires = %event.expiry_date,
            "birthday promo email"
        );
        Ok(())
    }
}

/// One fulfilment row per ordered item, in the column order the shop's
/// order sheet uses.
#[derive(Debug, Serialize)]
pub struct ExportRow<'a> {
    pub order_id: Uuid,
    pub customer_name: &'a str,
    pub product_type: &'a str,
    pub product_name: &'a str,
    pub quantity: i32,
    pub size: Option<&'a str>,
    pub delivery_address: &'a str,
    pub phone_number: &'a str,
    pub status: &'a str,
    pub total_amount: Decimal,
    pub discount: String,
    pub subtotal: Decimal,
}

pub fn export_rows(event: &OrderPlaced) -> Vec<ExportRow<'_>> {
    event
        .items
        .iter()
        .map(|item| ExportRow {
            order_id: event.order_id,
            customer_name: &event.customer_name,
            product_type: &item.product_type,
            product_name: &item.name,
            quantity: item.quantity,
            size: item.size.as_deref(),
            delivery_address: &event.delivery_address,
            phone_number: &event.phone_number,
            status: &event.status,
            total_amount: event.total_amount,
            discount: format!("{}%", event.discount_percent),
            subtotal: event.subtotal,
        })
        .collect()
}

/// Appends export rows as JSON lines to a local file.
pub struct JsonlExporter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl OrderNotifier for JsonlExporter {
    fn name(&self) -> &'static str {
        "jsonl-exporter"
    }

    async fn order_placed(&self, event: &OrderPlaced) -> anyhow::Result<()> {
        let mut buf = Vec::new();
        for row in export_rows(event) {
            serde_json::to_writer(&mut buf, &row)?;
            buf.push(b'\n');
        }

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct Notifiers {
    sinks: Vec<Arc<dyn OrderNotifier>>,
}

impl Notifiers {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut notifiers = Self::default().with(LogMailer);
        if let Some(path) = &config.order_export_path {
            notifiers = notifiers.with(JsonlExporter::new(path.clone()));
        }
        notifiers
    }

    pub fn with(mut self, sink: impl OrderNotifier + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub async fn order_placed(&self, event: &OrderPlaced) {
        for sink in &self.sinks {
            if let Err(err) = sink.order_placed(event).await {
                tracing::warn!(
                    sink = sink.name(),
                    order_id = %event.order_id,
                    error = %err,
                    "order notification failed"
                );
            }
        }
    }

    pub async fn promo_issued(&self, event: &PromoIssued) {
        for sink in &self.sinks {
            if let Err(err) = sink.promo_issued(event).await {
                tracing::warn!(sink = sink.name(), error = %err, "promo notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> OrderPlaced {
        OrderPlaced {
            order_id: Uuid::new_v4(),
            customer_email: "nour@example.com".into(),
            customer_name: "Nour Adel".into(),
            delivery_address: "12 Nile Street, 4B, Cairo, Cairo".into(),
            phone_number: "+201012345678".into(),
            status: "Pending".into(),
            subtotal: Decimal::from(500),
            discount_percent: 20,
            shipping_cost: Decimal::from(80),
            total_amount: Decimal::from(480),
            items: vec![
                PlacedItem {
                    product_type: "Necklaces".into(),
                    name: "Seashell".into(),
                    quantity: 1,
                    size: None,
                    price: Decimal::from(200),
                },
                PlacedItem {
                    product_type: "Body Chains".into(),
                    name: "Vertical Gleam".into(),
                    quantity: 1,
                    size: Some("S/M".into()),
                    price: Decimal::from(300),
                },
            ],
        }
    }

    struct Failing;

    #[async_trait]
    impl OrderNotifier for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn order_placed(&self, _event: &OrderPlaced) -> anyhow::Result<()> {
            anyhow::bail!("smtp unavailable")
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl OrderNotifier for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn order_placed(&self, _event: &OrderPlaced) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn export_rows_follow_items() {
        let event = event();
        let rows = export_rows(&event);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].size, Some("S/M"));
        assert_eq!(rows[0].discount, "20%");
    }

    #[test]
    fn export_sink_is_added_only_when_configured() {
        let mut config = AppConfig {
            database_url: "postgres://localhost/shop".into(),
            host: "127.0.0.1".into(),
            port: 3000,
            order_export_path: None,
            birthday_job_enabled: false,
        };
        assert_eq!(Notifiers::from_config(&config).sink_count(), 1);

        config.order_export_path = Some(PathBuf::from("orders.jsonl"));
        assert_eq!(Notifiers::from_config(&config).sink_count(), 2);
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_the_others() {
        let count = Arc::new(AtomicUsize::new(0));
        let notifiers = Notifiers::default()
            .with(Failing)
            .with(Counting(count.clone()));
        notifiers.order_placed(&event()).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn jsonl_exporter_appends_one_line_per_item() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("orders-{}.jsonl", Uuid::new_v4()));
        let exporter = JsonlExporter::new(&path);
        exporter.order_placed(&event()).await?;
        exporter.order_placed(&event()).await?;

        let contents = tokio::fs::read_to_string(&path).await?;
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        let first: serde_json::Value = serde_json::from_str(lines[0])?;
        assert_eq!(first["product_name"], "Seashell");
        assert_eq!(first["status"], "Pending");

        tokio::fs::remove_file(&path).await?;
        Ok(())
    }
}
