//! Postgres-backed readings and alerts.
//!
//! Schema lives in `sql/001_base_schema.sql`:
//!   - `water_raw.readings`  — append-only raw samples.
//!   - `water_raw.alerts`    — alerts plus lifecycle columns.
//!
//! Recipients and broadcast history stay in memory for now; they are
//! administered through the dashboard and small enough to reseed.
//! Connection comes from `DATABASE_URL` (see `config`).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls};

use crate::model::{Alert, AlertStatus, AnomalyType, ChannelKind, Severity, WaterReading};
use crate::store::{AlertFilter, AlertStore, ReadingStore, StoreError};

impl From<postgres::Error> for StoreError {
    fn from(err: postgres::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub struct SqlStore {
    client: Client,
}

impl SqlStore {
    /// Connects and verifies the expected schema is present, so a missing
    /// migration fails at startup instead of mid-cycle.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let mut client = Client::connect(database_url, NoTls)?;

        let row = client.query_one(
            "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = 'water_raw'",
            &[],
        )?;
        let schemas: i64 = row.get(0);
        if schemas == 0 {
            return Err(StoreError::Backend(
                "schema 'water_raw' missing - apply sql/001_base_schema.sql".to_string(),
            ));
        }

        Ok(SqlStore { client })
    }
}

// ---------------------------------------------------------------------------
// Column conversions
// ---------------------------------------------------------------------------

fn channels_to_column(channels: &[ChannelKind]) -> String {
    channels
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn channels_from_column(column: &str) -> Vec<ChannelKind> {
    column
        .split(',')
        .filter_map(|s| match s.trim() {
            "email" => Some(ChannelKind::Email),
            "sms" => Some(ChannelKind::Sms),
            "whatsapp" => Some(ChannelKind::Whatsapp),
            _ => None,
        })
        .collect()
}

fn alert_from_row(row: &postgres::Row) -> Result<Alert, StoreError> {
    let anomaly_type: String = row.get(2);
    let severity: String = row.get(3);
    let status: String = row.get(6);
    let notifications: String = row.get(10);

    Ok(Alert {
        id: row.get(0),
        household_id: row.get(1),
        anomaly_type: AnomalyType::from_str(&anomaly_type).map_err(StoreError::Backend)?,
        severity: Severity::from_str(&severity).map_err(StoreError::Backend)?,
        message: row.get(4),
        timestamp: row.get::<_, DateTime<Utc>>(5),
        status: AlertStatus::from_str(&status).map_err(StoreError::Backend)?,
        acknowledged_by: row.get(7),
        acknowledged_at: row.get(8),
        resolved_at: row.get(9),
        notifications_sent: channels_from_column(&notifications),
    })
}

// ---------------------------------------------------------------------------
// ReadingStore
// ---------------------------------------------------------------------------

impl ReadingStore for SqlStore {
    fn insert_readings(&mut self, readings: &[WaterReading]) -> Result<usize, StoreError> {
        let statement = self.client.prepare(
            "INSERT INTO water_raw.readings (household_id, flow_rate_lpm, pressure_bar, reading_time)
             VALUES ($1, $2, $3, $4)",
        )?;

        let mut written = 0;
        for reading in readings {
            let reading_time = reading.timestamp.with_timezone(&Utc);
            written += self.client.execute(
                &statement,
                &[
                    &reading.household_id,
                    &reading.flow_rate_lpm,
                    &reading.pressure_bar,
                    &reading_time,
                ],
            )?;
        }
        Ok(written as usize)
    }

    fn recent_readings(
        &mut self,
        household_id: &str,
        limit: usize,
    ) -> Result<Vec<WaterReading>, StoreError> {
        let rows = self.client.query(
            "SELECT household_id, flow_rate_lpm, pressure_bar, reading_time
             FROM water_raw.readings
             WHERE household_id = $1
             ORDER BY reading_time DESC
             LIMIT $2",
            &[&household_id, &(limit as i64)],
        )?;

        let mut readings = Vec::with_capacity(rows.len());
        for row in rows {
            readings.push(WaterReading {
                household_id: row.get(0),
                flow_rate_lpm: row.get(1),
                pressure_bar: row.get(2),
                timestamp: row.get::<_, DateTime<Utc>>(3).fixed_offset(),
            });
        }
        Ok(readings)
    }
}

// ---------------------------------------------------------------------------
// AlertStore
// ---------------------------------------------------------------------------

const ALERT_COLUMNS: &str = "id, household_id, anomaly_type, severity, message, created_at, \
                             status, acknowledged_by, acknowledged_at, resolved_at, \
                             notifications_sent";

impl AlertStore for SqlStore {
    fn insert_alert(&mut self, alert: &Alert) -> Result<(), StoreError> {
        self.client.execute(
            "INSERT INTO water_raw.alerts
                 (id, household_id, anomaly_type, severity, message, created_at,
                  status, acknowledged_by, acknowledged_at, resolved_at, notifications_sent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            &[
                &alert.id,
                &alert.household_id,
                &alert.anomaly_type.as_str(),
                &alert.severity.as_str(),
                &alert.message,
                &alert.timestamp,
                &alert.status.as_str(),
                &alert.acknowledged_by,
                &alert.acknowledged_at,
                &alert.resolved_at,
                &channels_to_column(&alert.notifications_sent),
            ],
        )?;
        Ok(())
    }

    fn get_alert(&mut self, id: &str) -> Result<Alert, StoreError> {
        let query = format!("SELECT {} FROM water_raw.alerts WHERE id = $1", ALERT_COLUMNS);
        let rows = self.client.query(&query, &[&id])?;
        match rows.first() {
            Some(row) => alert_from_row(row),
            None => Err(StoreError::NotFound(format!("alert {}", id))),
        }
    }

    fn update_alert(&mut self, alert: &Alert) -> Result<(), StoreError> {
        let updated = self.client.execute(
            "UPDATE water_raw.alerts
             SET status = $2, acknowledged_by = $3, acknowledged_at = $4,
                 resolved_at = $5, notifications_sent = $6
             WHERE id = $1",
            &[
                &alert.id,
                &alert.status.as_str(),
                &alert.acknowledged_by,
                &alert.acknowledged_at,
                &alert.resolved_at,
                &channels_to_column(&alert.notifications_sent),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("alert {}", alert.id)));
        }
        Ok(())
    }

    fn list_alerts(&mut self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        // Optional filters are pushed down as NULL-tolerant predicates so
        // one prepared statement covers every filter combination.
        let query = format!(
            "SELECT {} FROM water_raw.alerts
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR household_id = $2)
               AND ($3::text IS NULL OR severity = $3)
             ORDER BY created_at DESC
             LIMIT $4",
            ALERT_COLUMNS
        );

        let status = filter.status.map(|s| s.as_str().to_string());
        let household = filter.household_id.clone();
        let severity = filter.severity.map(|s| s.as_str().to_string());
        let limit = filter.limit.unwrap_or(AlertFilter::DEFAULT_LIMIT) as i64;

        let rows = self
            .client
            .query(&query, &[&status, &household, &severity, &limit])?;

        rows.iter().map(alert_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_column_roundtrip() {
        let channels = vec![ChannelKind::Email, ChannelKind::Whatsapp];
        assert_eq!(channels_to_column(&channels), "email,whatsapp");
        assert_eq!(channels_from_column("email,whatsapp"), channels);
    }

    #[test]
    fn test_channels_column_empty_and_unknown_tokens() {
        assert_eq!(channels_to_column(&[]), "");
        assert!(channels_from_column("").is_empty());
        assert_eq!(channels_from_column("email,pigeon"), vec![ChannelKind::Email]);
    }
}
