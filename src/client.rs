use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::debug;
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::date_range::month_ranges;
use crate::errors::AnalyzerError;
use crate::models::{PlantMeta, TimePoint};
use crate::timekey::normalize_time_key;

const TGT_URL: &str = "https://giris.epias.com.tr/cas/v1/tickets";
const SERVICE_BASE: &str = "https://seffaflik.epias.com.tr/electricity-service";

const PTF_PATH: &str = "/v1/markets/dam/data/mcp";
const SMF_PATH: &str = "/v1/markets/bpm/data/system-marginal-price";
const KGUP_PATH: &str = "/v1/generation/data/dpp-first-version";
const URETIM_PATH: &str = "/v1/generation/data/realtime-generation";

/// Client for the EPİAŞ Transparency Platform. All four series share
/// the same request shape: one authenticated POST per calendar-month
/// window, a fixed pacing delay between windows.
pub struct EpiasClient {
    http: Client,
    tgt: Option<String>,
    service_base: String,
    price_delay: Duration,
    plant_delay: Duration,
}

impl EpiasClient {
    pub fn new(tgt: Option<String>) -> Self {
        Self {
            http: Client::new(),
            tgt,
            service_base: SERVICE_BASE.to_string(),
            price_delay: Duration::from_millis(100),
            plant_delay: Duration::from_millis(200),
        }
    }

    pub fn with_service_base(mut self, base: impl Into<String>) -> Self {
        self.service_base = base.into();
        self
    }

    pub fn with_delays(mut self, price_delay: Duration, plant_delay: Duration) -> Self {
        self.price_delay = price_delay;
        self.plant_delay = plant_delay;
        self
    }

    /// Obtain a TGT token with username/password. The token is valid
    /// for roughly two hours; all data calls send it in the `TGT` header.
    pub fn obtain_tgt(username: &str, password: &str) -> Result<String, AnalyzerError> {
        Self::obtain_tgt_from(TGT_URL, username, password)
    }

    fn obtain_tgt_from(url: &str, username: &str, password: &str) -> Result<String, AnalyzerError> {
        let resp = Client::new()
            .post(url)
            .header("Accept", "text/plain")
            .form(&[("username", username), ("password", password)])
            .send()?
            .error_for_status()?;
        Ok(resp.text()?.trim().to_string())
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value, AnalyzerError> {
        let tgt = self.tgt.as_deref().ok_or(AnalyzerError::Authentication)?;
        debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .header("TGT", tgt)
            .header("Accept-Language", "en")
            .header("Accept", "application/json")
            .json(body)
            .send()?
            .error_for_status()?;
        let text = resp.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Day-ahead market clearing prices (PTF).
    pub fn fetch_ptf(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimePoint>, AnalyzerError> {
        self.fetch_series(PTF_PATH, &json!({}), "hour", "price", self.price_delay, start, end)
    }

    /// System marginal prices (SMF).
    pub fn fetch_smf(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimePoint>, AnalyzerError> {
        self.fetch_series(
            SMF_PATH,
            &json!({}),
            "hour",
            "systemMarginalPrice",
            self.price_delay,
            start,
            end,
        )
    }

    /// First-version generation plan (KGÜP) for one plant.
    pub fn fetch_kgup(
        &self,
        plant: &PlantMeta,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimePoint>, AnalyzerError> {
        let extra = json!({
            "organizationId": plant.organization_id,
            "uevcbId": plant.uevcb_id,
            "region": "TR1",
        });
        self.fetch_series(KGUP_PATH, &extra, "time", "toplam", self.plant_delay, start, end)
    }

    /// Realized (realtime) generation for one plant.
    pub fn fetch_uretim(
        &self,
        plant: &PlantMeta,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimePoint>, AnalyzerError> {
        let extra = json!({ "powerPlantId": plant.power_plant_id });
        self.fetch_series(URETIM_PATH, &extra, "time", "total", self.plant_delay, start, end)
    }

    fn fetch_series(
        &self,
        path: &str,
        extra: &Value,
        hour_field: &str,
        value_field: &str,
        delay: Duration,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimePoint>, AnalyzerError> {
        let url = format!("{}{}", self.service_base, path);
        let mut points = Vec::new();
        for (period_start, period_end) in month_ranges(start, end)? {
            let mut body = json!({ "startDate": period_start, "endDate": period_end });
            if let (Some(obj), Some(extra_obj)) = (body.as_object_mut(), extra.as_object()) {
                for (k, v) in extra_obj {
                    obj.insert(k.clone(), v.clone());
                }
            }
            let data = self.post_json(&url, &body)?;
            if let Some(items) = data.get("items").and_then(Value::as_array) {
                for item in items {
                    let Some(date_raw) = item.get("date").and_then(Value::as_str) else {
                        continue;
                    };
                    let hour_raw = item.get(hour_field).and_then(Value::as_str);
                    // rows whose keys do not normalize are dropped here
                    let Some(key) = normalize_time_key(date_raw, hour_raw) else {
                        continue;
                    };
                    points.push(TimePoint {
                        ts: key.ts,
                        day: key.day,
                        hour: key.hour,
                        value: value_to_f64(item.get(value_field)),
                    });
                }
            }
            thread::sleep(delay);
        }
        Ok(points)
    }
}

/// Upstream item values arrive as JSON numbers or numeric strings;
/// anything else is kept as unknown, never coerced to zero.
fn value_to_f64(v: Option<&Value>) -> Option<f64> {
    match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}
