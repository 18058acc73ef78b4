use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};

use crate::models::{HourlyRow, TimePoint};

fn value_map(points: &[TimePoint]) -> BTreeMap<NaiveDateTime, Option<f64>> {
    // later observations win on duplicate timestamps
    points.iter().map(|p| (p.ts, p.value)).collect()
}

fn point_map(points: &[TimePoint]) -> BTreeMap<NaiveDateTime, &TimePoint> {
    points.iter().map(|p| (p.ts, p)).collect()
}

/// Join the four series by canonical timestamp and derive the
/// settlement columns. Plan and realized generation are inner-joined
/// (an hour missing from either is dropped); prices are left-joined and
/// stay unknown where absent. Empty plan or realized input yields an
/// empty table, which the caller treats as "insufficient data".
pub fn build_plant_table(
    kgup: &[TimePoint],
    uretim: &[TimePoint],
    ptf: &[TimePoint],
    smf: &[TimePoint],
) -> Vec<HourlyRow> {
    if kgup.is_empty() || uretim.is_empty() {
        return Vec::new();
    }
    let kgup_map = point_map(kgup);
    let uretim_map = value_map(uretim);
    let ptf_map = value_map(ptf);
    let smf_map = value_map(smf);

    let mut rows = Vec::new();
    for (ts, plan) in kgup_map {
        let Some(uretim) = uretim_map.get(&ts).copied() else {
            continue;
        };
        let kgup = plan.value;
        let ptf = ptf_map.get(&ts).copied().flatten();
        let smf = smf_map.get(&ts).copied().flatten();

        // with one price missing the other stands in for both bounds
        let price_bounds = match (ptf, smf) {
            (Some(p), Some(s)) => Some((p.min(s), p.max(s))),
            (Some(p), None) | (None, Some(p)) => Some((p, p)),
            (None, None) => None,
        };
        let poz_df = price_bounds.map(|(lo, _)| lo * 0.97);
        let neg_df = price_bounds.map(|(_, hi)| hi * 1.03);
        let dengesizlik = uretim.zip(kgup).map(|(u, k)| u - k);
        let gop_geliri = kgup.zip(ptf).map(|(k, p)| k * p);
        let dengesizlik_tutari = match dengesizlik {
            None => Some(0.0),
            Some(d) if d >= 0.0 => poz_df.map(|p| d * p),
            Some(d) => neg_df.map(|n| d * n),
        };
        let net_gelir = gop_geliri.zip(dengesizlik_tutari).map(|(g, t)| g + t);
        let dengesizlik_maliyeti = uretim
            .zip(ptf)
            .map(|(u, p)| u * p)
            .zip(net_gelir)
            .map(|(realized_value, net)| (realized_value - net).max(0.0));
        let birim_dm = match uretim {
            None => Some(0.0),
            Some(u) if u == 0.0 => Some(0.0),
            Some(u) => dengesizlik_maliyeti.map(|c| c / u),
        };

        rows.push(HourlyRow {
            ts,
            day: plan.day,
            month: ts.month(),
            hour: plan.hour.clone(),
            ptf,
            smf,
            poz_df,
            neg_df,
            kgup,
            uretim,
            dengesizlik,
            gop_geliri,
            dengesizlik_tutari,
            net_gelir,
            dengesizlik_maliyeti,
            birim_dm,
        });
    }
    rows
}
