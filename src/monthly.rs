use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{HourlyRow, MonthlyExtras, MonthlyRow, MonthlySummary};

fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den != 0.0 {
        num / den
    } else {
        0.0
    }
}

fn share_pct(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Reduce an hourly table to the fixed 12-month summary plus a totals
/// row. Months without data stay present with all sums zero, so both
/// plants always produce the same row count. Unit ratios are computed
/// from the monthly sums, and the totals-row ratios from the grand
/// sums, never by averaging the monthly ratios.
pub fn build_monthly_summary(rows: &[HourlyRow]) -> MonthlySummary {
    let mut months: Vec<MonthlyRow> = (1..=12)
        .map(|m| MonthlyRow {
            month: m,
            ..MonthlyRow::default()
        })
        .collect();

    for row in rows {
        let Some(entry) = months.get_mut((row.month - 1) as usize) else {
            continue;
        };
        if let Some(v) = row.uretim {
            entry.uretim += v;
        }
        if let Some(v) = row.dengesizlik {
            entry.dengesizlik += v;
        }
        if let Some(v) = row.gop_geliri {
            entry.gop_geliri += v;
        }
        if let Some(v) = row.dengesizlik_tutari {
            entry.dengesizlik_tutari += v;
        }
        if let Some(v) = row.net_gelir {
            entry.net_gelir += v;
        }
        if let Some(v) = row.dengesizlik_maliyeti {
            entry.dengesizlik_maliyeti += v;
        }
    }

    for entry in &mut months {
        entry.birim_gelir = ratio_or_zero(entry.net_gelir, entry.uretim);
        entry.birim_deng_maliyeti = ratio_or_zero(entry.dengesizlik_maliyeti, entry.uretim);
    }

    let mut total = MonthlyRow::default();
    for entry in &months {
        total.uretim += entry.uretim;
        total.dengesizlik += entry.dengesizlik;
        total.gop_geliri += entry.gop_geliri;
        total.dengesizlik_tutari += entry.dengesizlik_tutari;
        total.net_gelir += entry.net_gelir;
        total.dengesizlik_maliyeti += entry.dengesizlik_maliyeti;
    }
    total.birim_gelir = ratio_or_zero(total.net_gelir, total.uretim);
    total.birim_deng_maliyeti = ratio_or_zero(total.dengesizlik_maliyeti, total.uretim);

    MonthlySummary { months, total }
}

fn days_in_month(year: i32, month: u32) -> f64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as f64,
        _ => 0.0,
    }
}

/// Extended per-month KPIs. `year` is the analysis year of the range
/// and drives the leap-year-aware capacity-factor denominator.
pub fn compute_monthly_extras(rows: &[HourlyRow], year: i32) -> MonthlyExtras {
    let total_revenue: f64 = rows.iter().filter_map(|r| r.net_gelir).sum();
    let total_production: f64 = rows.iter().filter_map(|r| r.uretim).sum();
    let total_prod_hours = rows
        .iter()
        .filter(|r| r.uretim.is_some_and(|u| u > 0.0))
        .count() as f64;
    let total_pos_vol: f64 = rows
        .iter()
        .filter_map(|r| r.dengesizlik)
        .filter(|d| *d > 0.0)
        .sum();
    let total_neg_vol: f64 = rows
        .iter()
        .filter_map(|r| r.dengesizlik)
        .filter(|d| *d < 0.0)
        .map(f64::abs)
        .sum();

    let mut extras = MonthlyExtras {
        accuracy_pct: Vec::with_capacity(12),
        asym_ratio: Vec::with_capacity(12),
        capacity_factor_pct: Vec::with_capacity(12),
        top5_dm_tl: Vec::with_capacity(12),
        top5_dm_share_pct: Vec::with_capacity(12),
        revenue_share_pct: Vec::with_capacity(12),
        pos_share_pct: Vec::with_capacity(12),
        neg_share_pct: Vec::with_capacity(12),
        prod_hours: Vec::with_capacity(12),
        prod_hours_share_pct: Vec::with_capacity(12),
        prod_share_pct: Vec::with_capacity(12),
    };

    for month in 1..=12u32 {
        let monthly: Vec<&HourlyRow> = rows.iter().filter(|r| r.month == month).collect();

        let sum_kgup: f64 = monthly.iter().filter_map(|r| r.kgup).sum();
        let sum_abs_imb: f64 = monthly
            .iter()
            .filter_map(|r| r.dengesizlik)
            .map(f64::abs)
            .sum();
        extras.accuracy_pct.push(if sum_kgup > 0.0 {
            (1.0 - sum_abs_imb / sum_kgup) * 100.0
        } else {
            0.0
        });

        let pos_dm: f64 = monthly
            .iter()
            .filter(|r| r.dengesizlik.is_some_and(|d| d > 0.0))
            .filter_map(|r| r.dengesizlik_maliyeti)
            .sum();
        let neg_dm: f64 = monthly
            .iter()
            .filter(|r| r.dengesizlik.is_some_and(|d| d < 0.0))
            .filter_map(|r| r.dengesizlik_maliyeti)
            .sum();
        // a ratio, not a sum: the undefined state must survive as blank
        extras
            .asym_ratio
            .push(if neg_dm != 0.0 { Some(pos_dm / neg_dm) } else { None });

        let max_kgup = monthly
            .iter()
            .filter_map(|r| r.kgup)
            .fold(f64::MIN, f64::max)
            .max(0.0);
        let potential = max_kgup * 24.0 * days_in_month(year, month);
        let month_prod: f64 = monthly.iter().filter_map(|r| r.uretim).sum();
        extras.capacity_factor_pct.push(share_pct(month_prod, potential));

        let mut daily_dm: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for r in &monthly {
            if let Some(cost) = r.dengesizlik_maliyeti {
                *daily_dm.entry(r.day).or_insert(0.0) += cost;
            }
        }
        let mut day_sums: Vec<f64> = daily_dm.into_values().collect();
        day_sums.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let top5: f64 = day_sums.iter().take(5).sum();
        let month_dm_total: f64 = monthly.iter().filter_map(|r| r.dengesizlik_maliyeti).sum();
        extras.top5_dm_tl.push(top5);
        extras.top5_dm_share_pct.push(share_pct(top5, month_dm_total));

        let month_rev: f64 = monthly.iter().filter_map(|r| r.net_gelir).sum();
        extras.revenue_share_pct.push(share_pct(month_rev, total_revenue));

        let pos_vol: f64 = monthly
            .iter()
            .filter_map(|r| r.dengesizlik)
            .filter(|d| *d > 0.0)
            .sum();
        let neg_vol: f64 = monthly
            .iter()
            .filter_map(|r| r.dengesizlik)
            .filter(|d| *d < 0.0)
            .map(f64::abs)
            .sum();
        extras.pos_share_pct.push(share_pct(pos_vol, total_pos_vol));
        extras.neg_share_pct.push(share_pct(neg_vol, total_neg_vol));

        let prod_hours = monthly
            .iter()
            .filter(|r| r.uretim.is_some_and(|u| u > 0.0))
            .count();
        extras.prod_hours.push(prod_hours as u32);
        extras
            .prod_hours_share_pct
            .push(share_pct(prod_hours as f64, total_prod_hours));
        extras.prod_share_pct.push(share_pct(month_prod, total_production));
    }

    extras
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimePoint;
    use crate::settlement::build_plant_table;

    fn point(month: u32, d: u32, h: u32, value: Option<f64>) -> TimePoint {
        let day = NaiveDate::from_ymd_opt(2024, month, d).unwrap();
        TimePoint {
            ts: day.and_hms_opt(h, 0, 0).unwrap(),
            day,
            hour: format!("{h:02}:00"),
            value,
        }
    }

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    /// Two months with different unit revenues; the total-row ratio
    /// must come from the summed quantities.
    #[test]
    fn total_ratio_from_sums_not_mean_of_ratios() {
        let kgup = vec![point(1, 1, 0, Some(100.0)), point(2, 1, 0, Some(10.0))];
        let uretim = vec![point(1, 1, 0, Some(100.0)), point(2, 1, 0, Some(10.0))];
        let ptf = vec![point(1, 1, 0, Some(100.0)), point(2, 1, 0, Some(400.0))];
        let smf = ptf.clone();

        let rows = build_plant_table(&kgup, &uretim, &ptf, &smf);
        let summary = build_monthly_summary(&rows);

        // month ratios are 100 and 400; the sum-based total is not 250
        approx(summary.months[0].birim_gelir, 100.0);
        approx(summary.months[1].birim_gelir, 400.0);
        approx(
            summary.total.birim_gelir,
            summary.total.net_gelir / summary.total.uretim,
        );
        approx(summary.total.birim_gelir, 14_000.0 / 110.0);
    }

    #[test]
    fn months_without_data_are_zero_filled() {
        let kgup = vec![point(3, 5, 0, Some(50.0))];
        let uretim = vec![point(3, 5, 0, Some(60.0))];
        let rows = build_plant_table(&kgup, &uretim, &[], &[]);
        let summary = build_monthly_summary(&rows);

        assert_eq!(summary.months.len(), 12);
        approx(summary.months[0].uretim, 0.0);
        approx(summary.months[2].uretim, 60.0);
        let summed: f64 = summary.months.iter().map(|m| m.uretim).sum();
        approx(summed, summary.total.uretim);
    }

    #[test]
    fn zero_production_month_has_zero_ratios() {
        let summary = build_monthly_summary(&[]);
        for m in &summary.months {
            approx(m.birim_gelir, 0.0);
            approx(m.birim_deng_maliyeti, 0.0);
        }
        approx(summary.total.birim_gelir, 0.0);
    }

    #[test]
    fn asymmetry_ratio_undefined_without_negative_cost() {
        // single over-generation hour: cost on the positive side only
        let kgup = vec![point(1, 1, 0, Some(100.0))];
        let uretim = vec![point(1, 1, 0, Some(120.0))];
        let ptf = vec![point(1, 1, 0, Some(500.0))];
        let smf = vec![point(1, 1, 0, Some(520.0))];
        let rows = build_plant_table(&kgup, &uretim, &ptf, &smf);

        let extras = compute_monthly_extras(&rows, 2024);
        assert_eq!(extras.asym_ratio[0], None);
    }

    #[test]
    fn capacity_factor_is_leap_year_aware() {
        let kgup = vec![point(2, 1, 0, Some(10.0))];
        let uretim = vec![point(2, 1, 0, Some(24.0))];
        let rows = build_plant_table(&kgup, &uretim, &[], &[]);

        let leap = compute_monthly_extras(&rows, 2024);
        approx(leap.capacity_factor_pct[1], 24.0 / (10.0 * 24.0 * 29.0) * 100.0);

        let common = compute_monthly_extras(&rows, 2023);
        approx(common.capacity_factor_pct[1], 24.0 / (10.0 * 24.0 * 28.0) * 100.0);
    }

    #[test]
    fn forecast_accuracy_guards_zero_plan() {
        let extras = compute_monthly_extras(&[], 2024);
        approx(extras.accuracy_pct[0], 0.0);
    }

    #[test]
    fn top5_days_and_share() {
        // six days with one under-generation hour each; costs scale by day
        let mut kgup = Vec::new();
        let mut uretim = Vec::new();
        let mut ptf = Vec::new();
        let mut smf = Vec::new();
        for d in 1..=6u32 {
            kgup.push(point(1, d, 0, Some(100.0)));
            uretim.push(point(1, d, 0, Some(100.0 - d as f64)));
            ptf.push(point(1, d, 0, Some(100.0)));
            smf.push(point(1, d, 0, Some(100.0)));
        }
        let rows = build_plant_table(&kgup, &uretim, &ptf, &smf);
        let extras = compute_monthly_extras(&rows, 2024);

        // shortfall d at neg price 103 vs clearing 100: cost = 3 * d
        let day_cost = |d: f64| d * 3.0;
        let total: f64 = (1..=6).map(|d| day_cost(d as f64)).sum();
        let top5: f64 = (2..=6).map(|d| day_cost(d as f64)).sum();
        approx(extras.top5_dm_tl[0], top5);
        approx(extras.top5_dm_share_pct[0], top5 / total * 100.0);
    }

    #[test]
    fn single_month_takes_full_year_shares() {
        let kgup = vec![point(4, 1, 0, Some(100.0)), point(4, 1, 1, Some(100.0))];
        let uretim = vec![point(4, 1, 0, Some(120.0)), point(4, 1, 1, Some(80.0))];
        let ptf = vec![point(4, 1, 0, Some(500.0)), point(4, 1, 1, Some(500.0))];
        let smf = vec![point(4, 1, 0, Some(520.0)), point(4, 1, 1, Some(520.0))];
        let rows = build_plant_table(&kgup, &uretim, &ptf, &smf);
        let extras = compute_monthly_extras(&rows, 2024);

        approx(extras.revenue_share_pct[3], 100.0);
        approx(extras.pos_share_pct[3], 100.0);
        approx(extras.neg_share_pct[3], 100.0);
        assert_eq!(extras.prod_hours[3], 2);
        approx(extras.prod_hours_share_pct[3], 100.0);
        approx(extras.prod_share_pct[3], 100.0);
        // every other month contributes nothing
        approx(extras.revenue_share_pct[0], 0.0);
        assert_eq!(extras.prod_hours[0], 0);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let kgup = vec![point(1, 1, 0, Some(100.0)), point(1, 1, 1, Some(90.0))];
        let uretim = vec![point(1, 1, 0, Some(110.0)), point(1, 1, 1, Some(85.0))];
        let ptf = vec![point(1, 1, 0, Some(500.0)), point(1, 1, 1, Some(510.0))];
        let smf = vec![point(1, 1, 0, Some(520.0)), point(1, 1, 1, Some(505.0))];

        let rows_a = build_plant_table(&kgup, &uretim, &ptf, &smf);
        let rows_b = build_plant_table(&kgup, &uretim, &ptf, &smf);
        assert_eq!(rows_a, rows_b);
        assert_eq!(
            build_monthly_summary(&rows_a).total,
            build_monthly_summary(&rows_b).total
        );
    }
}
