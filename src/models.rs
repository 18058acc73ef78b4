use chrono::{NaiveDate, NaiveDateTime};

/// Identity of a plant across the four Transparency Platform series.
/// KGÜP requests are keyed by organization + UEVÇB, realized generation
/// by the power plant id.
#[derive(Debug, Clone)]
pub struct PlantMeta {
    pub power_plant_name: String,
    pub organization_id: i64,
    pub power_plant_id: i64,
    pub uevcb_id: i64,
}

/// One normalized observation from a single upstream series.
/// `value` is `None` when the upstream field was missing or not numeric;
/// the unknown state is kept distinct from zero through the join.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint {
    pub ts: NaiveDateTime,
    pub day: NaiveDate,
    pub hour: String,
    pub value: Option<f64>,
}

/// Canonical per-hour settlement row after joining the four series.
/// Every numeric field is optional: `None` means unknown, which is only
/// collapsed to 0.0 at the two sites the settlement formula calls for
/// (imbalance amount on unknown volume, unit cost on unknown/zero
/// production).
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRow {
    pub ts: NaiveDateTime,
    pub day: NaiveDate,
    pub month: u32,
    pub hour: String,
    pub ptf: Option<f64>,
    pub smf: Option<f64>,
    pub poz_df: Option<f64>,
    pub neg_df: Option<f64>,
    pub kgup: Option<f64>,
    pub uretim: Option<f64>,
    pub dengesizlik: Option<f64>,
    pub gop_geliri: Option<f64>,
    pub dengesizlik_tutari: Option<f64>,
    pub net_gelir: Option<f64>,
    pub dengesizlik_maliyeti: Option<f64>,
    pub birim_dm: Option<f64>,
}

/// Monthly sums of the flow quantities plus the two per-unit ratios
/// computed from the sums (never from averaged hourly ratios).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyRow {
    pub month: u32,
    pub uretim: f64,
    pub dengesizlik: f64,
    pub gop_geliri: f64,
    pub dengesizlik_tutari: f64,
    pub net_gelir: f64,
    pub dengesizlik_maliyeti: f64,
    pub birim_gelir: f64,
    pub birim_deng_maliyeti: f64,
}

/// Fixed 12-month table (zero-filled where no data) plus the totals row.
#[derive(Debug, Clone)]
pub struct MonthlySummary {
    pub months: Vec<MonthlyRow>,
    pub total: MonthlyRow,
}

/// Extended per-month KPIs, one entry per calendar month 1..=12.
/// The cost-asymmetry ratio stays `None` when its denominator is zero;
/// it is rendered blank, not coerced to zero.
#[derive(Debug, Clone)]
pub struct MonthlyExtras {
    pub accuracy_pct: Vec<f64>,
    pub asym_ratio: Vec<Option<f64>>,
    pub capacity_factor_pct: Vec<f64>,
    pub top5_dm_tl: Vec<f64>,
    pub top5_dm_share_pct: Vec<f64>,
    pub revenue_share_pct: Vec<f64>,
    pub pos_share_pct: Vec<f64>,
    pub neg_share_pct: Vec<f64>,
    pub prod_hours: Vec<u32>,
    pub prod_hours_share_pct: Vec<f64>,
    pub prod_share_pct: Vec<f64>,
}

/// Detail-sheet column headers, in the exact output order.
pub const DETAIL_HEADERS: [&str; 15] = [
    "Tarih",
    "Ay",
    "Saat",
    "PTF",
    "SMF",
    "Pozitif Dengesizlik Fiyatı",
    "Negatif Dengesizlik Fiyatı",
    "Gün Öncesi Üretim Tahmini (KGÜP)",
    "Gerçekleşen Üretim",
    "Dengesizlik Miktarı",
    "GÖP Geliri",
    "Dengesizlik Tutarı",
    "Toplam (Net) Gelir",
    "Dengesizlik Maliyeti",
    "Birim Dengesizlik Maliyeti",
];

/// Summary columns of a comparison block; the cells under these are
/// live formulas against the detail sheet.
pub const BASE_HEADERS: [&str; 9] = [
    "Ay",
    "Gerçekleşen Üretim  (MWh)",
    "Dengesizlik Miktarı  (MWh)",
    "GÖP Geliri (TL)",
    "Dengesizlik Tutarı (TL)",
    "Toplam Gelir (TL)",
    "Birim Gelir (TL/MWh)",
    "Dengesizlik Maliyeti (TL)",
    "Birim Deng Mal. (TL/MWh)",
];

/// Extended KPI columns; written as precomputed static values.
pub const EXTRA_HEADERS: [&str; 11] = [
    "Tahmin Doğruluğu (%)",
    "Maliyet Asimetrisi (Poz/Neg)",
    "Kapasite Faktörü (%)",
    "En Maliyetli 5 Gün (TL)",
    "Top 5 Gün DM Payı (%)",
    "Gelir Payı (%)",
    "Yıllık Pozitif Deng. Payı (%)",
    "Yıllık Negatif Deng. Payı (%)",
    "Üretim Saati (saat)",
    "Üretim Saat Payı (%)",
    "Üretim Payı (%)",
];
