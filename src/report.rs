use rust_xlsxwriter::{
    Format, FormatAlign, Table, TableColumn, TableStyle, Workbook, Worksheet, XlsxError,
};

use crate::models::{HourlyRow, MonthlyExtras, BASE_HEADERS, DETAIL_HEADERS, EXTRA_HEADERS};

pub const SHEET_PLANT_1: &str = "Santral_1";
pub const SHEET_PLANT_2: &str = "Santral_2";
pub const SHEET_COMPARISON: &str = "Karşılaştırma";

/// Rows a comparison block occupies: title, spacer, header, 12 months,
/// totals.
const BLOCK_ROWS: usize = 16;
/// Gap between the first block's totals row and the second block's title.
const BLOCK_GAP: usize = 3;

/// Content of one comparison-sheet cell. Which KPI is a live formula
/// and which is a precomputed value is decided at grid-assembly time,
/// independent of the spreadsheet writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Label(String),
    Int(i64),
    Number(f64),
    Formula(String),
    Blank,
}

/// Zero-based column index to spreadsheet letters (bijective base-26):
/// 0 -> A, 25 -> Z, 26 -> AA.
pub fn col_letter(idx: usize) -> String {
    let mut letters = Vec::new();
    let mut idx = idx;
    loop {
        let rem = idx % 26;
        letters.push(char::from(b'A' + rem as u8));
        idx /= 26;
        if idx == 0 {
            break;
        }
        idx -= 1;
    }
    letters.iter().rev().collect()
}

fn detail_letter(name: &str) -> String {
    DETAIL_HEADERS
        .iter()
        .position(|h| *h == name)
        .map(col_letter)
        .unwrap_or_default()
}

/// `SUMIF` over the detail sheet's month column, summing `col_name` for
/// the month referenced by `month_ref`.
fn sumif(sheet: &str, col_name: &str, last_row: usize, month_ref: &str) -> String {
    let month_col = detail_letter("Ay");
    let col = detail_letter(col_name);
    format!(
        "=SUMIF('{sheet}'!${month_col}$2:${month_col}${last_row},{month_ref},'{sheet}'!${col}$2:${col}${last_row})"
    )
}

fn extras_cell(v: Option<f64>) -> Cell {
    match v {
        Some(v) => Cell::Number(v),
        None => Cell::Blank,
    }
}

/// Assemble one plant's comparison block. `start_row` is the absolute
/// zero-based sheet row the block begins at; the formulas baked into
/// the cells reference absolute positions, so the block must be written
/// at exactly that row. The 9 summary columns are formulas against the
/// detail sheet; the 11 extended columns are static values.
pub fn comparison_block(
    title: &str,
    sheet: &str,
    n_detail_rows: usize,
    start_row: usize,
    extras: &MonthlyExtras,
) -> Vec<Vec<Cell>> {
    let last_row = n_detail_rows + 1; // detail data starts at Excel row 2
    let mut block: Vec<Vec<Cell>> = Vec::with_capacity(BLOCK_ROWS);

    block.push(vec![Cell::Label(title.to_string())]);
    block.push(Vec::new());
    block.push(
        BASE_HEADERS
            .iter()
            .chain(EXTRA_HEADERS.iter())
            .map(|h| Cell::Label((*h).to_string()))
            .collect(),
    );

    for i in 0..12 {
        let excel_row = start_row + 3 + i + 1;
        let mref = format!("A{excel_row}");
        let mut row = vec![
            Cell::Int(i as i64 + 1),
            Cell::Formula(sumif(sheet, "Gerçekleşen Üretim", last_row, &mref)),
            Cell::Formula(sumif(sheet, "Dengesizlik Miktarı", last_row, &mref)),
            Cell::Formula(sumif(sheet, "GÖP Geliri", last_row, &mref)),
            Cell::Formula(sumif(sheet, "Dengesizlik Tutarı", last_row, &mref)),
            Cell::Formula(sumif(sheet, "Toplam (Net) Gelir", last_row, &mref)),
            Cell::Formula(format!("=IF(B{excel_row}=0,0,F{excel_row}/B{excel_row})")),
            Cell::Formula(sumif(sheet, "Dengesizlik Maliyeti", last_row, &mref)),
            Cell::Formula(format!("=IF(B{excel_row}=0,0,H{excel_row}/B{excel_row})")),
        ];
        row.push(Cell::Number(extras.accuracy_pct[i]));
        row.push(extras_cell(extras.asym_ratio[i]));
        row.push(Cell::Number(extras.capacity_factor_pct[i]));
        row.push(Cell::Number(extras.top5_dm_tl[i]));
        row.push(Cell::Number(extras.top5_dm_share_pct[i]));
        row.push(Cell::Number(extras.revenue_share_pct[i]));
        row.push(Cell::Number(extras.pos_share_pct[i]));
        row.push(Cell::Number(extras.neg_share_pct[i]));
        row.push(Cell::Int(extras.prod_hours[i] as i64));
        row.push(Cell::Number(extras.prod_hours_share_pct[i]));
        row.push(Cell::Number(extras.prod_share_pct[i]));
        block.push(row);
    }

    // the totals row sums the 12 formula cells above it, it is not a
    // separately computed value
    let first = start_row + 3 + 1;
    let last = start_row + 3 + 12;
    let total_excel = start_row + BLOCK_ROWS;
    let sum_over = |col: &str| Cell::Formula(format!("=SUM({col}{first}:{col}{last})"));
    let mut total = vec![
        Cell::Label("Toplam".to_string()),
        sum_over("B"),
        sum_over("C"),
        sum_over("D"),
        sum_over("E"),
        sum_over("F"),
        Cell::Formula(format!("=IF(B{total_excel}=0,0,F{total_excel}/B{total_excel})")),
        sum_over("H"),
        Cell::Formula(format!("=IF(B{total_excel}=0,0,H{total_excel}/B{total_excel})")),
    ];
    total.extend(std::iter::repeat(Cell::Blank).take(EXTRA_HEADERS.len()));
    let top5_idx = BASE_HEADERS.len() + 3;
    total[top5_idx] = sum_over(&col_letter(top5_idx));
    let prod_hours_idx = BASE_HEADERS.len() + 8;
    total[prod_hours_idx] = sum_over(&col_letter(prod_hours_idx));
    block.push(total);

    block
}

struct ReportFormats {
    head: Format,
    num: Format,
    int: Format,
    title: Format,
}

impl ReportFormats {
    fn new() -> Self {
        Self {
            head: Format::new()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            num: Format::new().set_num_format("#,##0.00"),
            int: Format::new().set_num_format("0"),
            title: Format::new().set_bold().set_font_size(14),
        }
    }
}

fn detail_width(name: &str) -> f64 {
    match name {
        "Tarih" => 19.0,
        "Ay" => 6.0,
        "Saat" => 7.0,
        _ => 16.0,
    }
}

fn comparison_width(name: &str) -> f64 {
    match name {
        "Ay" => 6.0,
        "Gerçekleşen Üretim  (MWh)" | "Dengesizlik Miktarı  (MWh)" => 18.0,
        "GÖP Geliri (TL)" | "Dengesizlik Tutarı (TL)" | "Toplam Gelir (TL)" => 20.0,
        "Dengesizlik Maliyeti (TL)" | "En Maliyetli 5 Gün (TL)" => 20.0,
        "Birim Deng Mal. (TL/MWh)" | "Maliyet Asimetrisi (Poz/Neg)" => 18.0,
        "Yıllık Pozitif Deng. Payı (%)" | "Yıllık Negatif Deng. Payı (%)" => 18.0,
        "Tahmin Doğruluğu (%)" | "Kapasite Faktörü (%)" | "Gelir Payı (%)" => 14.0,
        "Üretim Payı (%)" => 14.0,
        _ => 16.0,
    }
}

/// One detail sheet: an hourly row per line, styled as a frozen-header
/// table with per-column widths and numeric formats. Unknown values are
/// left blank, never written as zero.
fn write_detail_sheet(
    ws: &mut Worksheet,
    rows: &[HourlyRow],
    fmts: &ReportFormats,
) -> Result<(), XlsxError> {
    for (r, row) in rows.iter().enumerate() {
        let excel_r = (r + 1) as u32;
        ws.write_string(excel_r, 0, row.day.format("%Y-%m-%d").to_string())?;
        ws.write_number_with_format(excel_r, 1, f64::from(row.month), &fmts.int)?;
        ws.write_string(excel_r, 2, row.hour.as_str())?;
        let values = [
            row.ptf,
            row.smf,
            row.poz_df,
            row.neg_df,
            row.kgup,
            row.uretim,
            row.dengesizlik,
            row.gop_geliri,
            row.dengesizlik_tutari,
            row.net_gelir,
            row.dengesizlik_maliyeti,
            row.birim_dm,
        ];
        for (j, value) in values.iter().enumerate() {
            if let Some(v) = value {
                ws.write_number_with_format(excel_r, (3 + j) as u16, *v, &fmts.num)?;
            }
        }
    }

    let columns: Vec<TableColumn> = DETAIL_HEADERS
        .iter()
        .map(|h| TableColumn::new().set_header(*h))
        .collect();
    let table = Table::new()
        .set_style(TableStyle::Light9)
        .set_columns(&columns);
    ws.add_table(0, 0, rows.len() as u32, (DETAIL_HEADERS.len() - 1) as u16, &table)?;

    for (i, h) in DETAIL_HEADERS.iter().enumerate() {
        ws.set_column_width(i as u16, detail_width(h))?;
    }
    ws.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_block(
    ws: &mut Worksheet,
    block: &[Vec<Cell>],
    start_row: u32,
    fmts: &ReportFormats,
) -> Result<(), XlsxError> {
    let prod_hours_col = BASE_HEADERS.len() + 8;
    for (i, row) in block.iter().enumerate() {
        let r = start_row + i as u32;
        for (j, cell) in row.iter().enumerate() {
            let c = j as u16;
            match cell {
                Cell::Label(s) => {
                    let fmt = if i == 0 { &fmts.title } else { &fmts.head };
                    ws.write_string_with_format(r, c, s.as_str(), fmt)?;
                }
                Cell::Int(v) => {
                    ws.write_number_with_format(r, c, *v as f64, &fmts.int)?;
                }
                Cell::Number(v) => {
                    ws.write_number_with_format(r, c, *v, &fmts.num)?;
                }
                Cell::Formula(f) => {
                    let fmt = if j == prod_hours_col { &fmts.int } else { &fmts.num };
                    ws.write_formula_with_format(r, c, f.as_str(), fmt)?;
                }
                Cell::Blank => {}
            }
        }
    }
    Ok(())
}

/// Build the three-sheet workbook: two hourly detail sheets and the
/// comparison sheet whose summary columns recalculate live from the
/// detail sheets. Returns the serialized xlsx bytes.
pub fn build_report(
    rows1: &[HourlyRow],
    extras1: &MonthlyExtras,
    rows2: &[HourlyRow],
    extras2: &MonthlyExtras,
) -> Result<Vec<u8>, XlsxError> {
    let fmts = ReportFormats::new();
    let mut workbook = Workbook::new();

    let ws1 = workbook.add_worksheet().set_name(SHEET_PLANT_1)?;
    write_detail_sheet(ws1, rows1, &fmts)?;
    let ws2 = workbook.add_worksheet().set_name(SHEET_PLANT_2)?;
    write_detail_sheet(ws2, rows2, &fmts)?;

    let start2 = BLOCK_ROWS + BLOCK_GAP - 1;
    let block1 = comparison_block("Santral 1", SHEET_PLANT_1, rows1.len(), 0, extras1);
    let block2 = comparison_block("Santral 2", SHEET_PLANT_2, rows2.len(), start2, extras2);

    let wsc = workbook.add_worksheet().set_name(SHEET_COMPARISON)?;
    write_block(wsc, &block1, 0, &fmts)?;
    write_block(wsc, &block2, start2 as u32, &fmts)?;
    for (j, h) in BASE_HEADERS.iter().chain(EXTRA_HEADERS.iter()).enumerate() {
        wsc.set_column_width(j as u16, comparison_width(h))?;
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_extras() -> MonthlyExtras {
        MonthlyExtras {
            accuracy_pct: vec![0.0; 12],
            asym_ratio: vec![None; 12],
            capacity_factor_pct: vec![0.0; 12],
            top5_dm_tl: vec![0.0; 12],
            top5_dm_share_pct: vec![0.0; 12],
            revenue_share_pct: vec![0.0; 12],
            pos_share_pct: vec![0.0; 12],
            neg_share_pct: vec![0.0; 12],
            prod_hours: vec![0; 12],
            prod_hours_share_pct: vec![0.0; 12],
            prod_share_pct: vec![0.0; 12],
        }
    }

    #[test]
    fn col_letter_bijective_base26() {
        assert_eq!(col_letter(0), "A");
        assert_eq!(col_letter(1), "B");
        assert_eq!(col_letter(25), "Z");
        assert_eq!(col_letter(26), "AA");
        assert_eq!(col_letter(51), "AZ");
        assert_eq!(col_letter(52), "BA");
        assert_eq!(col_letter(701), "ZZ");
        assert_eq!(col_letter(702), "AAA");
    }

    #[test]
    fn detail_letters_resolve() {
        assert_eq!(detail_letter("Ay"), "B");
        assert_eq!(detail_letter("Gerçekleşen Üretim"), "I");
        assert_eq!(detail_letter("Dengesizlik Maliyeti"), "N");
    }

    #[test]
    fn block_shape_and_headers() {
        let block = comparison_block("Santral 1", SHEET_PLANT_1, 744, 0, &empty_extras());
        assert_eq!(block.len(), BLOCK_ROWS);
        assert_eq!(block[2].len(), 20);
        assert_eq!(block[2][0], Cell::Label("Ay".to_string()));
        // 12 month rows then totals
        assert_eq!(block[3][0], Cell::Int(1));
        assert_eq!(block[14][0], Cell::Int(12));
        assert_eq!(block[15][0], Cell::Label("Toplam".to_string()));
    }

    #[test]
    fn month_cells_are_live_sumif_formulas() {
        let block = comparison_block("Santral 1", SHEET_PLANT_1, 744, 0, &empty_extras());
        let Cell::Formula(f) = &block[3][1] else {
            panic!("expected formula");
        };
        assert_eq!(
            f,
            "=SUMIF('Santral_1'!$B$2:$B$745,A4,'Santral_1'!$I$2:$I$745)"
        );
        let Cell::Formula(unit) = &block[3][6] else {
            panic!("expected formula");
        };
        assert_eq!(unit, "=IF(B4=0,0,F4/B4)");
    }

    #[test]
    fn totals_row_sums_the_formula_cells() {
        let block = comparison_block("Santral 1", SHEET_PLANT_1, 744, 0, &empty_extras());
        assert_eq!(block[15][1], Cell::Formula("=SUM(B4:B15)".to_string()));
        assert_eq!(
            block[15][6],
            Cell::Formula("=IF(B16=0,0,F16/B16)".to_string())
        );
        // static extended columns total only where the original does
        assert_eq!(block[15][12], Cell::Formula("=SUM(M4:M15)".to_string()));
        assert_eq!(block[15][17], Cell::Formula("=SUM(R4:R15)".to_string()));
        assert_eq!(block[15][9], Cell::Blank);
    }

    #[test]
    fn second_block_references_its_own_rows() {
        let block = comparison_block("Santral 2", SHEET_PLANT_2, 100, 18, &empty_extras());
        let Cell::Formula(f) = &block[3][1] else {
            panic!("expected formula");
        };
        assert_eq!(
            f,
            "=SUMIF('Santral_2'!$B$2:$B$101,A22,'Santral_2'!$I$2:$I$101)"
        );
        assert_eq!(block[15][1], Cell::Formula("=SUM(B22:B33)".to_string()));
    }

    #[test]
    fn undefined_asymmetry_renders_blank() {
        let mut extras = empty_extras();
        extras.asym_ratio[0] = Some(1.5);
        let block = comparison_block("Santral 1", SHEET_PLANT_1, 10, 0, &extras);
        assert_eq!(block[3][10], Cell::Number(1.5));
        assert_eq!(block[4][10], Cell::Blank);
    }

    #[test]
    fn workbook_serializes() {
        use crate::models::TimePoint;
        use crate::settlement::build_plant_table;
        use chrono::NaiveDate;

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let point = |h: u32, v: f64| TimePoint {
            ts: day.and_hms_opt(h, 0, 0).unwrap(),
            day,
            hour: format!("{h:02}:00"),
            value: Some(v),
        };
        let kgup: Vec<_> = (0..24).map(|h| point(h, 100.0)).collect();
        let uretim: Vec<_> = (0..24).map(|h| point(h, 110.0)).collect();
        let ptf: Vec<_> = (0..24).map(|h| point(h, 500.0)).collect();
        let smf: Vec<_> = (0..24).map(|h| point(h, 510.0)).collect();
        let rows = build_plant_table(&kgup, &uretim, &ptf, &smf);

        let extras = crate::monthly::compute_monthly_extras(&rows, 2024);
        let bytes = build_report(&rows, &extras, &rows, &extras).unwrap();
        // xlsx is a zip container, PK signature
        assert!(bytes.len() > 4);
        assert!(bytes.starts_with(b"PK"));
    }
}
