//! Settlement document export.
//!
//! Renders an already-computed [`Settlement`] into a one-page A4 PDF: title,
//! driver, period, then an item/amount table. Nothing here recomputes totals.
//!
//! Hangul needs a TrueType font; without one the document falls back to a
//! built-in Latin font with English labels.

use super::payout::Settlement;
use crate::{
    config::ExportSettings,
    errors::{Error, Result},
};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use std::path::PathBuf;
use tracing::{debug, info};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const AMOUNT_COLUMN: f32 = 115.0;
const ROW_HEIGHT: f32 = 9.0;

/// Text used on the document.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub title: &'static str,
    pub driver: &'static str,
    pub period: &'static str,
    pub item: &'static str,
    pub amount: &'static str,
    pub delivery_count: &'static str,
    pub return_count: &'static str,
    pub total_count: &'static str,
    pub driver_income: &'static str,
    pub ins_emp: &'static str,
    pub ins_ind: &'static str,
    pub rental: &'static str,
    pub damage: &'static str,
    pub etc: &'static str,
    pub freshback: &'static str,
    pub final_pay: &'static str,
    pub currency_suffix: &'static str,
    pub file_prefix: &'static str,
}

/// Labels used with a Hangul-capable font.
pub const KOREAN_LABELS: Labels = Labels {
    title: "잇쿠 기사 정산서",
    driver: "기사명",
    period: "정산 기간",
    item: "항목",
    amount: "금액 (원)",
    delivery_count: "배송 건수",
    return_count: "반품 건수",
    total_count: "총 건수",
    driver_income: "기사 수익",
    ins_emp: "고용보험",
    ins_ind: "산재보험",
    rental: "운송지원비",
    damage: "파손/분실",
    etc: "기타 차감",
    freshback: "프레시백 수익",
    final_pay: "실지급액",
    currency_suffix: "원",
    file_prefix: "정산서",
};

/// Labels used with the built-in Latin font.
pub const ENGLISH_LABELS: Labels = Labels {
    title: "Itkoo Driver Settlement",
    driver: "Driver",
    period: "Period",
    item: "Item",
    amount: "Amount (KRW)",
    delivery_count: "Deliveries",
    return_count: "Returns",
    total_count: "Total units",
    driver_income: "Driver income",
    ins_emp: "Employment insurance",
    ins_ind: "Industrial insurance",
    rental: "Transport support fee",
    damage: "Damage / loss",
    etc: "Other deductions",
    freshback: "Freshback",
    final_pay: "Final pay",
    currency_suffix: " KRW",
    file_prefix: "settlement",
};

/// Formats an integer with thousands separators, e.g. `1234567` -> `1,234,567`.
#[must_use]
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a won amount with separators and the currency suffix.
#[must_use]
pub fn format_amount(value: i64, labels: &Labels) -> String {
    format!("{}{}", format_thousands(value), labels.currency_suffix)
}

/// The item/amount rows of the settlement table, in print order.
#[must_use]
pub fn settlement_rows(settlement: &Settlement, labels: &Labels) -> Vec<(&'static str, String)> {
    let summary = &settlement.summary;
    let d = &settlement.deductions;
    vec![
        (labels.delivery_count, format_thousands(summary.total_delivery)),
        (labels.return_count, format_thousands(summary.total_return)),
        (labels.total_count, format_thousands(summary.total_count)),
        (labels.driver_income, format_amount(summary.driver_income, labels)),
        (labels.ins_emp, format_amount(d.ins_emp, labels)),
        (labels.ins_ind, format_amount(d.ins_ind, labels)),
        (labels.rental, format_amount(d.rental, labels)),
        (labels.damage, format_amount(d.damage, labels)),
        (labels.etc, format_amount(d.etc, labels)),
        (labels.freshback, format_amount(d.freshback, labels)),
        (labels.final_pay, format_amount(settlement.final_pay, labels)),
    ]
}

/// Renders the settlement document and returns the PDF bytes.
pub fn export_settlement_document(
    settlement: &Settlement,
    settings: &ExportSettings,
) -> Result<Vec<u8>> {
    let labels = labels_for(settings);
    let (doc, page, layer) =
        PdfDocument::new(labels.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "settlement");
    let layer = doc.get_page(page).get_layer(layer);

    let font = match &settings.font_path {
        Some(path) => {
            debug!("Loading document font {}", path.display());
            let file = std::fs::File::open(path)?;
            doc.add_external_font(file).map_err(export_error)?
        }
        None => doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(export_error)?,
    };

    let summary = &settlement.summary;
    let mut y = PAGE_HEIGHT - MARGIN - 5.0;
    layer.use_text(labels.title, 18.0, Mm(MARGIN + 45.0), Mm(y), &font);
    y -= 15.0;
    layer.use_text(
        format!("{}: {} ({})", labels.driver, summary.name, summary.email),
        11.0,
        Mm(MARGIN),
        Mm(y),
        &font,
    );
    y -= 7.0;
    layer.use_text(
        format!("{}: {}", labels.period, settlement.period),
        11.0,
        Mm(MARGIN),
        Mm(y),
        &font,
    );
    y -= 14.0;

    draw_row(&layer, &font, y, labels.item, labels.amount);
    y -= 3.0;
    rule(&layer, y);
    y -= ROW_HEIGHT - 3.0;
    for (item, amount) in settlement_rows(settlement, &labels) {
        draw_row(&layer, &font, y, item, &amount);
        y -= 3.0;
        rule(&layer, y);
        y -= ROW_HEIGHT - 3.0;
    }

    doc.save_to_bytes().map_err(export_error)
}

/// File name for a settlement document:
/// `{prefix}_{driver name}_{start}_{end}.pdf`.
#[must_use]
pub fn document_file_name(settlement: &Settlement, settings: &ExportSettings) -> String {
    let labels = labels_for(settings);
    let name: String = settlement
        .summary
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!(
        "{}_{}_{}_{}.pdf",
        labels.file_prefix, name, settlement.period.start_date, settlement.period.end_date
    )
}

/// Renders the document and writes it to `output` or, when `None`, into the
/// configured output directory under [`document_file_name`].
pub fn write_settlement_document(
    settlement: &Settlement,
    settings: &ExportSettings,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let bytes = export_settlement_document(settlement, settings)?;
    let path = output
        .unwrap_or_else(|| settings.output_dir.join(document_file_name(settlement, settings)));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, bytes)?;
    info!("Settlement document written to {}", path.display());
    Ok(path)
}

const fn labels_for(settings: &ExportSettings) -> Labels {
    if settings.font_path.is_some() {
        KOREAN_LABELS
    } else {
        ENGLISH_LABELS
    }
}

fn draw_row(layer: &PdfLayerReference, font: &IndirectFontRef, y: f32, item: &str, amount: &str) {
    layer.use_text(item, 11.0, Mm(MARGIN + 2.0), Mm(y), font);
    layer.use_text(amount, 11.0, Mm(AMOUNT_COLUMN), Mm(y), font);
}

fn rule(layer: &PdfLayerReference, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn export_error(e: impl std::fmt::Display) -> Error {
    Error::Export {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        config::SettlementPolicy,
        core::{aggregation::Period, payout::Deductions},
        test_utils::*,
    };

    fn scenario_settlement() -> Settlement {
        Settlement::compute(
            Period::new("2024-05-01", "2024-05-31").unwrap(),
            test_summary("u1", 54_500),
            Deductions {
                ins_emp: 10_000,
                ins_ind: 5_000,
                rental: 0,
                damage: 0,
                etc: 2_000,
                freshback: 3_000,
            },
            &SettlementPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(54_500), "54,500");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(-17_000), "-17,000");
    }

    #[test]
    fn test_format_amount_suffix() {
        assert_eq!(format_amount(40_500, &KOREAN_LABELS), "40,500원");
        assert_eq!(format_amount(40_500, &ENGLISH_LABELS), "40,500 KRW");
    }

    #[test]
    fn test_rows_use_computed_settlement() {
        let settlement = scenario_settlement();
        let rows = settlement_rows(&settlement, &KOREAN_LABELS);

        assert_eq!(rows.len(), 11);
        assert_eq!(rows[3], ("기사 수익", "54,500원".to_string()));
        assert_eq!(rows[9], ("프레시백 수익", "3,000원".to_string()));
        assert_eq!(rows[10], ("실지급액", "40,500원".to_string()));
    }

    #[test]
    fn test_export_produces_pdf_bytes() {
        let bytes =
            export_settlement_document(&scenario_settlement(), &ExportSettings::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let settings = ExportSettings {
            font_path: Some(PathBuf::from("no/such/font.ttf")),
            ..ExportSettings::default()
        };
        let result = export_settlement_document(&scenario_settlement(), &settings);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_document_file_name() {
        let settlement = scenario_settlement();
        assert_eq!(
            document_file_name(&settlement, &ExportSettings::default()),
            "settlement_Driver_u1_2024-05-01_2024-05-31.pdf"
        );
    }
}
