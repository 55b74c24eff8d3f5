use std::sync::Arc;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::backend::Store;
use crate::dto::admin_dto::{CandidateSummary, ResultSummary};
use crate::error::Result;
use crate::models::profile::{ProfileStatus, Role};
use crate::services::insight_service::{self, Insights};
use crate::services::result_service::ResultService;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const EMPTY_CELL: &str = "—";

#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn Store>,
    results: ResultService,
}

/// One row of the results sheet.
pub struct ResultLine {
    pub summary: ResultSummary,
    pub insights: Insights,
}

struct Palette {
    title_bg: Color,
    header_bg: Color,
    alt_row: Color,
    border: Color,
}

const PALETTE: Palette = Palette {
    title_bg: Color::RGB(0x1E293B),
    header_bg: Color::RGB(0x0F172A),
    alt_row: Color::RGB(0xF8FAFC),
    border: Color::RGB(0xE2E8F0),
};

impl ExportService {
    pub fn new(store: Arc<dyn Store>, results: ResultService) -> Self {
        Self { store, results }
    }

    /// Candidate roster and result sheets in one workbook.
    pub async fn candidates_workbook(&self, token: &str) -> Result<Vec<u8>> {
        let (profiles, tests, records, labels) = tokio::try_join!(
            self.store.list_profiles(token, Some(Role::Candidate)),
            self.store.list_tests(token),
            self.store.list_results(token),
            self.results.labels(token),
        )?;

        let candidates: Vec<CandidateSummary> = profiles
            .into_iter()
            .map(|profile| CandidateSummary {
                test_title: profile.assigned_test_id.and_then(|id| {
                    tests.iter().find(|t| t.id == id).map(|t| t.title.clone())
                }),
                profile,
            })
            .collect();
        let lines: Vec<ResultLine> = records
            .iter()
            .map(|r| ResultLine {
                summary: labels.summarize(r),
                insights: insight_service::derive(&r.payload),
            })
            .collect();

        let buffer = build_workbook(&candidates, &lines)?;
        tracing::info!(
            candidates = candidates.len(),
            results = lines.len(),
            bytes = buffer.len(),
            "candidate export generated"
        );
        Ok(buffer)
    }
}

pub fn build_workbook(candidates: &[CandidateSummary], results: &[ResultLine]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Candidates")?;
    write_candidates(sheet, candidates)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name("Results")?;
    write_results(sheet, results)?;

    Ok(workbook.save_to_buffer()?)
}

fn title_format() -> Format {
    Format::new()
        .set_font_size(16)
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(PALETTE.title_bg)
        .set_align(FormatAlign::CenterAcross)
        .set_align(FormatAlign::VerticalCenter)
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(10)
        .set_font_color(Color::White)
        .set_background_color(PALETTE.header_bg)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin)
        .set_border_color(PALETTE.border)
}

fn cell_format(idx: usize) -> Format {
    let bg = if idx % 2 == 0 { PALETTE.alt_row } else { Color::White };
    Format::new()
        .set_font_size(10)
        .set_background_color(bg)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_border_color(PALETTE.border)
}

fn status_color(status: ProfileStatus) -> Color {
    match status {
        ProfileStatus::Pending => Color::RGB(0x3B82F6),
        ProfileStatus::InProgress => Color::RGB(0xF59E0B),
        ProfileStatus::Completed => Color::RGB(0x10B981),
    }
}

/// Title, header row and column widths. Returns the first data row.
fn write_frame(
    sheet: &mut Worksheet,
    title: &str,
    columns: &[(&str, f64)],
) -> Result<u32> {
    let last_col = (columns.len() - 1) as u16;
    for (i, (_, width)) in columns.iter().enumerate() {
        sheet.set_column_width(i as u16, *width)?;
    }

    sheet.set_row_height(0, 36)?;
    sheet.merge_range(0, 0, 0, last_col, title, &title_format())?;

    let header = header_format();
    sheet.set_row_height(1, 28)?;
    for (i, (name, _)) in columns.iter().enumerate() {
        sheet.write_string_with_format(1, i as u16, *name, &header)?;
    }
    sheet.set_freeze_panes(2, 0)?;
    Ok(2)
}

fn write_candidates(sheet: &mut Worksheet, candidates: &[CandidateSummary]) -> Result<()> {
    let columns = [
        ("#", 6.0),
        ("Name", 28.0),
        ("Email", 30.0),
        ("Status", 14.0),
        ("Assigned test", 30.0),
        ("Score", 10.0),
        ("Completed on", 16.0),
        ("Registered", 18.0),
    ];
    let first = write_frame(sheet, "Candidates", &columns)?;

    for (idx, c) in candidates.iter().enumerate() {
        let row = first + idx as u32;
        let base = cell_format(idx);
        let center = base.clone().set_align(FormatAlign::Center);
        let p = &c.profile;

        sheet.write_number_with_format(row, 0, (idx + 1) as f64, &center)?;
        sheet.write_string_with_format(row, 1, p.display_name(), &base.clone().set_bold())?;
        sheet.write_string_with_format(row, 2, &p.email, &base)?;

        let status_fmt = center
            .clone()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(status_color(p.status));
        sheet.write_string_with_format(row, 3, p.status.as_str(), &status_fmt)?;

        sheet.write_string_with_format(
            row,
            4,
            c.test_title.as_deref().unwrap_or(EMPTY_CELL),
            &base,
        )?;
        match p.score {
            Some(score) => sheet.write_number_with_format(row, 5, score, &center)?,
            None => sheet.write_string_with_format(row, 5, EMPTY_CELL, &center)?,
        };
        let completed = p
            .completion_date
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| EMPTY_CELL.to_string());
        sheet.write_string_with_format(row, 6, &completed, &center)?;
        let created = p
            .created_at
            .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
            .unwrap_or_else(|| EMPTY_CELL.to_string());
        sheet.write_string_with_format(row, 7, &created, &center)?;
    }

    let last_row = first + candidates.len() as u32 - 1;
    sheet.autofilter(first - 1, 0, last_row, (columns.len() - 1) as u16)?;
    Ok(())
}

fn write_results(sheet: &mut Worksheet, results: &[ResultLine]) -> Result<()> {
    let columns = [
        ("#", 6.0),
        ("Candidate", 28.0),
        ("Test", 30.0),
        ("Submitted", 18.0),
        ("Top competency", 18.0),
        ("Summary", 60.0),
    ];
    let first = write_frame(sheet, "Results", &columns)?;

    for (idx, line) in results.iter().enumerate() {
        let row = first + idx as u32;
        let base = cell_format(idx);
        let center = base.clone().set_align(FormatAlign::Center);
        let s = &line.summary;

        sheet.write_number_with_format(row, 0, (idx + 1) as f64, &center)?;
        sheet.write_string_with_format(row, 1, &s.candidate_name, &base.clone().set_bold())?;
        sheet.write_string_with_format(row, 2, &s.test_title, &base)?;
        let submitted = s
            .created_at
            .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
            .unwrap_or_else(|| EMPTY_CELL.to_string());
        sheet.write_string_with_format(row, 3, &submitted, &center)?;
        sheet.write_string_with_format(
            row,
            4,
            line.insights.top_competency().unwrap_or(EMPTY_CELL),
            &center,
        )?;
        sheet.write_string_with_format(
            row,
            5,
            line.insights.summary.as_deref().unwrap_or(EMPTY_CELL),
            &base.clone().set_text_wrap(),
        )?;
    }
    Ok(())
}
