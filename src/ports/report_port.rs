//! Report rendering port.

use crate::domain::align::AlignedTable;
use crate::domain::error::RetvizError;
use crate::domain::instruments::Instrument;
use crate::domain::render_options::RenderOptions;
use chrono::NaiveDate;

/// Everything a renderer needs to describe one aligned table.
pub struct ExploratoryReport<'a> {
    pub instruments: &'a [Instrument],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub table: &'a AlignedTable,
    /// Rows shown in the table preview.
    pub head_rows: usize,
}

/// Port for writing exploratory reports.
pub trait ReportPort {
    fn write(
        &self,
        report: &ExploratoryReport<'_>,
        options: &RenderOptions,
        output_path: &str,
    ) -> Result<(), RetvizError>;
}
