use crate::error::AppError;
use crate::services::table::Table;

/// An image produced by a chart backend.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    /// Artifact format, e.g. "png" or "pdf".
    pub format: &'static str,
    pub bytes: Vec<u8>,
}

/// Boundary to an external chart backend. This crate ships no plotting
/// code; an embedding application supplies the implementation.
///
/// Contract: the caller hands over a table already narrowed (via
/// [`Table::select`]) to the columns the chart should draw, together with
/// one chart-type name taken from an advisor suggestion list.
/// Implementations must fall back to a default single-column chart for
/// names they do not recognize rather than failing.
pub trait Renderer {
    fn render(&self, table: &Table, chart_type: &str) -> Result<RenderedChart, AppError>;
}
