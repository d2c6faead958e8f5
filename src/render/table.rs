use thiserror::Error;

/// Raised when a row does not have one cell per column. Always a bug in the
/// caller, never a data condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("table row {row} has {actual} cells, expected {expected}")]
pub struct TableShapeError {
    pub row: usize,
    pub expected: usize,
    pub actual: usize,
}

/// Column labels plus rows, checked for arity as rows are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec {
    column_labels: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableSpec {
    pub fn new<S: AsRef<str>>(column_labels: &[S]) -> Self {
        Self {
            column_labels: column_labels.iter().map(|s| s.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), TableShapeError> {
        if row.len() != self.column_labels.len() {
            return Err(TableShapeError {
                row: self.rows.len(),
                expected: self.column_labels.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render(&self) -> Result<String, TableShapeError> {
        render_table(&self.column_labels, &self.rows)
    }
}

/// Renders the one table markup every generated notice uses.
///
/// The attribute order and quoting must not change; previously generated
/// notices are compared against this output.
pub fn render_table<L: AsRef<str>, C: AsRef<str>>(
    column_labels: &[L],
    rows: &[Vec<C>],
) -> Result<String, TableShapeError> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != column_labels.len() {
            return Err(TableShapeError {
                row: i,
                expected: column_labels.len(),
                actual: row.len(),
            });
        }
    }

    let mut html = String::from(
        "<table style='font-family:\"Arial\"; font-size:12px' role='grid' border='1' cellspacing='0'>",
    );

    html.push_str("<colgroup>");
    for _ in column_labels {
        html.push_str("<col>");
    }
    html.push_str("</colgroup>");

    html.push_str("<thead><tr>");
    for label in column_labels {
        html.push_str("<th><div>");
        html.push_str(&escape_html(label.as_ref()));
        html.push_str("</div></th>");
    }
    html.push_str("</tr></thead>");

    html.push_str("<tbody>");
    for row in rows {
        html.push_str("<tr role='row'>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_html(cell.as_ref()));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    Ok(html)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const KING_KONG_TABLE: &str = "<table style='font-family:\"Arial\"; font-size:12px' role='grid' border='1' cellspacing='0'>\
<colgroup><col><col><col><col></colgroup>\
<thead><tr><th><div>Role</div></th><th><div>Name</div></th><th><div>Type</div></th><th><div>Address</div></th></tr></thead>\
<tbody><tr role='row'><td>Owner</td><td>King Kong</td><td>INDIVIDUAL</td><td>12B High St, Huang Thai, Kin Toe, 12345</td></tr></tbody></table>";

    #[test]
    fn test_render_table_exact_markup() {
        let rows = vec![vec!["Owner", "King Kong", "INDIVIDUAL", "12B High St, Huang Thai, Kin Toe, 12345"]];
        let html = render_table(&["Role", "Name", "Type", "Address"], &rows).unwrap();
        assert_eq!(html, KING_KONG_TABLE);
    }

    #[test]
    fn test_render_table_is_deterministic() {
        let rows = vec![vec!["Owner", "King Kong", "INDIVIDUAL", "12B High St, Huang Thai, Kin Toe, 12345"]];
        let first = render_table(&["Role", "Name", "Type", "Address"], &rows).unwrap();
        for _ in 0..5 {
            assert_eq!(render_table(&["Role", "Name", "Type", "Address"], &rows).unwrap(), first);
        }
    }

    #[test]
    fn test_arity_mismatch_fails_fast() {
        let rows = vec![vec!["Owner", "King Kong"], vec!["Tenant"]];
        let err = render_table(&["Role", "Name"], &rows).unwrap_err();
        assert_eq!(err, TableShapeError { row: 1, expected: 2, actual: 1 });
    }

    #[test]
    fn test_table_spec_rejects_short_row() {
        let mut spec = TableSpec::new(&["Article", "Description"]);
        assert!(spec.push_row(vec!["8.04.010".to_string()]).is_err());
        assert!(spec.is_empty());
    }

    #[test]
    fn test_cells_are_escaped() {
        let rows = vec![vec!["Smith & Sons <LLC>"]];
        let html = render_table(&["Name"], &rows).unwrap();
        assert!(html.contains("<td>Smith &amp; Sons &lt;LLC&gt;</td>"));
    }

    #[test]
    fn test_header_only_table() {
        let rows: Vec<Vec<String>> = Vec::new();
        let html = render_table(&["Article"], &rows).unwrap();
        assert!(html.ends_with("<tbody></tbody></table>"));
    }
}
