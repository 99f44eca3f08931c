pub const COLUMN_WIDTH: usize = 15;
pub const COLUMNS: usize = 4;

/// Lays `items` out row by row in fixed width cells, `cols` per row. Names
/// longer than the cell simply push the next cell right.
pub fn columnar_text(items: &[String], width: usize, cols: usize) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("{item:<width$}"));
        if (index + 1) % cols == 0 {
            out.push('\n');
        }
    }
    out.trim().to_string()
}
