pub(crate) fn format_bytes(b: f64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

    if !b.is_finite() || b <= 0.0 {
        return "0B".to_string();
    }
    if b >= GIB {
        return format!("{:.2}GiB", b / GIB);
    }
    if b >= MIB {
        return format!("{:.2}MiB", b / MIB);
    }
    if b >= KIB {
        return format!("{:.2}KiB", b / KIB);
    }

    format!("{b:.0}B")
}

pub(crate) fn format_num(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}")
    } else {
        "0.00".to_string()
    }
}

/// Signed two-decimal form, `+1.85` / `-0.04` / `0.00`.
pub(crate) fn format_delta(v: f64) -> String {
    if !v.is_finite() || v == 0.0 {
        return "0.00".to_string();
    }
    format!("{v:+.2}")
}

/// Renders a plain-text table with right-aligned cells.
pub(crate) fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:>w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut out = line(headers);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}
