//! A1-style reference formatting and parsing.

/// Convert column index to Excel-style letter(s): 0 -> A, 25 -> Z, 26 -> AA
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// (0, 0) -> "A1"
pub fn make_cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// ((0, 0), (2, 3)) -> "A1:D3". Corners are normalized; a one-cell range
/// collapses to a cell reference.
pub fn make_range_ref(start: (usize, usize), end: (usize, usize)) -> String {
    let (r1, c1) = (start.0.min(end.0), start.1.min(end.1));
    let (r2, c2) = (start.0.max(end.0), start.1.max(end.1));
    if r1 == r2 && c1 == c2 {
        make_cell_ref(r1, c1)
    } else {
        format!("{}:{}", make_cell_ref(r1, c1), make_cell_ref(r2, c2))
    }
}

/// "B3" -> (2, 1). `$` markers are accepted and ignored.
pub fn parse_cell_ref(s: &str) -> Option<(usize, usize)> {
    let s = s.trim();
    let s = s.strip_prefix('$').unwrap_or(s);
    let letters = s.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if letters == 0 {
        return None;
    }
    let col = s[..letters]
        .chars()
        .try_fold(0usize, |acc, c| {
            let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            acc.checked_mul(26)?.checked_add(digit)
        })?
        - 1;

    let rest = &s[letters..];
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row: usize = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_letter() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(col_to_letter(702), "AAA");
    }

    #[test]
    fn test_make_refs() {
        assert_eq!(make_cell_ref(0, 0), "A1");
        assert_eq!(make_cell_ref(9, 27), "AB10");
        assert_eq!(make_range_ref((2, 3), (0, 0)), "A1:D3");
        assert_eq!(make_range_ref((4, 1), (4, 1)), "B5");
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("b3"), Some((2, 1)));
        assert_eq!(parse_cell_ref("$AA$10"), Some((9, 26)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A"), None);
        assert_eq!(parse_cell_ref("A1:B2"), None);
    }

    #[test]
    fn test_parse_inverts_make() {
        for (row, col) in [(0, 0), (7, 25), (99, 26), (12, 701)] {
            assert_eq!(parse_cell_ref(&make_cell_ref(row, col)), Some((row, col)));
        }
    }
}
