use std::mem;

/// Field-delimiting convention of a pasted schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Csv,
    Tsv,
}

impl Dialect {
    /// First-line heuristic: more commas than tabs means CSV. A TSV line
    /// whose free-text fields carry enough commas can misclassify; the
    /// decoder's column-count check catches the fallout downstream.
    pub fn detect(input: &str) -> Dialect {
        let first_line = input.lines().next().unwrap_or_default();
        let commas = first_line.matches(',').count();
        let tabs = first_line.matches('\t').count();

        if commas > tabs {
            Dialect::Csv
        } else {
            Dialect::Tsv
        }
    }
}

/// Split raw text into trimmed fields. The header row is still present in
/// the output, stripping it is the decoder's job. Never fails, malformed
/// input just degrades into mis-split rows.
pub fn parse_rows(input: &str) -> Vec<Vec<String>> {
    let rows = match Dialect::detect(input) {
        Dialect::Csv => parse_csv(input),
        Dialect::Tsv => parse_tsv(input),
    };

    rows.into_iter()
        .filter(|row| !row.iter().all(String::is_empty))
        .collect()
}

fn parse_tsv(input: &str) -> Vec<Vec<String>> {
    input
        .lines()
        .map(|line| line.split('\t').map(|field| field.trim().to_string()).collect())
        .collect()
}

/// RFC4180-style scan: quoted fields may contain delimiters and newlines,
/// a doubled quote inside quotes is a literal quote, and quote state spans
/// physical lines until closed. An unterminated trailing row is kept.
fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                row.push(mem::take(&mut field).trim().to_string());
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                row.push(mem::take(&mut field).trim().to_string());
                rows.push(mem::take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field.trim().to_string());
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_csv_when_commas_outnumber_tabs() {
        assert_eq!(Dialect::detect("a,b,c"), Dialect::Csv);
        assert_eq!(Dialect::detect("a\tb\tc"), Dialect::Tsv);
        // Ties fall back to TSV, known limitation of the heuristic.
        assert_eq!(Dialect::detect("a,b\tc,d\te"), Dialect::Tsv);
        assert_eq!(Dialect::detect(""), Dialect::Tsv);
    }

    #[test]
    fn splits_tsv_lines_without_quoting() {
        let rows = parse_rows("start\tend\ttitle\na\t\"b\tc\n");
        assert_eq!(
            rows,
            vec![
                vec!["start", "end", "title"],
                // The quote is just a character in TSV.
                vec!["a", "\"b", "c"],
            ]
        );
    }

    #[test]
    fn csv_handles_quoted_delimiters_and_escaped_quotes() {
        let rows = parse_rows("a,\"b, with comma\",\"say \"\"hi\"\"\"\nd,e,f\n");
        assert_eq!(
            rows,
            vec![
                vec!["a", "b, with comma", "say \"hi\""],
                vec!["d", "e", "f"],
            ]
        );
    }

    #[test]
    fn csv_quote_state_spans_physical_lines() {
        let rows = parse_rows("a,\"first line\nsecond line\",c\nd,e,f\n");
        assert_eq!(
            rows,
            vec![
                vec!["a", "first line\nsecond line", "c"],
                vec!["d", "e", "f"],
            ]
        );
    }

    #[test]
    fn unterminated_trailing_row_is_still_emitted() {
        let rows = parse_rows("a,b,c\nd,\"unclosed");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["d", "unclosed"]]);
    }

    #[test]
    fn all_empty_rows_are_dropped_in_both_dialects() {
        let csv = parse_rows("a,b\n,\n  ,  \nc,d\n");
        assert_eq!(csv, vec![vec!["a", "b"], vec!["c", "d"]]);

        let tsv = parse_rows("a\tb\n\t\nc\td\n");
        assert_eq!(tsv, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn fields_are_trimmed() {
        let rows = parse_rows("  a  , b \nc , d ");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }
}
