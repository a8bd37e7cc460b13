use regex::Regex;

use crate::domain::Dialect;

/// Number of leading bytes inspected when sniffing a CSV source.
pub const SAMPLE_SIZE: usize = 4096;

const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

// Share of sampled lines that must agree on the delimiter count.
const MIN_CONSISTENCY: f32 = 0.9;

pub struct DialectSniffer;

impl DialectSniffer {
    /// Infers the dialect of `sample`, falling back to comma-delimited,
    /// double-quoted CSV when nothing conclusive is found.
    pub fn sniff(sample: &[u8]) -> Dialect {
        Self::try_sniff(sample).unwrap_or_default()
    }

    pub fn try_sniff(sample: &[u8]) -> Option<Dialect> {
        let text = decode_permissive(sample);
        let mut lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        // The sample window usually cuts the last row short.
        if sample.len() >= SAMPLE_SIZE && !text.ends_with('\n') && lines.len() > 1 {
            lines.pop();
        }
        if lines.is_empty() {
            return None;
        }

        let quote = detect_quote(&lines);

        let mut best: Option<(u8, f32, usize)> = None;
        for &delimiter in &CANDIDATES {
            let counts: Vec<usize> = lines
                .iter()
                .map(|line| count_unquoted(line, delimiter, quote))
                .collect();
            let mode = mode_of(&counts);
            if mode == 0 {
                continue;
            }
            let agreeing = counts.iter().filter(|&&count| count == mode).count();
            let consistency = agreeing as f32 / counts.len() as f32;
            if consistency < MIN_CONSISTENCY {
                continue;
            }

            let better = match best {
                None => true,
                Some((_, best_consistency, best_mode)) => {
                    consistency > best_consistency
                        || (consistency == best_consistency && mode > best_mode)
                }
            };
            if better {
                best = Some((delimiter, consistency, mode));
            }
        }

        best.map(|(delimiter, _, _)| Dialect { delimiter, quote })
    }
}

/// Decodes as UTF-8, dropping invalid sequences and any byte-order mark.
fn decode_permissive(sample: &[u8]) -> String {
    String::from_utf8_lossy(sample)
        .chars()
        .filter(|&ch| ch != '\u{FFFD}' && ch != '\u{FEFF}')
        .collect()
}

fn detect_quote(lines: &[&str]) -> u8 {
    if lines.iter().any(|line| line.contains('"')) {
        return b'"';
    }
    let single_quoted = Regex::new(r#"(?:^|[,;\t|])\s*'[^']*'\s*(?:[,;\t|]|$)"#)
        .map(|re| lines.iter().any(|line| re.is_match(line)))
        .unwrap_or(false);
    if single_quoted { b'\'' } else { b'"' }
}

fn count_unquoted(line: &str, delimiter: u8, quote: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &byte in line.as_bytes() {
        if byte == quote {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Most frequent value; ties go to the larger value.
fn mode_of(counts: &[usize]) -> usize {
    let mut tally = std::collections::BTreeMap::<usize, usize>::new();
    for &count in counts {
        *tally.entry(count).or_insert(0) += 1;
    }
    tally
        .into_iter()
        .max_by(|(value_a, freq_a), (value_b, freq_b)| {
            freq_a.cmp(freq_b).then(value_a.cmp(value_b))
        })
        .map(|(value, _)| value)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_candidate() {
        assert_eq!(DialectSniffer::sniff(b"a,b,c\nd,e,f\n").delimiter, b',');
        assert_eq!(DialectSniffer::sniff(b"a;b;c\nd;e;f\n").delimiter, b';');
        assert_eq!(DialectSniffer::sniff(b"a\tb\tc\nd\te\tf\n").delimiter, b'\t');
        assert_eq!(DialectSniffer::sniff(b"a|b|c\nd|e|f\n").delimiter, b'|');
    }

    #[test]
    fn delimiters_inside_quotes_are_ignored() {
        let sample = b"UniProt ID;Name\nP05067;\"Amyloid, beta, precursor\"\nP69905;\"Hemoglobin, alpha\"\n";
        let dialect = DialectSniffer::sniff(sample);
        assert_eq!(dialect.delimiter, b';');
        assert_eq!(dialect.quote, b'"');
    }

    #[test]
    fn single_column_falls_back_to_default() {
        assert!(DialectSniffer::try_sniff(b"UniProt ID\nP05067\nP69905\n").is_none());
        assert_eq!(DialectSniffer::sniff(b"UniProt ID\nP05067\n"), Dialect::default());
    }

    #[test]
    fn empty_and_garbage_samples_fall_back() {
        assert_eq!(DialectSniffer::sniff(b""), Dialect::default());
        assert_eq!(DialectSniffer::sniff(&[0xff, 0xfe, 0xfd]), Dialect::default());
    }

    #[test]
    fn invalid_bytes_are_dropped_not_fatal() {
        let sample = b"UniProt ID|Note\nP05067|\xff\xfeok\nP69905|fine\n";
        assert_eq!(DialectSniffer::sniff(sample).delimiter, b'|');
    }

    #[test]
    fn single_quote_style() {
        let sample = b"'UniProt ID','Name'\n'P05067','APP'\n";
        let dialect = DialectSniffer::sniff(sample);
        assert_eq!(dialect.delimiter, b',');
        assert_eq!(dialect.quote, b'\'');
    }

    #[test]
    fn truncated_last_line_is_ignored() {
        let mut sample = String::from("UniProt ID,Name,Organism\n");
        while sample.len() < SAMPLE_SIZE {
            sample.push_str("P05067,Amyloid beta,Human\n");
        }
        sample.truncate(SAMPLE_SIZE);
        if sample.ends_with('\n') {
            sample.pop();
        }
        assert_eq!(DialectSniffer::sniff(sample.as_bytes()).delimiter, b',');
    }
}
