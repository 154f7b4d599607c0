use std::fs;
use std::path::Path;

use crate::annotation::domain::annotation_reader::{AnnotationReader, TextGridError};
use crate::annotation::domain::interval::{Interval, Tier};

/// Reads Praat TextGrid documents, in both the long (`item []:`) and short
/// text formats.
///
/// Interval tiers are returned in file order with their intervals in time
/// order. Point tiers (`TextTier`) carry no ranges to cut and are skipped.
/// No repair is attempted: structural problems surface as
/// [`TextGridError::Malformed`].
pub struct TextGridReader;

impl TextGridReader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str) -> Result<Vec<Tier>, TextGridError> {
        let tokens = tokenize(content);
        let mut cursor = Cursor::new(&tokens);

        match (cursor.next(), cursor.next()) {
            (Some(Token::Text(a)), Some(Token::Text(b)))
                if a == "ooTextFile" && b == "TextGrid" => {}
            _ => return Err(TextGridError::NotATextGrid),
        }

        // Document xmin/xmax.
        cursor.number("document xmin")?;
        cursor.number("document xmax")?;

        if cursor.take_flag() == Some(false) {
            return Ok(Vec::new());
        }
        let tier_count = cursor.count("tier count")?;

        let mut tiers = Vec::new();
        for _ in 0..tier_count {
            let class = cursor.text("tier class")?;
            let name = cursor.text("tier name")?;
            cursor.number("tier xmin")?;
            cursor.number("tier xmax")?;
            let size = cursor.count("tier size")?;

            match class.as_str() {
                "IntervalTier" => {
                    let mut intervals = Vec::with_capacity(size);
                    for _ in 0..size {
                        let min_time = cursor.number("interval xmin")?;
                        let max_time = cursor.number("interval xmax")?;
                        let mark = cursor.text("interval text")?;
                        if max_time < min_time {
                            return Err(TextGridError::Malformed(format!(
                                "interval in tier \"{name}\" ends before it starts \
                                 ({max_time} < {min_time})"
                            )));
                        }
                        intervals.push(Interval {
                            min_time,
                            max_time,
                            mark,
                        });
                    }
                    tiers.push(Tier { name, intervals });
                }
                "TextTier" => {
                    // Point tier: one time and one mark per point, skipped.
                    for _ in 0..size {
                        cursor.number("point number")?;
                        cursor.text("point mark")?;
                    }
                }
                other => {
                    return Err(TextGridError::Malformed(format!(
                        "unknown tier class \"{other}\""
                    )));
                }
            }
        }

        Ok(tiers)
    }
}

impl Default for TextGridReader {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationReader for TextGridReader {
    fn read_tiers(&self, path: &Path) -> Result<Vec<Tier>, TextGridError> {
        let content = fs::read_to_string(path).map_err(|source| TextGridError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(content.trim_start_matches('\u{feff}'))
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    /// Quoted string, `""` unescaped to `"`.
    Text(String),
    Number(f64),
    /// `<exists>` = true, `<absent>` = false.
    Flag(bool),
}

/// Reduce both TextGrid layouts to one value stream.
///
/// Quoted strings (which may span lines), bare numbers, and the
/// `<exists>`/`<absent>` flags are values; everything else (keys like
/// `xmin =`, structural lines like `item [1]:`) is dropped. After this the
/// long and short formats read identically.
fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            let mut text = String::new();
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        text.push('"');
                    } else {
                        break;
                    }
                } else {
                    text.push(c);
                }
            }
            tokens.push(Token::Text(text));
        } else if !c.is_whitespace() {
            let mut word = String::from(c);
            while let Some(&n) = chars.peek() {
                if n.is_whitespace() || n == '"' {
                    break;
                }
                word.push(n);
                chars.next();
            }
            if word == "<exists>" {
                tokens.push(Token::Flag(true));
            } else if word == "<absent>" {
                tokens.push(Token::Flag(false));
            } else if let Ok(n) = word.parse::<f64>() {
                tokens.push(Token::Number(n));
            }
        }
    }

    tokens
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn number(&mut self, what: &str) -> Result<f64, TextGridError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(*n),
            Some(other) => Err(TextGridError::Malformed(format!(
                "expected number for {what}, found {other:?}"
            ))),
            None => Err(TextGridError::UnexpectedEnd),
        }
    }

    fn count(&mut self, what: &str) -> Result<usize, TextGridError> {
        let n = self.number(what)?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(TextGridError::Malformed(format!(
                "expected non-negative integer for {what}, found {n}"
            )));
        }
        Ok(n as usize)
    }

    fn text(&mut self, what: &str) -> Result<String, TextGridError> {
        match self.next() {
            Some(Token::Text(s)) => Ok(s.clone()),
            Some(other) => Err(TextGridError::Malformed(format!(
                "expected string for {what}, found {other:?}"
            ))),
            None => Err(TextGridError::UnexpectedEnd),
        }
    }

    /// Consume the `tiers?` flag if present. The short format keeps it too,
    /// but hand-written files sometimes omit it.
    fn take_flag(&mut self) -> Option<bool> {
        if let Some(Token::Flag(b)) = self.tokens.get(self.pos) {
            self.pos += 1;
            Some(*b)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LONG_FORMAT: &str = r#"File type = "ooTextFile"
Object class = "TextGrid"

xmin = 0
xmax = 2.5
tiers? <exists>
size = 2
item []:
    item [1]:
        class = "IntervalTier"
        name = "words"
        xmin = 0
        xmax = 2.5
        intervals: size = 2
        intervals [1]:
            xmin = 0
            xmax = 1.25
            text = "hello"
        intervals [2]:
            xmin = 1.25
            xmax = 2.5
            text = ""
    item [2]:
        class = "TextTier"
        name = "clicks"
        xmin = 0
        xmax = 2.5
        points: size = 1
        points [1]:
            number = 0.7
            mark = "click"
"#;

    const SHORT_FORMAT: &str = r#"File type = "ooTextFile"
Object class = "TextGrid"

0
2.5
<exists>
2
"IntervalTier"
"words"
0
2.5
2
0
1.25
"hello"
1.25
2.5
""
"TextTier"
"clicks"
0
2.5
1
0.7
"click"
"#;

    #[test]
    fn test_long_format_parses_interval_tier() {
        let tiers = TextGridReader::new().parse(LONG_FORMAT).unwrap();
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].name, "words");
        assert_eq!(tiers[0].intervals.len(), 2);
        assert_relative_eq!(tiers[0].intervals[0].min_time, 0.0);
        assert_relative_eq!(tiers[0].intervals[0].max_time, 1.25);
        assert_eq!(tiers[0].intervals[0].mark, "hello");
        assert_eq!(tiers[0].intervals[1].mark, "");
    }

    #[test]
    fn test_short_format_matches_long_format() {
        let reader = TextGridReader::new();
        let long = reader.parse(LONG_FORMAT).unwrap();
        let short = reader.parse(SHORT_FORMAT).unwrap();
        assert_eq!(long, short);
    }

    #[test]
    fn test_point_tiers_are_skipped() {
        let tiers = TextGridReader::new().parse(LONG_FORMAT).unwrap();
        assert!(tiers.iter().all(|t| t.name != "clicks"));
    }

    #[test]
    fn test_doubled_quotes_unescape() {
        let doc = r#""ooTextFile"
"TextGrid"
0
1
<exists>
1
"IntervalTier"
"t"
0
1
1
0
1
"say ""hi"""
"#;
        let tiers = TextGridReader::new().parse(doc).unwrap();
        assert_eq!(tiers[0].intervals[0].mark, "say \"hi\"");
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let err = TextGridReader::new().parse("not a textgrid").unwrap_err();
        assert!(matches!(err, TextGridError::NotATextGrid));
    }

    #[test]
    fn test_truncated_document_is_rejected() {
        let doc = r#""ooTextFile"
"TextGrid"
0
1
<exists>
1
"IntervalTier"
"t"
0
1
3
0
1
"#;
        let err = TextGridReader::new().parse(doc).unwrap_err();
        assert!(matches!(err, TextGridError::UnexpectedEnd));
    }

    #[test]
    fn test_backwards_interval_is_rejected() {
        let doc = r#""ooTextFile"
"TextGrid"
0
1
<exists>
1
"IntervalTier"
"t"
0
1
1
0.8
0.2
"oops"
"#;
        let err = TextGridReader::new().parse(doc).unwrap_err();
        assert!(matches!(err, TextGridError::Malformed(_)));
    }

    #[test]
    fn test_absent_tiers_yield_empty() {
        let doc = r#""ooTextFile"
"TextGrid"
0
1
<absent>
"#;
        let tiers = TextGridReader::new().parse(doc).unwrap();
        assert!(tiers.is_empty());
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let err = TextGridReader::new()
            .read_tiers(Path::new("/nonexistent/annotation.TextGrid"))
            .unwrap_err();
        assert!(matches!(err, TextGridError::Io { .. }));
    }
}
