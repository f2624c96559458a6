//! Line classification for the supplier delivery format.
//!
//! ```text
//! HDR  <supplierIdentifier> <identifier>
//! LINE <poNumber> <isbn> <quantity>
//! ```
//!
//! Markers must start at column 0 and be followed by whitespace (or the end of
//! the line). Any other line is not part of the format and is ignored.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use boxer_core::{BoxId, FormatError, FormatResult, SupplierId};

use crate::box_record::Content;

/// Marker token that opens a box.
pub const HEADER_MARKER: &str = "HDR";

/// Marker token of a content line.
pub const LINE_MARKER: &str = "LINE";

static HEADER_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^HDR(?:\s|$)").expect("valid header marker pattern"));

static HEADER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^HDR\s+(?P<supplier_id>\S+)\s+(?P<id>\S+)\s*$").expect("valid header pattern")
});

static LINE_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^LINE(?:\s|$)").expect("valid line marker pattern"));

static LINE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^LINE\s+(?P<po_number>\S+)\s+(?P<isbn>\S+)\s+(?P<quantity>\S+)\s*$")
        .expect("valid line pattern")
});

/// Fields of a well-formed header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxHeader {
    pub supplier_id: SupplierId,
    pub id: BoxId,
}

/// Fields of a well-formed content line.
///
/// The quantity is kept as text: a bad quantity only drops this one line, and
/// that decision belongs to the aggregator, not the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    pub po_number: String,
    pub isbn: String,
    pub quantity_text: String,
}

impl ContentLine {
    pub fn quantity(&self) -> FormatResult<u32> {
        self.quantity_text
            .parse::<u32>()
            .map_err(|_| FormatError::invalid_quantity(&self.quantity_text))
    }

    pub fn into_content(self) -> FormatResult<Content> {
        let quantity = self.quantity()?;
        Ok(Content {
            po_number: self.po_number,
            isbn: self.isbn,
            quantity,
        })
    }
}

/// Classification of a single text line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    BoxHeader(BoxHeader),
    ContentLine(ContentLine),
    /// Blank, or not part of the format.
    Unrecognized,
    /// Carries a marker but not the expected shape.
    Malformed(FormatError),
}

/// Classify one line of a delivery file.
pub fn parse_line(line: &str) -> ParsedLine {
    if line.trim().is_empty() {
        return ParsedLine::Unrecognized;
    }

    if HEADER_CANDIDATE.is_match(line) {
        return match parse_header(line) {
            Ok(header) => ParsedLine::BoxHeader(header),
            Err(err) => ParsedLine::Malformed(err),
        };
    }

    if LINE_CANDIDATE.is_match(line) {
        return match parse_content(line) {
            Ok(content) => ParsedLine::ContentLine(content),
            Err(err) => ParsedLine::Malformed(err),
        };
    }

    ParsedLine::Unrecognized
}

/// Extract supplier and box identifiers from a header line.
pub fn parse_header(line: &str) -> FormatResult<BoxHeader> {
    let Some(caps) = HEADER_SHAPE.captures(line) else {
        trace!(
            tokens = ?line.split_whitespace().collect::<Vec<_>>(),
            "box line items of box that couldn't be processed"
        );
        return Err(FormatError::malformed_header(line));
    };

    Ok(BoxHeader {
        supplier_id: SupplierId::new(&caps["supplier_id"])?,
        id: BoxId::new(&caps["id"])?,
    })
}

/// Extract purchase order, ISBN and quantity text from a content line.
pub fn parse_content(line: &str) -> FormatResult<ContentLine> {
    let Some(caps) = LINE_SHAPE.captures(line) else {
        trace!(
            tokens = ?line.split_whitespace().collect::<Vec<_>>(),
            "content line items that couldn't be processed"
        );
        return Err(FormatError::malformed_content(line));
    };

    Ok(ContentLine {
        po_number: caps["po_number"].to_string(),
        isbn: caps["isbn"].to_string(),
        quantity_text: caps["quantity"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn header(line: &str) -> BoxHeader {
        match parse_line(line) {
            ParsedLine::BoxHeader(h) => h,
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn header_line_yields_supplier_then_box_identifier() {
        let h = header("HDR SUP1 BOX1");
        assert_eq!(h.supplier_id.as_str(), "SUP1");
        assert_eq!(h.id.as_str(), "BOX1");
    }

    #[test]
    fn tabs_and_runs_of_spaces_delimit_tokens() {
        let h = header("HDR\tTRSP117   6874453I");
        assert_eq!(h.supplier_id.as_str(), "TRSP117");
        assert_eq!(h.id.as_str(), "6874453I");
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let h = header("HDR SUP1 BOX1\r");
        assert_eq!(h.id.as_str(), "BOX1");
    }

    #[test]
    fn header_with_one_token_is_malformed() {
        assert_eq!(
            parse_line("HDR ONLYONE"),
            ParsedLine::Malformed(FormatError::malformed_header("HDR ONLYONE"))
        );
    }

    #[test]
    fn bare_header_marker_is_malformed() {
        assert!(matches!(
            parse_line("HDR"),
            ParsedLine::Malformed(FormatError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn header_with_extra_token_is_malformed() {
        assert!(matches!(
            parse_line("HDR SUP1 BOX1 EXTRA"),
            ParsedLine::Malformed(FormatError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn content_line_keeps_quantity_as_text() {
        match parse_line("LINE P000001661 9781473663800 12") {
            ParsedLine::ContentLine(c) => {
                assert_eq!(c.po_number, "P000001661");
                assert_eq!(c.isbn, "9781473663800");
                assert_eq!(c.quantity_text, "12");
                assert_eq!(c.quantity(), Ok(12));
            }
            other => panic!("expected content line, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_quantity_is_classified_but_rejected_on_conversion() {
        let ParsedLine::ContentLine(c) = parse_line("LINE PO1 ISBN1 abc") else {
            panic!("expected content line");
        };
        assert_eq!(c.into_content(), Err(FormatError::invalid_quantity("abc")));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let c = parse_content("LINE PO1 ISBN1 -4").unwrap();
        assert!(matches!(c.quantity(), Err(FormatError::InvalidQuantity { .. })));
    }

    #[test]
    fn content_line_with_missing_token_is_malformed() {
        assert!(matches!(
            parse_line("LINE PO1 ISBN1"),
            ParsedLine::Malformed(FormatError::MalformedContent { .. })
        ));
    }

    #[test]
    fn other_lines_are_unrecognized() {
        for line in ["", "   ", "TRL 42", "HDRX SUP1 BOX1", "LINES PO1 ISBN1 1", " HDR SUP1 BOX1"] {
            assert_eq!(parse_line(line), ParsedLine::Unrecognized, "line {line:?}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a header is well formed exactly when two tokens follow the marker.
        #[test]
        fn header_shape_depends_only_on_token_count(
            tokens in prop::collection::vec("[A-Za-z0-9]{1,12}", 0..5)
        ) {
            let line = format!("HDR {}", tokens.join(" "));
            let parsed = parse_line(&line);
            if tokens.len() == 2 {
                prop_assert!(matches!(parsed, ParsedLine::BoxHeader(_)));
            } else {
                let malformed =
                    matches!(parsed, ParsedLine::Malformed(FormatError::MalformedHeader { .. }));
                prop_assert!(malformed, "expected malformed header for {:?}", line);
            }
        }

        /// Property: any u32 quantity is accepted as written.
        #[test]
        fn any_u32_quantity_parses(q in any::<u32>()) {
            let line = format!("LINE PO1 ISBN1 {q}");
            let content = parse_content(&line).unwrap().into_content().unwrap();
            prop_assert_eq!(content.quantity, q);
        }
    }
}
