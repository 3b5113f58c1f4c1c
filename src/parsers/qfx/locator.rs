use std::path::Path;

use super::types::BalanceField;
use crate::errors::{FlipError, FlipResult};
use crate::parsers::traits::Locator;

pub const DEFAULT_TAG: &str = "BALAMT";
pub const DEFAULT_SCOPE: &str = "LEDGERBAL";

const EXTENSIONS: &[&str] = &["qfx", "ofx"];
/// SGML (OFX 1.x) and XML (OFX 2.x) header markers, upper-cased.
const HEADER_MARKERS: &[&str] = &["OFXHEADER:", "DATA:OFXSGML", "<?OFX ", "<OFX>"];
const SNIFF_LEN: usize = 4096;

/// Which tag holds the balance, and which aggregate it has to live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    pub tag: String,
    pub scope: Option<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            scope: Some(DEFAULT_SCOPE.to_string()),
        }
    }
}

/// Scans SGML or XML flavoured OFX text for the balance tag.
///
/// Leaf values do not need closing tags: a value runs until the next `<` or
/// the end of the line, whichever comes first.
#[derive(Debug, Clone, Default)]
pub struct QfxLocator {
    config: LocatorConfig,
}

impl QfxLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    fn in_scope(&self, open: &[String]) -> bool {
        match &self.config.scope {
            Some(scope) => open.iter().any(|tag| tag.eq_ignore_ascii_case(scope)),
            None => true,
        }
    }

    fn value_at(&self, content: &str, name: &str, value_start: usize) -> BalanceField {
        let value_end = content[value_start..]
            .find(['<', '\r', '\n'])
            .map_or(content.len(), |i| value_start + i);

        let raw = &content[value_start..value_end];
        let value = raw.trim();
        let start = value_start + (raw.len() - raw.trim_start().len());

        BalanceField {
            tag: name.to_string(),
            start,
            end: start + value.len(),
            raw: value.to_string(),
        }
    }
}

impl Locator for QfxLocator {
    type Output = BalanceField;

    fn is_supported(filename: Option<&str>, content: &str) -> bool {
        let has_extension = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)));
        if has_extension {
            return true;
        }

        // Headers always come first, so the head of the file is enough.
        let head: String = content.chars().take(SNIFF_LEN).collect::<String>().to_ascii_uppercase();
        HEADER_MARKERS.iter().any(|marker| head.contains(marker))
    }

    fn locate(&self, content: &str) -> FlipResult<Vec<BalanceField>> {
        let mut fields = Vec::new();
        let mut open: Vec<String> = Vec::new();
        let mut cursor = 0;

        while let Some(offset) = content[cursor..].find('<') {
            let tag_start = cursor + offset;
            let Some(len) = content[tag_start..].find('>') else {
                break;
            };
            let tag_end = tag_start + len + 1;
            let inner = content[tag_start + 1..tag_end - 1].trim();
            cursor = tag_end;

            if let Some(closed) = inner.strip_prefix('/') {
                let closed = closed.trim();
                match open.iter().rposition(|tag| tag.eq_ignore_ascii_case(closed)) {
                    Some(position) => open.truncate(position),
                    None => tracing::debug!(tag = closed, offset = tag_start, "ignoring unmatched closing tag"),
                }
                continue;
            }

            if inner.starts_with(['?', '!']) {
                continue;
            }

            let name = inner
                .split(|c: char| c.is_whitespace())
                .next()
                .unwrap_or_default();
            if name.is_empty() {
                continue;
            }

            if name.eq_ignore_ascii_case(&self.config.tag) && self.in_scope(&open) {
                let field = self.value_at(content, name, tag_end);
                tracing::debug!(tag = name, start = field.start, end = field.end, value = %field.raw, "found balance field");
                fields.push(field);
            }

            open.push(name.to_string());
        }

        if fields.is_empty() {
            return Err(FlipError::FieldNotFound {
                tag: self.config.tag.clone(),
            });
        }

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE_SGML_QFX: &str = "OFXHEADER:100\r
DATA:OFXSGML\r
VERSION:102\r
\r
<OFX>\r
<CREDITCARDMSGSRSV1>\r
<CCSTMTTRNRS>\r
<TRNUID>1\r
<CCSTMTRS>\r
<CURDEF>USD\r
<BANKTRANLIST>\r
<STMTTRN>\r
<TRNTYPE>DEBIT\r
<TRNAMT>-50.00\r
<NAME>Coffee Shop\r
</STMTTRN>\r
</BANKTRANLIST>\r
<LEDGERBAL>\r
<BALAMT>150.00\r
<DTASOF>20251231\r
</LEDGERBAL>\r
<AVAILBAL>\r
<BALAMT>850.00\r
<DTASOF>20251231\r
</AVAILBAL>\r
</CCSTMTRS>\r
</CCSTMTTRNRS>\r
</CREDITCARDMSGSRSV1>\r
</OFX>\r
";

    const SAMPLE_XML_QFX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OFX>
    <CREDITCARDMSGSRSV1>
        <CCSTMTTRNRS>
            <CCSTMTRS>
                <LEDGERBAL>
                    <BALAMT> -1500.25 </BALAMT>
                    <DTASOF>20251225120000</DTASOF>
                </LEDGERBAL>
            </CCSTMTRS>
        </CCSTMTTRNRS>
    </CREDITCARDMSGSRSV1>
</OFX>"#;

    #[rstest]
    #[case(Some("transactions(1).qfx"), "", true)]
    #[case(Some("Statement.QFX"), "", true)]
    #[case(Some("export.ofx"), "", true)]
    #[case(Some("qfx"), "", false)]
    #[case(Some("statement.qfx.bak"), "", false)]
    #[case(Some("statement.csv"), "Date,Amount", false)]
    #[case(None, SAMPLE_SGML_QFX, true)]
    #[case(None, SAMPLE_XML_QFX, true)]
    #[case(None, "<?xml version=\"1.0\"?>\n<?OFX OFXHEADER=\"200\" VERSION=\"220\"?>", true)]
    #[case(Some("download"), "<ofx>\n<signonmsgsrsv1>", true)]
    #[case(None, "<LEDGERBAL><BALAMT>1.00", false)]
    fn test_is_supported(#[case] filename: Option<&str>, #[case] content: &str, #[case] expected: bool) {
        assert_eq!(QfxLocator::is_supported(filename, content), expected);
    }

    #[test]
    fn test_locate_sgml_ledger_balance_only() {
        let fields = QfxLocator::default().locate(SAMPLE_SGML_QFX).unwrap();

        assert_eq!(fields.len(), 1);
        let field = &fields[0];
        assert_eq!(field.tag, "BALAMT");
        assert_eq!(field.raw, "150.00");
        assert_eq!(&SAMPLE_SGML_QFX[field.span()], "150.00");
    }

    #[test]
    fn test_locate_xml_trims_whitespace() {
        let fields = QfxLocator::default().locate(SAMPLE_XML_QFX).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].raw, "-1500.25");
        assert_eq!(&SAMPLE_XML_QFX[fields[0].span()], "-1500.25");
    }

    #[test]
    fn test_locate_without_scope_matches_every_occurrence() {
        let locator = QfxLocator::new(LocatorConfig {
            tag: DEFAULT_TAG.to_string(),
            scope: None,
        });

        let fields = locator.locate(SAMPLE_SGML_QFX).unwrap();
        let values: Vec<_> = fields.iter().map(|f| f.raw.as_str()).collect();
        assert_eq!(values, vec!["150.00", "850.00"]);
    }

    #[test]
    fn test_locate_multiple_statements() {
        let content = "<OFX>\n<LEDGERBAL>\n<BALAMT>10.00\n</LEDGERBAL>\n<LEDGERBAL>\n<BALAMT>-20.00\n</LEDGERBAL>\n</OFX>\n";
        let fields = QfxLocator::default().locate(content).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].raw, "10.00");
        assert_eq!(fields[1].raw, "-20.00");
        assert!(fields[0].end < fields[1].start);
    }

    #[test]
    fn test_locate_is_case_insensitive_and_keeps_file_casing() {
        let content = "<ofx><LedgerBal><balamt>5.00</balamt></LedgerBal></ofx>";
        let fields = QfxLocator::default().locate(content).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].tag, "balamt");
        assert_eq!(fields[0].raw, "5.00");
    }

    #[test]
    fn test_locate_value_at_end_of_content() {
        let content = "<LEDGERBAL><BALAMT>42";
        let fields = QfxLocator::default().locate(content).unwrap();

        assert_eq!(fields[0].raw, "42");
        assert_eq!(fields[0].end, content.len());
    }

    #[test]
    fn test_locate_empty_value_yields_empty_span() {
        let content = "<LEDGERBAL>\n<BALAMT>   \n</LEDGERBAL>";
        let fields = QfxLocator::default().locate(content).unwrap();

        assert_eq!(fields[0].raw, "");
        assert_eq!(fields[0].start, fields[0].end);
    }

    #[test]
    fn test_locate_outside_scope_is_not_found() {
        let content = "<OFX>\n<AVAILBAL>\n<BALAMT>850.00\n</AVAILBAL>\n</OFX>\n";
        let result = QfxLocator::default().locate(content);

        assert!(matches!(result, Err(FlipError::FieldNotFound { tag }) if tag == "BALAMT"));
    }

    #[test]
    fn test_locate_after_scope_closed_is_not_found() {
        let content = "<LEDGERBAL>\n<DTASOF>20251231\n</LEDGERBAL>\n<BALAMT>1.00\n";
        let result = QfxLocator::default().locate(content);

        assert!(matches!(result, Err(FlipError::FieldNotFound { .. })));
    }

    #[test]
    fn test_locate_missing_tag() {
        let result = QfxLocator::default().locate("<OFX>\n<TRNAMT>-50.00\n</OFX>");
        assert!(matches!(result, Err(FlipError::FieldNotFound { .. })));
    }

    #[test]
    fn test_locate_ignores_unmatched_closing_tag() {
        let content = "<OFX></STMTRS><LEDGERBAL><BALAMT>3.50</LEDGERBAL></OFX>";
        let fields = QfxLocator::default().locate(content).unwrap();

        assert_eq!(fields[0].raw, "3.50");
    }

    #[test]
    fn test_locate_custom_tag() {
        let locator = QfxLocator::new(LocatorConfig {
            tag: "TRNAMT".to_string(),
            scope: Some("STMTTRN".to_string()),
        });

        let fields = locator.locate(SAMPLE_SGML_QFX).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].raw, "-50.00");
    }
}
