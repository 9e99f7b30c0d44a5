pub mod ast;
pub mod blocks;
pub mod config;
pub mod literal;
pub mod parser;
pub mod render;
pub mod tokenizer;

use ast::Document;
use config::{Config, ParserOptions};
pub use parser::ParseError;
pub use tokenizer::TokenizeError;

/// Tokenize and parse ECSL source text.
pub fn parse_str(source: &str, options: &ParserOptions) -> Result<Document, Error> {
    let tokens = tokenizer::tokenize(source)?;
    parser::parse_with(&tokens, options).map_err(|err| {
        // Errors past the last token point at the end of the input
        let offset = tokens
            .get(err.token_index())
            .map_or(source.len(), |t| t.offset);
        Error::Parse { source: err, offset }
    })
}

/// Full pipeline: tokenize, parse and render the document back to markup.
pub fn format(source: &str, config: &Config) -> Result<String, Error> {
    let doc = parse_str(source, &config.parser)?;
    Ok(render::render_document(&doc, &config.render))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error("{source}")]
    Parse {
        #[source]
        source: ParseError,
        /// Byte offset of the offending token in the source text.
        offset: usize,
    },
}

impl Error {
    /// Byte offset in the source text where the failure was detected.
    pub fn offset(&self) -> usize {
        match self {
            Error::Tokenize(e) => e.offset(),
            Error::Parse { offset, .. } => *offset,
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
    }

    /// Fixtures with .ecsl + .toml + .out (expected rendering).
    const FIXTURE_NAMES: &[&str] = &["sections", "blocks", "strict"];

    #[test]
    fn test_full_pipeline_all_fixtures() {
        for name in FIXTURE_NAMES {
            let input = std::fs::read_to_string(fixture_path(&format!("{name}.ecsl")))
                .unwrap_or_else(|e| panic!("fixture {name}.ecsl: {e}"));
            let toml_str = std::fs::read_to_string(fixture_path(&format!("{name}.toml")))
                .unwrap_or_else(|e| panic!("fixture {name}.toml: {e}"));
            let expected = std::fs::read_to_string(fixture_path(&format!("{name}.out")))
                .unwrap_or_else(|e| panic!("fixture {name}.out: {e}"));
            let config = Config::from_toml(&toml_str).unwrap();
            let result = format(&input, &config).unwrap();
            assert_eq!(
                normalize(&result),
                normalize(&expected),
                "fixture {name}: output does not match expected"
            );
        }
    }

    #[test]
    fn test_blocks_fixture_tree() {
        let input = std::fs::read_to_string(fixture_path("blocks.ecsl")).unwrap();
        let doc = parse_str(&input, &ParserOptions::default()).unwrap();
        let roots = doc.sections.default_section().unwrap();

        let library: Vec<&str> = roots[0].children().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(library, vec!["intro", "outro"]);

        let cards: Vec<&str> = roots[1]
            .sections
            .named("cards")
            .unwrap()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(cards, vec!["intro", "card", "extra", "intro", "card"]);
    }

    #[test]
    fn test_strict_fixture_rejects_mismatch() {
        let toml_str = std::fs::read_to_string(fixture_path("strict.toml")).unwrap();
        let config = Config::from_toml(&toml_str).unwrap();
        let err = format("<root>\n  <item/>\n</rot>", &config).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse {
                source: ParseError::MismatchedClosingTag { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_tokenize_error_offset() {
        let err = parse_str("<a>\n  <b x=\"open/>\n</a>", &ParserOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Tokenize(_)));
        assert_eq!(tokenizer::location("<a>\n  <b x=\"open/>\n</a>", err.offset()), (2, 8));
    }

    #[test]
    fn test_parse_error_offset() {
        let source = "<a>\n  {block missing}\n</a>";
        let err = parse_str(source, &ParserOptions::default()).unwrap_err();
        assert!(err.to_string().contains("unknown macro block `missing`"));
        // Points at the closing `}` of the macro call
        assert_eq!(tokenizer::location(source, err.offset()), (2, 17));
    }

    #[test]
    fn test_unclosed_error_points_at_element_name() {
        let source = "<a>\n  <b>\n";
        let err = parse_str(source, &ParserOptions::default()).unwrap_err();
        assert_eq!(tokenizer::location(source, err.offset()), (2, 4));
    }

    fn normalize(s: &str) -> Vec<String> {
        s.lines().map(|l| l.trim_end().to_string()).collect()
    }
}
