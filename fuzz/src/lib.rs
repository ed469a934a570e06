use rdfio::model::ErrorKind;
use rdfio::{ParserConfig, RdfFormat, RdfParser, RdfSerializer, Statement};

/// The shared fuzz contract: arbitrary bytes either parse into well-formed
/// statements ending in end-of-input, or fail with a taxonomy-classified
/// error. The parser must never panic, and accumulators respect the safe
/// preset caps.
pub fn check_parse_contract(format: RdfFormat, data: &[u8]) {
    let reader = match RdfParser::from_format(format)
        .with_config(ParserConfig::safe())
        .for_slice(data)
    {
        Ok(reader) => reader,
        Err(error) => {
            assert_classified(&error);
            return;
        }
    };
    let mut statements = Vec::new();
    for result in reader {
        match result {
            Ok(statement) => {
                check_statement(&statement);
                statements.push(statement);
            }
            Err(error) => {
                assert_classified(&error);
                return;
            }
        }
    }
    // Re-encoding accepted statements must not panic either.
    let mut writer = RdfSerializer::from_format(format).for_writer(Vec::new());
    for statement in &statements {
        if writer.write_statement(statement).is_err() {
            return; // some statements are not representable in every format
        }
    }
    let _ = writer.close();
}

fn check_statement(statement: &Statement) {
    assert!(
        !statement.predicate.as_str().is_empty(),
        "parsers must never emit an empty predicate"
    );
}

fn assert_classified(error: &rdfio::RdfParseError) {
    assert!(
        matches!(
            error.kind(),
            ErrorKind::Syntax
                | ErrorKind::Io
                | ErrorKind::LineTooLong
                | ErrorKind::StatementTooLong
                | ErrorKind::DepthExceeded
                | ErrorKind::StatementLimitExceeded
                | ErrorKind::Canceled
                | ErrorKind::UnsupportedFormat
        ),
        "errors must carry a taxonomy kind"
    );
}
