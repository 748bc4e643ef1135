//! Parse command handler: show how identifiers normalize.

use anyhow::Result;
use papershelf_core::identifier::classify;
use papershelf_core::parse_identifier;
use serde_json::json;

use super::print_json_line;
use crate::cli::ParseArgs;

pub(crate) fn run_parse_command(args: &ParseArgs) -> Result<()> {
    for raw in &args.ids {
        let parsed = parse_identifier(raw);
        let shape = classify(raw.trim());

        if args.json {
            print_json_line(&json!({
                "raw": raw,
                "identity": parsed.identity,
                "rule": parsed.rule,
                "explicit_version": parsed.explicit_version,
                "confidence": parsed.confidence,
                "shape": shape,
            }))?;
        } else {
            let shape_label = shape.map_or("unrecognized", |shape| shape.as_str());
            println!(
                "{raw}\t{}\trule={} confidence={} shape={shape_label}",
                parsed.identity, parsed.rule, parsed.confidence
            );
        }
    }
    Ok(())
}
