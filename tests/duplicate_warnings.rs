//! Logging coverage for duplicate declarations.

use jarmod::{parse_descriptor, processing_order};
use log::Level;
use logtest::Logger;

const DUPLICATE_MODULE_WARNING: &str =
    "'core-copy.jar' declares module 'core' already provided by 'core.jar'";

fn warnings(logger: &mut Logger) -> Vec<String> {
    let mut messages = Vec::new();
    while let Some(record) = logger.pop() {
        if record.level() == Level::Warn {
            messages.push(record.args().to_string());
        }
    }
    messages
}

#[test]
fn duplicate_archives_and_modules_are_warned_about() {
    let mut logger = Logger::start();

    let artifacts = parse_descriptor(
        r#"[
            {"name": "core.jar", "module": {"name": "core"}},
            {"name": "core.jar", "module": {"name": "core2"}},
            {"name": "core-copy.jar", "module": {"name": "core"}}
        ]"#,
    )
    .expect("descriptor should parse");
    let order: Vec<&str> = processing_order(&artifacts)
        .expect("no cycle")
        .into_iter()
        .map(|artifact| artifact.name())
        .collect();

    assert_eq!(order, vec!["core.jar"]);
    let messages = warnings(&mut logger);
    assert!(
        messages
            .iter()
            .any(|msg| msg.contains("artifact 'core.jar' is declared more than once")),
        "missing duplicate archive warning in {messages:?}"
    );
    assert!(
        messages.iter().any(|msg| msg.contains(DUPLICATE_MODULE_WARNING)),
        "missing duplicate module warning in {messages:?}"
    );
}
