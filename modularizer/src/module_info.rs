//! Module declaration source generation.

use jarmod::Module;

/// File name of the module declaration source.
pub const MODULE_INFO_SOURCE: &str = "module-info.java";

/// File name of the compiled module descriptor, both in the scratch
/// directory and as the archive entry.
pub const MODULE_INFO_CLASS: &str = "module-info.class";

/// Renders the `module-info.java` text for `module`.
///
/// Explicit exports replace `implicit_exports`; without explicit requires no
/// `requires` directive is emitted.
///
/// # Examples
///
/// ```
/// use jarmod::{Module, ModuleName};
/// use jarmod_modularizer::module_info::render_module_info;
///
/// let module = Module::new("app", None, Some(vec![ModuleName::from("core")]));
/// let source = render_module_info(&module, &["com.app".to_owned()]);
/// assert_eq!(
///     source,
///     "module app {\n    exports com.app;\n    requires core;\n}\n"
/// );
/// ```
#[must_use]
pub fn render_module_info(module: &Module, implicit_exports: &[String]) -> String {
    let exports = module.exports().unwrap_or(implicit_exports);

    let mut lines = vec![format!("module {} {{", module.name())];
    lines.extend(exports.iter().map(|package| format!("    exports {package};")));
    lines.extend(
        module
            .required_modules()
            .map(|required| format!("    requires {required};")),
    );
    lines.push("}\n".to_owned());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarmod::ModuleName;
    use rstest::rstest;

    fn implicit() -> Vec<String> {
        vec!["com.acme".to_owned(), "com.acme.util".to_owned()]
    }

    #[test]
    fn implicit_exports_used_when_none_declared() {
        let source = render_module_info(&Module::named("acme"), &implicit());
        assert_eq!(
            source,
            "module acme {\n    exports com.acme;\n    exports com.acme.util;\n}\n"
        );
    }

    #[rstest]
    #[case::explicit_list(Some(vec!["com.acme.api".to_owned()]), "    exports com.acme.api;\n")]
    #[case::explicit_empty(Some(Vec::new()), "")]
    fn explicit_exports_replace_implicit(
        #[case] exports: Option<Vec<String>>,
        #[case] expected_body: &str,
    ) {
        let module = Module::new("acme", exports, None);
        let source = render_module_info(&module, &implicit());
        assert_eq!(source, format!("module acme {{\n{expected_body}}}\n"));
    }

    #[test]
    fn requires_follow_exports() {
        let module = Module::new(
            "app",
            Some(vec!["com.app".to_owned()]),
            Some(vec![ModuleName::from("core"), ModuleName::from("java.sql")]),
        );
        let source = render_module_info(&module, &[]);
        assert_eq!(
            source,
            "module app {\n    exports com.app;\n    requires core;\n    requires java.sql;\n}\n"
        );
    }
}
