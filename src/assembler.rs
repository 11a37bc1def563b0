//! Dependency-ordered assembly of a project into one deployable file.
//!
//! Assembly reads every fragment fresh, scans each one for forbidden
//! constructs, and concatenates them in load order. Development builds
//! carry the violations as warnings and mark fragment boundaries with a
//! banner comment; production builds reject on any violation and emit the
//! bare concatenation the platform expects.

use serde::{Deserialize, Serialize};

use crate::error::{AssemblyError, ScriptlineResult};
use crate::fragment::{load_fragments, MissingPolicy};
use crate::project::ProjectDescriptor;
use crate::scanner::{FragmentViolation, RuleSet};
use crate::store::FragmentStore;

/// Knobs for one assembly run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AssembleOptions {
    /// Production mode: no banners, and any compliance violation rejects
    /// the whole assembly.
    pub production: bool,
}

/// Facts about an assembled output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyStats {
    /// Output size in bytes.
    pub size: usize,
    /// Number of fragments concatenated.
    pub fragment_count: usize,
    /// Lowercase hex BLAKE3 digest of the output. Two assemblies of the
    /// same sources in the same mode always agree.
    pub checksum: String,
}

/// A successful assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assembly {
    /// The concatenated output.
    pub output: String,
    /// Size, count and checksum of `output`.
    pub stats: AssemblyStats,
    /// Violations found during scanning. Always empty in production mode
    /// (a production assembly with violations fails instead).
    pub violations: Vec<FragmentViolation>,
}

/// Assembles the project into one output string.
///
/// Any missing required fragment fails assembly in both modes; a partial
/// artifact is never produced.
pub fn assemble(
    store: &dyn FragmentStore,
    descriptor: &ProjectDescriptor,
    options: AssembleOptions,
) -> ScriptlineResult<Assembly> {
    let fragments = load_fragments(store, descriptor, MissingPolicy::Fail)?;

    let rules = RuleSet::new();
    let mut violations = Vec::new();
    for fragment in &fragments {
        for violation in rules.scan(&fragment.text) {
            violations.push(FragmentViolation {
                fragment: fragment.name.clone(),
                violation,
            });
        }
    }

    if options.production && !violations.is_empty() {
        return Err(AssemblyError::ComplianceRejected { violations }.into());
    }
    for found in &violations {
        tracing::warn!(
            fragment = %found.fragment,
            line = found.violation.line,
            rule = %found.violation.rule,
            "compliance violation: {}",
            found.violation.message
        );
    }

    let mut output = String::new();
    for fragment in &fragments {
        if !options.production {
            output.push_str(&format!(
                "// ===== {}: {} =====\n",
                fragment.role, fragment.name
            ));
        }
        output.push_str(&fragment.text);
        if !fragment.text.ends_with('\n') {
            output.push('\n');
        }
    }

    let stats = AssemblyStats {
        size: output.len(),
        fragment_count: fragments.len(),
        checksum: blake3::hash(output.as_bytes()).to_hex().to_string(),
    };
    tracing::info!(
        fragments = stats.fragment_count,
        bytes = stats.size,
        checksum = %stats.checksum,
        production = options.production,
        "assembly complete"
    );

    Ok(Assembly {
        output,
        stats,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::RuleId;
    use crate::store::InMemoryFragmentStore;

    fn seeded_store() -> InMemoryFragmentStore {
        let store = InMemoryFragmentStore::new();
        store.insert("init.js", "var booted = true;\n");
        store.insert("globals.js", "var GREETING = 'welcome';\n");
        store.insert("lib/10-late.js", "function late() { return 2; }\n");
        store.insert("lib/2-early.js", "function early() { return 1; }\n");
        store.insert("main.js", "var total = early() + late();\n");
        store
    }

    #[test]
    fn development_assembly_carries_banners_in_load_order() {
        let store = seeded_store();
        let assembly = assemble(
            &store,
            &ProjectDescriptor::conventional(),
            AssembleOptions::default(),
        )
        .unwrap();

        let banners: Vec<&str> = assembly
            .output
            .lines()
            .filter(|l| l.starts_with("// ====="))
            .collect();
        assert_eq!(
            banners,
            vec![
                "// ===== init: init.js =====",
                "// ===== globals: globals.js =====",
                "// ===== library: lib/2-early.js =====",
                "// ===== library: lib/10-late.js =====",
                "// ===== entry: main.js =====",
            ]
        );
        assert_eq!(assembly.stats.fragment_count, 5);
        assert!(assembly.violations.is_empty());
    }

    #[test]
    fn production_assembly_omits_banners() {
        let store = seeded_store();
        let assembly = assemble(
            &store,
            &ProjectDescriptor::conventional(),
            AssembleOptions { production: true },
        )
        .unwrap();
        assert!(!assembly.output.contains("====="));
        assert!(assembly.output.contains("var booted = true;"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let store = seeded_store();
        let descriptor = ProjectDescriptor::conventional();
        let first = assemble(&store, &descriptor, AssembleOptions::default()).unwrap();
        let second = assemble(&store, &descriptor, AssembleOptions::default()).unwrap();
        assert_eq!(first.output, second.output);
        assert_eq!(first.stats.checksum, second.stats.checksum);
    }

    #[test]
    fn development_mode_reports_violations_without_failing() {
        let store = seeded_store();
        store.insert("lib/modern.js", "const fast = (x) => x * 2;\n");
        let assembly = assemble(
            &store,
            &ProjectDescriptor::conventional(),
            AssembleOptions::default(),
        )
        .unwrap();
        assert!(!assembly.violations.is_empty());
        assert!(assembly
            .violations
            .iter()
            .all(|v| v.fragment == "lib/modern.js"));
        assert!(assembly.output.contains("const fast"));
    }

    #[test]
    fn production_mode_rejects_on_any_violation() {
        let store = seeded_store();
        store.insert("lib/modern.js", "let a = 1;\nvar t = `x${a}`;\n");
        let err = assemble(
            &store,
            &ProjectDescriptor::conventional(),
            AssembleOptions { production: true },
        )
        .unwrap_err();
        assert!(err.is_compliance_rejection());
    }

    #[test]
    fn production_rejection_carries_every_violation() {
        let store = seeded_store();
        store.insert("lib/a.js", "let a = 1;\n");
        store.insert("lib/b.js", "var f = () => 1;\n");
        let err = assemble(
            &store,
            &ProjectDescriptor::conventional(),
            AssembleOptions { production: true },
        )
        .unwrap_err();
        let crate::error::ScriptlineError::Assembly(AssemblyError::ComplianceRejected {
            violations,
        }) = err
        else {
            panic!("expected compliance rejection");
        };
        let fragments: Vec<&str> = violations.iter().map(|v| v.fragment.as_str()).collect();
        assert!(fragments.contains(&"lib/a.js"));
        assert!(fragments.contains(&"lib/b.js"));
        assert!(violations
            .iter()
            .any(|v| v.violation.rule == RuleId::ArrowFunction));
        assert!(violations
            .iter()
            .all(|v| v.violation.line == 1 && !v.violation.snippet.is_empty()));
    }

    #[test]
    fn missing_entry_fails_both_modes() {
        let store = seeded_store();
        store.remove("main.js");
        for production in [false, true] {
            let err = assemble(
                &store,
                &ProjectDescriptor::conventional(),
                AssembleOptions { production },
            )
            .unwrap_err();
            assert!(format!("{err}").contains("main.js"));
        }
    }

    #[test]
    fn explicit_order_from_config_is_honored() {
        let store = seeded_store();
        store.insert(
            crate::project::CONFIG_FILE,
            r#"{"library_order": ["10-late.js", "2-early.js"]}"#,
        );
        let descriptor = ProjectDescriptor::conventional()
            .load_config(&store)
            .unwrap();
        let assembly = assemble(&store, &descriptor, AssembleOptions::default()).unwrap();
        let late = assembly.output.find("late.js").unwrap();
        let early = assembly.output.find("early.js").unwrap();
        assert!(late < early);
    }

    #[test]
    fn edits_are_reflected_in_the_next_assembly() {
        let store = seeded_store();
        let descriptor = ProjectDescriptor::conventional();
        let first = assemble(&store, &descriptor, AssembleOptions::default()).unwrap();
        store.insert("main.js", "var total = early();\n");
        let second = assemble(&store, &descriptor, AssembleOptions::default()).unwrap();
        assert_ne!(first.stats.checksum, second.stats.checksum);
    }
}
