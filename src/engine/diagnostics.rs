//! Not-found diagnostics.
//!
//! A failed search renders every requested slot, one per line, under a header
//! naming the kind and the searched target:
//!
//! ```text
//! Can't find this Method in [com.demo.Foo]:
//!   -> name:[foo] index(-1)
//!   -> paramCount:[1]
//! Generated by memberfind::resolver
//! ```

use crate::error::{MemberKind, NotFoundError};

/// Tag appended to every template and used as the `tracing` target.
pub const LOG_TARGET: &str = "memberfind::resolver";

pub(crate) fn render_template(kind: MemberKind, target: &str, lines: &[String]) -> String {
    let mut out = format!("Can't find this {kind} in [{target}]:\n");
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        out.push_str("  -> ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("Generated by ");
    out.push_str(LOG_TARGET);
    out
}

pub(crate) fn not_found(kind: MemberKind, target: &str, lines: &[String]) -> NotFoundError {
    NotFoundError { kind, target: target.to_string(), template: render_template(kind, target, lines) }
}
