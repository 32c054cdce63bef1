//! CLI output formatting for resolved plans.
//!
//! Used by `--dry-run`: the plan is printed instead of encoding the image.
//!
//! ```text
//! Source: 640x480 png
//! Output: 512x384 image/webp
//!     Quality: 50
//!     Resize: 640x480 → 512x384
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O; the
//! `print_*` wrappers write to stdout.

use crate::imaging::{Dimensions, ResolvedPlan};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a resolved plan next to the source it was resolved for.
pub fn format_plan(source: Dimensions, source_format: &str, plan: &ResolvedPlan) -> Vec<String> {
    let mut lines = vec![
        format!("Source: {}x{} {}", source.width, source.height, source_format),
        format!("Output: {}x{} {}", plan.width, plan.height, plan.mime()),
    ];

    if plan.format.supports_quality() {
        lines.push(format!("{}Quality: {}", indent(1), plan.quality.value()));
    } else {
        lines.push(format!("{}Quality: n/a (lossless)", indent(1)));
    }

    if plan.dimensions() == source {
        lines.push(format!("{}Resize: none", indent(1)));
    } else {
        lines.push(format!(
            "{}Resize: {}x{} → {}x{}",
            indent(1),
            source.width,
            source.height,
            plan.width,
            plan.height
        ));
    }

    lines
}

/// Print a resolved plan to stdout.
pub fn print_plan(source: Dimensions, source_format: &str, plan: &ResolvedPlan) {
    for line in format_plan(source, source_format, plan) {
        println!("{}", line);
    }
}
