// Report compilation: template tree + CV data → LaTeX.
// Pure and synchronous; callers fetch schemas and records before compiling.

pub mod columns;
pub mod compiler;
pub mod escape;
pub mod markup;

pub use columns::{default_report_layout, ReportLayout};
pub use compiler::{compile_with, CompileContext};
