mod config;
mod diagnostic;
mod report;
mod validate;

pub use config::{ValidationLevel, ValidatorConfig};
pub use diagnostic::{
    Diagnostic, DiagnosticCode, DiagnosticContext, GraphRef, Location, Note, Severity,
};
pub use report::ValidationReport;
pub use validate::{validate, validate_or_panic, ValueSet, VariableMapping};

#[macro_export]
macro_rules! debug_validate {
    ($control_flow:expr, $ast:expr, $analysis_info:expr, $dialect:expr) => {{
        if cfg!(debug_assertions) || cfg!(feature = "validate-ssa") {
            let config = $crate::ValidatorConfig::for_level($crate::ValidationLevel::Full);
            let report = $crate::validate($control_flow, $ast, $analysis_info, $dialect, &config);
            if report.has_errors() {
                eprintln!("YULSSA_VALIDATION_FAILURE");
                eprintln!("{report}");
                panic!("YULSSA_VALIDATION_FAILURE");
            }
        }
    }};
}
