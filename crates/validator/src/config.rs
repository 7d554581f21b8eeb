#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Fast,
    Standard,
    Full,
}

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub level: ValidationLevel,
    pub max_diagnostics: usize,
    /// Require every phi of a join block to be held by some variable after consolidation.
    pub check_phi_ownership: bool,
    /// Warn about statements following one that never falls through.
    pub report_unreachable: bool,
    /// Attach a dump of the offending block to every diagnostic.
    pub attach_snippets: bool,
    /// Upper bound on replays of a loop while its header bindings keep narrowing.
    pub max_loop_iterations: usize,
}

impl ValidatorConfig {
    pub fn for_level(level: ValidationLevel) -> Self {
        match level {
            ValidationLevel::Fast => Self {
                level,
                max_diagnostics: 200,
                check_phi_ownership: false,
                report_unreachable: false,
                attach_snippets: false,
                max_loop_iterations: 64,
            },
            ValidationLevel::Standard => Self {
                level,
                max_diagnostics: 200,
                check_phi_ownership: false,
                report_unreachable: false,
                attach_snippets: false,
                max_loop_iterations: 64,
            },
            ValidationLevel::Full => Self {
                level,
                max_diagnostics: 500,
                check_phi_ownership: true,
                report_unreachable: true,
                attach_snippets: true,
                max_loop_iterations: 64,
            },
        }
    }

    pub fn should_attach_context(&self) -> bool {
        !matches!(self.level, ValidationLevel::Fast)
    }

    pub fn should_check_phi_ownership(&self) -> bool {
        self.check_phi_ownership || matches!(self.level, ValidationLevel::Full)
    }

    pub fn should_report_unreachable(&self) -> bool {
        self.report_unreachable || matches!(self.level, ValidationLevel::Full)
    }

    pub fn should_attach_snippets(&self) -> bool {
        self.attach_snippets || matches!(self.level, ValidationLevel::Full)
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::for_level(ValidationLevel::Standard)
    }
}
