mod cfg_builder;

pub use cfg_builder::{BuildError, CfgBuilder};

pub mod test_util {
    use yulssa_ast::{AnalysisInfo, Dialect};

    use crate::{ir_writer::CfgWriter, SsaCfg};

    pub fn dump_cfg(cfg: &SsaCfg, dialect: &Dialect, info: &AnalysisInfo) -> String {
        CfgWriter::new(cfg)
            .with_dialect(dialect)
            .with_scopes(&info.scopes)
            .dump_string()
    }
}
