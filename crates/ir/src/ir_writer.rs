//! Text form of an [`SsaCfg`].
//!
//! ```text
//! function f(v0) -> 1 {
//! block0:
//!     v2 = add(v0, 1)
//!     branch v2, block1, block2
//! block1 <- (block0):
//!     return v2
//! }
//! ```
//!
//! Literals are printed as their value, every other value as `v<n>`. Names of builtins and
//! functions are resolved through the dialect and scopes when they are supplied.
use std::io;

use yulssa_ast::{Dialect, Scopes};

use crate::{BlockId, Exit, Operation, OperationKind, SsaCfg, ValueId, ValueInfo};

pub struct CfgWriter<'a> {
    cfg: &'a SsaCfg,
    dialect: Option<&'a Dialect>,
    scopes: Option<&'a Scopes>,
}

impl<'a> CfgWriter<'a> {
    pub fn new(cfg: &'a SsaCfg) -> Self {
        Self {
            cfg,
            dialect: None,
            scopes: None,
        }
    }

    pub fn with_dialect(mut self, dialect: &'a Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_scopes(mut self, scopes: &'a Scopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    pub fn write(&self, mut w: impl io::Write) -> io::Result<()> {
        match self.cfg.function {
            Some(func) => {
                write!(w, "function {}(", self.function_name(func))?;
                let args: Vec<_> = self.cfg.arguments.iter().map(|(_, arg)| *arg).collect();
                self.write_values(&args, &mut w)?;
                writeln!(w, ") -> {} {{", self.cfg.returns.len())?;
            }
            None => writeln!(w, "main {{")?,
        }

        for (block, _) in self.cfg.blocks() {
            self.write_block(block, &mut w)?;
        }

        writeln!(w, "}}")
    }

    pub fn write_block(&self, block: BlockId, mut w: impl io::Write) -> io::Result<()> {
        let data = self.cfg.block(block);
        write!(w, "{block}")?;
        if !data.entries.is_empty() {
            write!(w, " <- (")?;
            for (i, entry) in data.entries.iter().enumerate() {
                if i > 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{entry}")?;
            }
            write!(w, ")")?;
        }
        writeln!(w, ":")?;

        for phi in &data.phis {
            write!(w, "    {phi} = phi(")?;
            if let Some(ValueInfo::Phi { arguments, .. }) = self.cfg.value_info(*phi) {
                self.write_values(arguments, &mut w)?;
            }
            writeln!(w, ")")?;
        }

        for op in &data.operations {
            write!(w, "    ")?;
            self.write_operation(op, &mut w)?;
            writeln!(w)?;
        }

        write!(w, "    ")?;
        self.write_exit(&data.exit, &mut w)?;
        writeln!(w)
    }

    pub fn write_operation(&self, op: &Operation, mut w: impl io::Write) -> io::Result<()> {
        if !op.outputs.is_empty() {
            self.write_values(&op.outputs, &mut w)?;
            write!(w, " = ")?;
        }

        match op.kind {
            OperationKind::BuiltinCall { builtin } => match self.dialect {
                Some(dialect) => write!(w, "{}", dialect.builtin(builtin).name)?,
                None => write!(w, "{builtin}")?,
            },
            OperationKind::Call { function, .. } => {
                write!(w, "call {}", self.function_name(function))?
            }
        }

        write!(w, "(")?;
        self.write_values(&op.inputs, &mut w)?;
        write!(w, ")")
    }

    pub fn write_exit(&self, exit: &Exit, mut w: impl io::Write) -> io::Result<()> {
        match exit {
            Exit::MainExit => write!(w, "exit"),
            Exit::Jump(jump) => write!(w, "jump {}", jump.target),
            Exit::ConditionalJump(jump) => {
                write!(w, "branch ")?;
                self.write_value(jump.condition, &mut w)?;
                write!(w, ", {}, {}", jump.non_zero, jump.zero)
            }
            Exit::FunctionReturn(ret) => {
                write!(w, "return")?;
                if !ret.return_values.is_empty() {
                    write!(w, " ")?;
                    self.write_values(&ret.return_values, &mut w)?;
                }
                Ok(())
            }
            Exit::Terminated => write!(w, "terminated"),
        }
    }

    pub fn write_value(&self, value: ValueId, mut w: impl io::Write) -> io::Result<()> {
        match self.cfg.value_info(value) {
            Some(ValueInfo::Literal(literal)) => write!(w, "{literal}"),
            Some(ValueInfo::Unreachable) => write!(w, "unreachable"),
            _ => write!(w, "{value}"),
        }
    }

    fn write_values(&self, values: &[ValueId], mut w: impl io::Write) -> io::Result<()> {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                write!(w, ", ")?;
            }
            self.write_value(*value, &mut w)?;
        }
        Ok(())
    }

    fn function_name(&self, func: yulssa_ast::FunctionId) -> String {
        match self.scopes.and_then(|scopes| scopes.get_function(func)) {
            Some(data) => data.name.to_string(),
            None => func.to_string(),
        }
    }

    pub fn dump_string(&self) -> String {
        let mut s = Vec::new();
        let _ = self.write(&mut s);
        String::from_utf8_lossy(&s).into_owned()
    }

    pub fn block_string(&self, block: BlockId) -> String {
        let mut s = Vec::new();
        let _ = self.write_block(block, &mut s);
        String::from_utf8_lossy(&s).into_owned()
    }

    pub fn operation_string(&self, op: &Operation) -> String {
        let mut s = Vec::new();
        let _ = self.write_operation(op, &mut s);
        String::from_utf8_lossy(&s).into_owned()
    }

    pub fn exit_string(&self, exit: &Exit) -> String {
        let mut s = Vec::new();
        let _ = self.write_exit(exit, &mut s);
        String::from_utf8_lossy(&s).into_owned()
    }
}
