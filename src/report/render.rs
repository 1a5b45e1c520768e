//! Text rendering

use super::{
    AccessRecord, AllocRecord, BlockRecord, CallRecord, Entry, FunctionSignature, LoopRecord,
    ParamRecord, Record, Report,
};
use std::fmt::{self, Write};

const DEFAULT_INDENT: &str = "  ";

fn pad(out: &mut String, indent: &str, depth: usize) {
    for _ in 0..depth {
        out.push_str(indent);
    }
}

fn opt<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn opt_or_na<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "NA".to_string())
}

impl fmt::Display for ParamRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P[addr:{};name:{};type:{};n_bit:{};size:{};]",
            self.addr,
            self.name,
            self.trace,
            self.n_bit,
            opt(&self.size)
        )
    }
}

impl fmt::Display for LoopRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L[name:{};depth:{};iterations:{};stride:{};lcds:{};]",
            self.name, self.depth, self.iterations, self.stride, self.lcds
        )
    }
}

impl AccessRecord {
    fn render(&self, tag: char, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[addr:{};name:{};offset:NA;]",
            tag,
            opt(&self.addr),
            opt(&self.name)
        )
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C[name:{};n_of_instructions:{};]",
            opt_or_na(&self.name),
            opt(&self.n_of_instructions)
        )
    }
}

impl fmt::Display for AllocRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A[name:{};type:{};n_bit:{};size:{};]",
            self.name,
            self.ty,
            self.n_bit,
            opt_or_na(&self.size)
        )
    }
}

impl fmt::Display for BlockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BB[name:{};n_of_instructions:{};succ:{};]",
            self.name,
            self.n_of_instructions,
            self.succ.join(",")
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Read(r) => r.render('R', f),
            Record::Write(r) => r.render('W', f),
            Record::Call(r) => fmt::Display::fmt(r, f),
            Record::Alloc(r) => fmt::Display::fmt(r, f),
            Record::Block(r) => fmt::Display::fmt(r, f),
        }
    }
}

impl Entry {
    /// Append this entry at `depth`, one line per record
    pub fn render_into(&self, out: &mut String, indent: &str, depth: usize) {
        match self {
            Entry::Record(record) => {
                pad(out, indent, depth);
                let _ = writeln!(out, "{}", record);
            }
            Entry::Loop { record, body } => {
                pad(out, indent, depth);
                let _ = writeln!(out, "{}{{", record);
                for child in body {
                    child.render_into(out, indent, depth + 1);
                }
                pad(out, indent, depth);
                out.push_str("}\n");
            }
        }
    }
}

impl FunctionSignature {
    /// Append the `F` block of this function
    pub fn render_into(&self, out: &mut String, indent: &str) {
        let _ = writeln!(
            out,
            "F[name:{};call_freq:{};n_of_instructions:{};]{{",
            self.name, self.call_freq, self.n_of_instructions
        );
        for param in &self.params {
            pad(out, indent, 1);
            let _ = writeln!(out, "{}", param);
        }
        for entry in &self.body {
            entry.render_into(out, indent, 1);
        }
        out.push_str("}\n");
    }

    /// Render with the given indentation unit
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        self.render_into(&mut out, indent);
        out
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_INDENT))
    }
}

impl Report {
    /// Render every function, separated by blank lines
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            func.render_into(&mut out, indent);
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_INDENT))
    }
}
