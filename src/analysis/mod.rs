//! # Signature Analysis
//!
//! The analysis session and the components it drives.
//!
//! ```text
//! analysis/
//! ├── mod.rs         # Analyzer: session owning options and the function registry
//! ├── options.rs     # AnalysisOptions (serde, JSON overrides)
//! ├── registry.rs    # FunctionRegistry (run scope), Visitation (activation scope)
//! ├── type_size.rs   # TypeSizeResolver: recursive bit footprint + trace
//! ├── dependency.rs  # Loop-carried dependency count at a loop header
//! ├── classifier.rs  # R/W/C/A records from single instructions
//! └── walker.rs      # LoopNestWalker: depth-first loop-nest traversal
//! ```
//!
//! ## Session lifecycle
//!
//! An [`Analyzer`] lives for one run. Each analyzed function is registered
//! first, so later call sites can print its instruction count; functions
//! not analyzed yet print a blank count. [`Analyzer::reset`] starts a new
//! run on the same analyzer.

mod classifier;
mod dependency;
mod options;
mod registry;
mod type_size;
mod walker;

pub use classifier::InstructionClassifier;
pub use dependency::{is_induction_update, loop_carried_dependencies};
pub use options::AnalysisOptions;
pub use registry::{FunctionRegistry, Visitation};
pub use type_size::{Resolution, TypeSize, TypeSizeResolver};
pub use walker::LoopNestWalker;

use crate::error::{Error, ErrorSeverity, Result};
use crate::ir::{Function, Module};
use crate::oracle::{DebugOracle, LoopForest, LoopOracle, ProfileOracle, RangeOracle};
use crate::report::{FunctionSignature, ParamRecord, Report, SkippedFunction};
use rayon::prelude::*;

/// Signature-analysis session
#[derive(Debug, Default)]
pub struct Analyzer {
    options: AnalysisOptions,
    registry: FunctionRegistry,
}

impl Analyzer {
    /// Create a session with the given options
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            registry: FunctionRegistry::new(),
        }
    }

    /// Options of this session
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Functions analyzed so far in this run
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Forget every analyzed function
    pub fn reset(&self) {
        self.registry.clear();
    }

    /// Render `report` as text, indenting with [`AnalysisOptions::indent`]
    pub fn render(&self, report: &Report) -> String {
        report.render(&self.options.indent)
    }

    /// Analyze one function with caller-supplied loop and range oracles
    pub fn analyze_function<L, R>(
        &self,
        module: &Module,
        func: &Function,
        loops: &L,
        ranges: &R,
    ) -> Result<FunctionSignature>
    where
        L: LoopOracle + ?Sized,
        R: RangeOracle + ?Sized,
    {
        if func.is_declaration() {
            return Err(Error::Declaration {
                name: func.name.clone(),
            });
        }

        let n_of_instructions = self.registry.register(func);
        tracing::debug!(
            "analyzing {} ({} instructions)",
            func.name,
            n_of_instructions
        );

        let params = self.params(module, func);
        let input_bits = params
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.n_bit.bits_or_zero()));

        let classifier = InstructionClassifier::new(module, func, &self.registry, &self.options);
        let body = LoopNestWalker::new(func, loops, ranges, classifier, &self.options).walk();

        Ok(FunctionSignature {
            name: func.name.clone(),
            call_freq: module.entry_frequency(func).unwrap_or(0),
            n_of_instructions,
            input_bytes: input_bits / 8,
            params,
            body,
        })
    }

    fn params(&self, module: &Module, func: &Function) -> Vec<ParamRecord> {
        let resolver = TypeSizeResolver::new(&module.types, &self.options);
        let size = module.source_location(func).map(|loc| loc.to_string());
        func.params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let resolution = resolver.resolve(param.ty);
                ParamRecord {
                    addr: format!("%a{}", i),
                    name: param.name.clone(),
                    trace: resolution.trace,
                    n_bit: resolution.bits,
                    size: size.clone(),
                }
            })
            .collect()
    }

    /// Analyze every defined function in module order
    ///
    /// Functions failing with a recoverable error are listed in
    /// [`Report::skipped`]; fatal errors abort the run.
    pub fn analyze_module<R>(&self, module: &Module, ranges: &R) -> Result<Report>
    where
        R: RangeOracle + ?Sized,
    {
        let mut report = Report::default();
        for func in module.defined_functions() {
            let forest = LoopForest::compute(func);
            let result = self.analyze_function(module, func, &forest, ranges);
            record_outcome(&mut report, func, result)?;
        }
        Ok(report)
    }

    /// Analyze every defined function on a rayon pool
    ///
    /// All functions are registered up front, so call sites resolve to
    /// their callee's count regardless of module order. The report keeps
    /// module order and is identical across runs.
    pub fn analyze_module_parallel<R>(&self, module: &Module, ranges: &R) -> Result<Report>
    where
        R: RangeOracle + Sync + ?Sized,
    {
        let functions: Vec<&Function> = module.defined_functions().collect();
        for func in &functions {
            self.registry.register(func);
        }

        let threads = match self.options.threads {
            0 => num_cpus::get(),
            n => n,
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.min(functions.len()).max(1))
            .build()
            .map_err(|e| Error::config(format!("Failed to create thread pool: {}", e)))?;

        let results: Vec<Result<FunctionSignature>> = pool.install(|| {
            functions
                .par_iter()
                .map(|func| {
                    let forest = LoopForest::compute(func);
                    self.analyze_function(module, func, &forest, ranges)
                })
                .collect()
        });

        let mut report = Report::default();
        for (func, result) in functions.into_iter().zip(results) {
            record_outcome(&mut report, func, result)?;
        }
        Ok(report)
    }
}

fn record_outcome(
    report: &mut Report,
    func: &Function,
    result: Result<FunctionSignature>,
) -> Result<()> {
    match result {
        Ok(signature) => report.functions.push(signature),
        Err(err) if err.classify() == ErrorSeverity::Recoverable => {
            tracing::warn!("skipping {}: {}", func.name, err);
            report.skipped.push(SkippedFunction {
                name: func.name.clone(),
                reason: err.to_string(),
            });
        }
        Err(err) => return Err(err),
    }
    Ok(())
}
