//! Property-based tests for the signature analyzer
//!
//! These tests use proptest to generate random control-flow graphs and
//! random type shapes and verify that:
//! 1. Analysis of any well-formed function succeeds and is deterministic
//! 2. Loop blocks are balanced, unique, and nested by increasing depth
//! 3. Every indexed access and call is reported exactly once
//! 4. The type-size resolver is total and matches a direct computation

use fnsig::ir::{BinaryOp, BlockId, FunctionBuilder, Module, Param, TypeId, TypeTable, Value};
use fnsig::{
    AnalysisOptions, Analyzer, Entry, LoopForest, NoTripInfo, Record, TypeSize, TypeSizeResolver,
};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// One block: (first target, second target, conditional?, body ops)
type BlockSpec = (usize, usize, bool, Vec<u8>);

/// Random CFGs of 1..10 blocks with random bodies
fn cfg_spec() -> impl Strategy<Value = Vec<BlockSpec>> {
    (1usize..10).prop_flat_map(|n| {
        let ops = prop::collection::vec(0u8..4, 0..5);
        prop::collection::vec((0..n, 0..n, any::<bool>(), ops), n)
    })
}

/// Counts of what a generated function must report
#[derive(Debug, Default)]
struct Expected {
    reads: usize,
    writes: usize,
    calls: usize,
}

/// Build a module whose function `f` follows `spec`. Ops: 0 indexed load,
/// 1 indexed store, 2 self-referential merge, 3 external call.
fn build(spec: &[BlockSpec]) -> (Module, Expected) {
    let mut module = Module::new("fuzz");
    let void = module.types.void();
    let i32t = module.types.scalar(32);
    let p32 = module.types.pointer(i32t);
    let ext = module.declare_function("ext", vec![]);
    let f = module.declare_function("f", vec![Param::new("a", p32)]);

    let mut expected = Expected::default();
    let mut b = FunctionBuilder::new(void);
    let blocks: Vec<BlockId> = (0..spec.len())
        .map(|i| b.add_block(&format!("bb{}", i)))
        .collect();

    for (i, (t1, t2, cond, ops)) in spec.iter().enumerate() {
        b.switch_to(blocks[i]);
        for op in ops {
            match *op {
                0 => {
                    let idx = b.element_ptr("idx", Value::Arg(0), vec![Value::ConstInt(1)], p32);
                    b.load("v", idx, i32t);
                    expected.reads += 1;
                }
                1 => {
                    let idx = b.element_ptr("idx", Value::Arg(0), vec![Value::ConstInt(2)], p32);
                    b.store(Value::ConstInt(0), idx);
                    expected.writes += 1;
                }
                2 => {
                    let p = b.phi("p", vec![(Value::ConstInt(0), blocks[0])], i32t);
                    let one = Value::ConstInt(1);
                    let next = b.binary("p.next", BinaryOp::Add, p.clone(), one, i32t);
                    b.add_incoming(&p, next, blocks[i]);
                }
                _ => {
                    b.call(None, ext, vec![], void);
                    expected.calls += 1;
                }
            }
        }
        if *cond {
            b.cond_br(Value::Arg(0), blocks[*t1], blocks[*t2]);
        } else {
            b.br(blocks[*t1]);
        }
    }

    module
        .define_function(f, b.finish())
        .expect("generated body is well formed");
    (module, expected)
}

/// Type shapes; literal structs only, so nothing is denylisted or cyclic
#[derive(Debug, Clone)]
enum Shape {
    Scalar(u32),
    Pointer(Box<Shape>),
    Array(Box<Shape>, u64),
    Vector(u32, u64),
    Struct(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        prop::sample::select(vec![1u32, 8, 16, 32, 64]).prop_map(Shape::Scalar),
        (prop::sample::select(vec![8u32, 32]), 1u64..8).prop_map(|(b, n)| Shape::Vector(b, n)),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Pointer(Box::new(s))),
            (inner.clone(), 1u64..6).prop_map(|(s, n)| Shape::Array(Box::new(s), n)),
            prop::collection::vec(inner, 0..4).prop_map(Shape::Struct),
        ]
    })
}

fn intern(types: &mut TypeTable, shape: &Shape) -> TypeId {
    match shape {
        Shape::Scalar(bits) => types.scalar(*bits),
        Shape::Pointer(inner) => {
            let inner = intern(types, inner);
            types.pointer(inner)
        }
        Shape::Array(inner, n) => {
            let inner = intern(types, inner);
            types.array(inner, *n)
        }
        Shape::Vector(bits, n) => {
            let elem = types.scalar(*bits);
            types.vector(elem, *n)
        }
        Shape::Struct(fields) => {
            let fields = fields.iter().map(|f| intern(types, f)).collect();
            types.structure(None, fields)
        }
    }
}

fn primitive(shape: &Shape) -> u64 {
    match shape {
        Shape::Scalar(bits) => u64::from(*bits),
        Shape::Vector(bits, n) => u64::from(*bits) * n,
        _ => 0,
    }
}

/// Direct footprint computation
fn footprint(shape: &Shape) -> u64 {
    match shape {
        Shape::Scalar(_) | Shape::Vector(..) => primitive(shape),
        Shape::Pointer(inner) => footprint(inner),
        Shape::Struct(fields) => fields.iter().map(footprint).sum(),
        Shape::Array(..) => {
            let mut product = 1;
            let mut current = shape;
            while let Shape::Array(elem, n) = current {
                product *= n;
                if primitive(elem) != 0 {
                    return product * primitive(elem);
                }
                current = elem.as_ref();
            }
            0
        }
    }
}

fn check_nesting(entries: &[Entry], parent_depth: u32) -> Result<(), TestCaseError> {
    for entry in entries {
        if let Entry::Loop { record, body } = entry {
            prop_assert!(record.depth > parent_depth);
            check_nesting(body, record.depth)?;
        }
    }
    Ok(())
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn analysis_is_deterministic(spec in cfg_spec()) {
        let (module, _) = build(&spec);
        let first = Analyzer::default().analyze_module(&module, &NoTripInfo).unwrap();
        let second = Analyzer::default().analyze_module(&module, &NoTripInfo).unwrap();
        prop_assert_eq!(first.to_string(), second.to_string());
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn loops_are_balanced_and_unique(spec in cfg_spec()) {
        let (module, _) = build(&spec);
        let report = Analyzer::default().analyze_module(&module, &NoTripInfo).unwrap();
        let signature = report.function("f").unwrap();

        let text = signature.to_string();
        prop_assert_eq!(text.matches('{').count(), text.matches('}').count());

        let func = module.function_by_name("f").unwrap();
        let forest = LoopForest::compute(func);
        prop_assert_eq!(signature.loop_count(), forest.len());
        check_nesting(&signature.body, 0)?;
    }

    #[test]
    fn records_are_reported_once(spec in cfg_spec()) {
        let (module, expected) = build(&spec);
        let report = Analyzer::default().analyze_module(&module, &NoTripInfo).unwrap();
        let records = report.function("f").unwrap().records();

        let reads = records.iter().filter(|r| matches!(r, Record::Read(_))).count();
        let writes = records.iter().filter(|r| matches!(r, Record::Write(_))).count();
        let calls = records.iter().filter(|r| matches!(r, Record::Call(_))).count();
        prop_assert_eq!(reads, expected.reads);
        prop_assert_eq!(writes, expected.writes);
        prop_assert_eq!(calls, expected.calls);
    }

    #[test]
    fn parallel_matches_sequential(spec in cfg_spec()) {
        let (module, _) = build(&spec);
        let sequential = Analyzer::default().analyze_module(&module, &NoTripInfo).unwrap();
        let parallel = Analyzer::default().analyze_module_parallel(&module, &NoTripInfo).unwrap();
        prop_assert_eq!(sequential, parallel);
    }

    #[test]
    fn resolver_matches_direct_footprint(shape in shape()) {
        let mut types = TypeTable::new();
        let ty = intern(&mut types, &shape);
        let options = AnalysisOptions::default();
        let resolution = TypeSizeResolver::new(&types, &options).resolve(ty);
        prop_assert_eq!(resolution.bits, TypeSize::Bits(footprint(&shape)));
        prop_assert!(!resolution.trace.contains('?'));
    }
}
