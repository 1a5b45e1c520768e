use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fnsig::ir::{BinaryOp, FunctionBuilder, Module, Param, Value};
use fnsig::{AnalysisOptions, Analyzer, NoTripInfo, TypeSizeResolver};

/// Module with `functions` copies of a loop nest `depth` levels deep
fn nest_module(functions: usize, depth: usize) -> Module {
    let mut module = Module::new("bench");
    let void = module.types.void();
    let i32t = module.types.scalar(32);
    let p32 = module.types.pointer(i32t);

    for n in 0..functions {
        let f = module.declare_function(&format!("nest{}", n), vec![Param::new("a", p32)]);
        let mut b = FunctionBuilder::new(void);
        let entry = b.add_block("entry");
        let headers: Vec<_> = (0..depth).map(|d| b.add_block(&format!("h{}", d))).collect();
        let latches: Vec<_> = (0..depth).map(|d| b.add_block(&format!("l{}", d))).collect();
        let exit = b.add_block("exit");

        b.switch_to(entry);
        b.br(headers[0]);
        for d in 0..depth {
            b.switch_to(headers[d]);
            let i = b.phi("i", vec![(Value::ConstInt(0), entry)], i32t);
            let idx = b.element_ptr("arrayidx", Value::Arg(0), vec![i.clone()], p32);
            let v = b.load("v", idx.clone(), i32t);
            b.store(v, idx);
            let next = b.binary("i.next", BinaryOp::Add, i.clone(), Value::ConstInt(1), i32t);
            b.add_incoming(&i, next, latches[d]);
            let inner = headers.get(d + 1).copied().unwrap_or(latches[d]);
            b.br(inner);
        }
        for d in (0..depth).rev() {
            b.switch_to(latches[d]);
            let after = if d == 0 { exit } else { latches[d - 1] };
            b.cond_br(Value::Arg(0), headers[d], after);
        }
        b.switch_to(exit);
        b.ret(None);
        module.define_function(f, b.finish()).unwrap();
    }
    module
}

fn bench_loop_nests(c: &mut Criterion) {
    let mut group = c.benchmark_group("loop_nest_depth");
    for depth in [1, 4, 16].iter() {
        let module = nest_module(1, *depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &module, |b, module| {
            b.iter(|| {
                Analyzer::default()
                    .analyze_module(black_box(module), &NoTripInfo)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_sequential_vs_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_vs_parallel");
    for functions in [8, 64].iter() {
        let module = nest_module(*functions, 3);
        group.bench_with_input(
            BenchmarkId::new("sequential", functions),
            &module,
            |b, module| {
                b.iter(|| {
                    Analyzer::default()
                        .analyze_module(black_box(module), &NoTripInfo)
                        .unwrap()
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("parallel", functions),
            &module,
            |b, module| {
                b.iter(|| {
                    Analyzer::default()
                        .analyze_module_parallel(black_box(module), &NoTripInfo)
                        .unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_type_resolution(c: &mut Criterion) {
    let mut module = Module::new("types");
    let mut ty = module.types.scalar(32);
    for n in 0..32 {
        let arr = module.types.array(ty, 4);
        ty = module
            .types
            .structure(Some(&format!("struct.s{}", n)), vec![ty, arr]);
    }
    let options = AnalysisOptions::default();

    c.bench_function("resolve nested structs", |b| {
        let resolver = TypeSizeResolver::new(&module.types, &options);
        b.iter(|| resolver.resolve(black_box(ty)))
    });
}

criterion_group!(
    benches,
    bench_loop_nests,
    bench_sequential_vs_parallel,
    bench_type_resolution
);
criterion_main!(benches);
