use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use taorm::{
    Connection, ConnectionSource, OrmError, OrmResult, Param, Query, Record, Taos, Value,
    format_literal, render_inline,
};

/// Never connects; the benchmarks only render SQL.
struct Offline;

impl ConnectionSource for Offline {
    fn open(&self) -> OrmResult<Box<dyn Connection + '_>> {
        Err(OrmError::Connection("offline".into()))
    }
}

/// A query over `meters` with `n` text conditions and pagination:
/// select * from meters where (col0 = ?) and (col1 = ?) ... limit 20, 10
fn build_query(db: &Taos, n: usize) -> Query {
    let mut q = db.table("meters");
    for i in 0..n {
        q = q.filter(&format!("col{i} = ?"), vec![Value::from(format!("v{i}"))]);
    }
    q.order("ts desc").limit(10).page(3)
}

fn bench_to_select_sql(c: &mut Criterion) {
    let db = Taos::new(Offline);
    let mut group = c.benchmark_group("statement/to_select_sql");

    for n in [1, 5, 10, 50, 100] {
        let q = build_query(&db, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_select_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let db = Taos::new(Offline);
    let mut group = c.benchmark_group("statement/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_query(&db, n).to_select_sql()));
        });
    }

    group.finish();
}

fn bench_list_literal(c: &mut Criterion) {
    let mut group = c.benchmark_group("literal/list");

    for n in [5, 20, 100, 500] {
        let list = Value::List((0..n).map(|i| Value::from(format!("d{i}"))).collect());
        group.bench_with_input(BenchmarkId::from_parameter(n), &list, |b, list| {
            b.iter(|| black_box(format_literal(list)));
        });
    }

    group.finish();
}

fn bench_build_insert(c: &mut Criterion) {
    let db = Taos::new(Offline);
    let stmt = db
        .table("d1001")
        .stable("meters", vec![Value::from("California.SF"), Value::Int(2)])
        .statement()
        .clone();
    let mut group = c.benchmark_group("statement/build_insert");

    for n in [1, 8, 32] {
        let record: Record = (0..n).map(|i| (format!("c{i}"), Value::Float(i as f64))).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &record, |b, record| {
            b.iter(|| black_box(stmt.build_insert(record)));
        });
    }

    group.finish();
}

fn bench_render_inline(c: &mut Criterion) {
    let params: Vec<Param> = (0..20)
        .filter_map(|i| Param::bind(Value::from(format!("location-{i}"))))
        .collect();
    let sql = vec!["location = ?"; params.len()].join(" and ");
    c.bench_function("exec/render_inline_20", |b| {
        b.iter(|| black_box(render_inline(&sql, &params)));
    });
}

criterion_group!(
    benches,
    bench_to_select_sql,
    bench_build_and_render,
    bench_list_literal,
    bench_build_insert,
    bench_render_inline
);
criterion_main!(benches);
