//! 编解码基准测试
//!
//! 测试三种格式的编码、解码以及配置类实例重建的性能

use confkeeper::codec::{self, Format};
use confkeeper::{ClassBuilder, ClassRegistry, FieldKind, FieldSpec, Snapshot, Value};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn build_registry() -> ClassRegistry {
    let registry = ClassRegistry::new();
    ClassBuilder::new("bench", "Endpoint")
        .field(FieldSpec::new("url", FieldKind::String).default("http://localhost"))
        .field(
            FieldSpec::new("timeout", FieldKind::Integer)
                .default(30)
                .gt(0)
                .lt(3600),
        )
        .field(
            FieldSpec::new("method", FieldKind::String)
                .default("GET")
                .one_of(["GET", "POST", "HEAD"]),
        )
        .register(&registry)
        .expect("注册基准配置类失败");
    registry
}

fn build_snapshot(registry: &ClassRegistry, endpoints: usize) -> Snapshot {
    let class = registry.get("bench.Endpoint").expect("配置类未注册");
    let mut snapshot = Snapshot::new();
    snapshot.insert("name".to_string(), Value::from("bench"));

    for index in 0..endpoints {
        let mut endpoint = class.instantiate().expect("创建实例失败");
        endpoint
            .set("url", format!("https://service-{index}.example.org/health"))
            .expect("设置字段失败");
        snapshot.insert(format!("endpoint_{index}"), Value::from(endpoint));
    }
    snapshot
}

fn encode_benchmark(c: &mut Criterion) {
    let registry = build_registry();
    let snapshot = build_snapshot(&registry, 50);

    let mut group = c.benchmark_group("encode");
    for format in Format::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(format), &format, |b, format| {
            b.iter(|| codec::encode(black_box(&snapshot), *format).expect("编码失败"))
        });
    }
    group.finish();
}

fn decode_benchmark(c: &mut Criterion) {
    let registry = build_registry();
    let snapshot = build_snapshot(&registry, 50);

    let mut group = c.benchmark_group("decode");
    for format in Format::ALL {
        let text = codec::encode(&snapshot, format).expect("编码失败");
        group.bench_with_input(BenchmarkId::from_parameter(format), &text, |b, text| {
            b.iter(|| codec::decode(black_box(text), format, &registry).expect("解码失败"))
        });
    }
    group.finish();
}

fn validation_benchmark(c: &mut Criterion) {
    let registry = build_registry();
    let class = registry.get("bench.Endpoint").expect("配置类未注册");
    let mut endpoint = class.instantiate().expect("创建实例失败");

    c.bench_function("validated_set", |b| {
        b.iter(|| {
            endpoint.set("timeout", black_box(120)).expect("设置字段失败");
            endpoint.set("method", black_box("POST")).expect("设置字段失败");
        })
    });
}

criterion_group!(
    benches,
    encode_benchmark,
    decode_benchmark,
    validation_benchmark
);
criterion_main!(benches);
