use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use exchange_core::{
    protocols, store_messages, BincodeCodec, DataObject, JsonCodec, MemorySession, MessageFlags,
    MessageHeader, Object, PayloadCodec, Resource, ResourceKind, Responder, Role, RolePair,
};
use std::sync::Arc;

fn create_objects(count: usize) -> Vec<DataObject> {
    (0..count)
        .map(|i| {
            let resource = Resource::new(
                format!("eml:///well({i})").as_str(),
                format!("Well {i}"),
                ResourceKind::DataObject,
            );
            DataObject::new(resource, vec![0u8; 256])
        })
        .collect()
}

fn request() -> MessageHeader {
    let mut header = MessageHeader::new_request(
        protocols::STORE,
        store_messages::GET_OBJECT,
        MessageFlags::FINAL_PART,
    );
    header.message_id = 2;
    header
}

fn benchmark_respond(c: &mut Criterion) {
    let mut group = c.benchmark_group("respond");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for count in [1usize, 10, 100] {
        let objects = create_objects(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &objects, |b, objects| {
            b.iter(|| {
                let session = Arc::new(MemorySession::new());
                let responder = Responder::new(
                    session.clone(),
                    BincodeCodec::new(),
                    protocols::STORE,
                    RolePair::playing(Role::Store),
                );
                runtime.block_on(async {
                    black_box(
                        responder
                            .respond(&request(), store_messages::OBJECT, objects.clone(), |data_object| {
                                Object { data_object }
                            })
                            .await
                            .unwrap(),
                    )
                })
            })
        });
    }

    group.finish();
}

fn benchmark_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_object");
    let object = Object {
        data_object: create_objects(1).remove(0),
    };
    let bincode = BincodeCodec::new();
    let json = JsonCodec::new();

    println!("Object sizes:");
    println!("  Bincode: {} bytes", bincode.encode(&object).unwrap().len());
    println!("  JSON:    {} bytes", json.encode(&object).unwrap().len());

    group.bench_function("bincode", |b| {
        b.iter(|| black_box(bincode.encode(black_box(&object)).unwrap()))
    });

    group.bench_function("json", |b| {
        b.iter(|| black_box(json.encode(black_box(&object)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_respond, benchmark_codecs);
criterion_main!(benches);
