use common::{ItemId, Money};
use criterion::{Criterion, criterion_group, criterion_main};
use fulfillment::{FulfillmentCoordinator, OrderLineRequest, OrderRequest, price, validate};
use order_store::InMemoryStore;

fn wide_request(lines: i64) -> OrderRequest {
    OrderRequest::new(
        1,
        (1..=lines)
            .map(|item| OrderLineRequest::new(item, 1, Money::from_parts(1999, 2)))
            .collect(),
    )
}

fn bench_validate_and_price(c: &mut Criterion) {
    let request = wide_request(50);

    c.bench_function("fulfillment/validate_and_price_50_lines", |b| {
        b.iter(|| {
            let validated = validate(&request).unwrap();
            price(validated.lines()).unwrap()
        });
    });
}

fn bench_fulfill_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    rt.block_on(store.put_item(ItemId::new(1), i32::MAX, 0));
    let coordinator = FulfillmentCoordinator::new(store);
    let request = wide_request(1);

    c.bench_function("fulfillment/fulfill_single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                coordinator.fulfill_order(&request).await.unwrap();
            });
        });
    });
}

fn bench_fulfill_ten_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("fulfillment/fulfill_ten_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                for item in 1..=10 {
                    store.put_item(ItemId::new(item), 100, 0).await;
                }
                let coordinator = FulfillmentCoordinator::new(store);
                coordinator.fulfill_order(&wide_request(10)).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_validate_and_price,
    bench_fulfill_single_line,
    bench_fulfill_ten_lines,
);
criterion_main!(benches);
