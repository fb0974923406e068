use chrono::{Duration, Utc};
use common::{MenuItemId, PromoCodeId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Discount, Money, OrderItem, PromoCode, quote};

fn make_items(n: usize) -> Vec<OrderItem> {
    (0..n)
        .map(|i| {
            OrderItem::new(
                MenuItemId::new(),
                format!("Item {i}"),
                Money::from_cents(500 + i as i64 * 25),
                (i % 3 + 1) as u32,
            )
            .with_customization("Extra", Money::from_cents(50))
        })
        .collect()
}

fn make_promo() -> PromoCode {
    let now = Utc::now();
    PromoCode {
        id: PromoCodeId::new(),
        code: "BENCH".to_string(),
        discount: Discount::Percentage {
            percent: 15,
            max_discount: Some(Money::from_cents(1500)),
        },
        min_order_value: Money::from_cents(1000),
        valid_from: now - Duration::days(1),
        valid_until: now + Duration::days(1),
        usage_limit: Some(10_000),
        usage_count: 12,
    }
}

fn bench_quote_small_order(c: &mut Criterion) {
    let items = make_items(3);
    let now = Utc::now();

    c.bench_function("pricing/quote_3_items", |b| {
        b.iter(|| {
            quote(
                &items,
                0.0825,
                Money::from_cents(199),
                Money::zero(),
                Money::from_cents(300),
                None,
                now,
            )
        });
    });
}

fn bench_quote_with_promo(c: &mut Criterion) {
    let items = make_items(10);
    let promo = make_promo();
    let now = Utc::now();

    c.bench_function("pricing/quote_10_items_with_promo", |b| {
        b.iter(|| {
            quote(
                &items,
                0.0825,
                Money::from_cents(199),
                Money::from_cents(499),
                Money::from_cents(500),
                Some(&promo),
                now,
            )
        });
    });
}

criterion_group!(benches, bench_quote_small_order, bench_quote_with_promo);
criterion_main!(benches);
