use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};

use dealflow_commission::{compute_commission, CommissionInputs};
use dealflow_core::{ClientId, ConsultantId, OfferId, OpportunityId};
use dealflow_deals::{rank_offers, BuyerQuality, FinancingStatus, Offer, OfferTerms};
use dealflow_events::{EventEnvelope, InMemoryEventBus};
use dealflow_infra::document_store::deep_merge;
use dealflow_infra::{DealContext, DealService, DealSettings, InMemoryDocumentStore};

type Service = DealService<InMemoryDocumentStore, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

fn service() -> Service {
    DealService::new(
        InMemoryDocumentStore::new(),
        Arc::new(InMemoryEventBus::new()),
        DealSettings::default(),
    )
}

fn ctx() -> DealContext {
    DealContext::new(ConsultantId::new(), ClientId::new(), OpportunityId::new())
}

fn terms(amount: i64, quality: BuyerQuality) -> OfferTerms {
    OfferTerms {
        buyer_name: "Buyer".to_string(),
        amount: Decimal::from(amount),
        down_payment: None,
        financing_status: FinancingStatus::Pending,
        conditions: BTreeSet::new(),
        buyer_quality_score: quality,
        valid_until: None,
        notes: None,
    }
}

fn bench_operation_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("operation_latency");
    group.sample_size(500);

    group.bench_function("open_opportunity_fresh", |b| {
        let service = service();
        b.iter(|| {
            service
                .open_opportunity(&ctx(), black_box(Decimal::from(250_000)), None)
                .unwrap();
        });
    });

    group.bench_function("submit_offer_growing_document", |b| {
        let service = service();
        let ctx = ctx();
        service.open_opportunity(&ctx, Decimal::from(250_000), None).unwrap();
        b.iter(|| {
            service
                .submit_offer(&ctx, OfferId::new(), terms(black_box(240_000), BuyerQuality::Medium))
                .unwrap();
        });
    });

    group.bench_function("accept_offer_with_commission", |b| {
        let service = service();
        b.iter(|| {
            let ctx = ctx();
            let offer_id = OfferId::new();
            service.open_opportunity(&ctx, Decimal::from(250_000), None).unwrap();
            service
                .submit_offer(&ctx, offer_id, terms(240_000, BuyerQuality::High))
                .unwrap();
            black_box(service.accept_offer(&ctx, offer_id, None).unwrap());
        });
    });

    group.finish();
}

fn bench_commission(c: &mut Criterion) {
    let inputs = CommissionInputs::full(Decimal::from(200_000), Decimal::from(5), Decimal::from(55));
    c.bench_function("compute_commission", |b| {
        b.iter(|| black_box(compute_commission(black_box(&inputs)).unwrap()));
    });
}

fn bench_rank_offers(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_offers");

    for count in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("open_offers", count), count, |b, &count| {
            let now = Utc::now();
            let qualities = [BuyerQuality::Low, BuyerQuality::Medium, BuyerQuality::High];
            let offers: Vec<Offer> = (0..count)
                .map(|i| {
                    Offer::submitted(
                        OfferId::new(),
                        terms(200_000 + (i % 37) as i64 * 1_000, qualities[i % 3]),
                        now,
                    )
                })
                .collect();
            b.iter(|| black_box(rank_offers(black_box(&offers))));
        });
    }

    group.finish();
}

fn bench_deep_merge(c: &mut Criterion) {
    let base = json!({
        "id": "opp",
        "offers": (0..50).map(|i| json!({"id": i, "amount": "1000"})).collect::<Vec<_>>(),
        "marketing": {"viewings": 3, "inquiries": 1, "days_on_market": 10},
    });
    let patch = json!({"marketing": {"inquiries": 7}});

    c.bench_function("deep_merge_marketing_patch", |b| {
        b.iter(|| {
            let mut target = base.clone();
            deep_merge(&mut target, black_box(patch.clone()));
            black_box(target);
        });
    });
}

criterion_group!(
    benches,
    bench_operation_latency,
    bench_commission,
    bench_rank_offers,
    bench_deep_merge
);
criterion_main!(benches);
