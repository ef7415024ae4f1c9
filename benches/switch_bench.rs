use cookieprofiles::cookies::definition::CookieDefinition;
use cookieprofiles::cookies::jar::CookieJar;
use cookieprofiles::domain::Domain;
use cookieprofiles::manager::ProfileManager;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn profile(prefix: &str, count: usize) -> Vec<CookieDefinition> {
    (0..count)
        .map(|i| CookieDefinition::new(format!("{}{}", prefix, i), "value", ".example.com"))
        .collect()
}

fn bench_switch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let domain = Domain::from("example.com");
    let manager = ProfileManager::builder()
        .sink(Arc::new(CookieJar::new()))
        .build();

    rt.block_on(async {
        manager
            .set_profile_cookies(&domain, "A", profile("a", 20))
            .await
            .unwrap();
        manager
            .set_profile_cookies(&domain, "B", profile("b", 20))
            .await
            .unwrap();
    });

    let mut group = c.benchmark_group("profile_switch");

    // 40 managed names x 4 removal urls, 20 installs, one persist per switch
    group.bench_function("switch_a_b_40_managed", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(manager.switch_to(&domain, "A").await.unwrap());
            black_box(manager.switch_to(&domain, "B").await.unwrap());
        });
    });

    group.bench_function("managed_names_40", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(manager.get_managed_names(&domain).await.unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_switch);
criterion_main!(benches);
