#![cfg(all(feature = "criterion-bench", feature = "memory-directory"))]

use broker_authz::{
    Authorizer, AuthorizerBuilder, Decision, MemoryDirectory, Operation, Principal, ProjectId,
    ProjectName, ProjectRole, ResourceType, SharePermission, SuperuserRegistry, UserName,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use std::time::Duration;

fn setup_directory(topics: usize) -> MemoryDirectory {
    let directory = MemoryDirectory::new();
    directory.add_project(ProjectName::try_from("owner").unwrap(), ProjectId::new(1));
    directory.add_project(ProjectName::try_from("guest").unwrap(), ProjectId::new(2));
    directory.add_member(
        ProjectId::new(1),
        UserName::try_from("bench").unwrap(),
        ProjectRole::DataOwner,
    );
    directory.add_member(
        ProjectId::new(2),
        UserName::try_from("bench").unwrap(),
        ProjectRole::DataScientist,
    );
    for i in 0..topics {
        directory.add_topic(format!("topic_{i}"), ProjectId::new(1));
    }
    directory.share(ProjectId::new(1), ProjectId::new(2), SharePermission::ReadOnly);
    directory
}

fn decide(
    authorizer: &Authorizer<MemoryDirectory>,
    principal: &Principal,
    resource_type: ResourceType,
    resource: &str,
) -> Decision {
    block_on(authorizer.authorize(
        principal,
        Operation::Read,
        resource_type,
        resource,
        "127.0.0.1",
    ))
}

fn bench_hot_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize_hot_cache");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let authorizer = AuthorizerBuilder::new(setup_directory(1))
        .cache_ttl(Duration::from_secs(60))
        .superusers(SuperuserRegistry::new(["admin"]))
        .build();
    let same_project = Principal::new("owner__bench");
    let cross_project = Principal::new("guest__bench");
    let superuser = Principal::with_alternates("owner__ops", ["admin"]);
    assert_eq!(
        decide(&authorizer, &cross_project, ResourceType::Topic, "topic_0"),
        Decision::Allow
    );

    group.bench_function("same_project", |b| {
        b.iter(|| black_box(decide(&authorizer, &same_project, ResourceType::Topic, "topic_0")));
    });
    group.bench_function("cross_project", |b| {
        b.iter(|| black_box(decide(&authorizer, &cross_project, ResourceType::Topic, "topic_0")));
    });
    group.bench_function("superuser", |b| {
        b.iter(|| black_box(decide(&authorizer, &superuser, ResourceType::Topic, "topic_0")));
    });
    group.bench_function("group", |b| {
        b.iter(|| {
            black_box(decide(
                &authorizer,
                &same_project,
                ResourceType::Group,
                "owner__consumers",
            ))
        });
    });

    group.finish();
}

fn bench_topic_cache_pressure(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize_topic_cache_pressure");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let topics = 1_024;
    let principal = Principal::new("owner__bench");
    let names: Vec<String> = (0..topics).map(|i| format!("topic_{i}")).collect();

    for max_size in [64usize, 256, 1_024] {
        let authorizer = AuthorizerBuilder::new(setup_directory(topics))
            .topic_cache_max_size(max_size)
            .build();
        let id = BenchmarkId::from_parameter(max_size);
        group.bench_with_input(id, &max_size, |b, _| {
            let mut next = 0;
            b.iter(|| {
                let decision = decide(&authorizer, &principal, ResourceType::Topic, &names[next]);
                next = (next + 1) % names.len();
                black_box(decision);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hot_cache, bench_topic_cache_pressure);
criterion_main!(benches);
