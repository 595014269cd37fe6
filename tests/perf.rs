#![cfg(feature = "memory-directory")]

use broker_authz::{
    Authorizer, AuthorizerBuilder, Decision, MemoryDirectory, Operation, Principal, ProjectId,
    ProjectName, ProjectRole, ResourceType, SharePermission, UserName,
};
use futures::executor::block_on;
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REPEATS: usize = 5;

fn benchmark_sync<F>(name: &str, iterations: usize, mut op: F)
where
    F: FnMut(),
{
    let mut samples = Vec::with_capacity(REPEATS);

    for _ in 0..REPEATS {
        let start = Instant::now();
        for _ in 0..iterations {
            op();
        }
        samples.push(start.elapsed());
    }

    samples.sort_unstable();
    let median = samples[REPEATS / 2];
    let total_ms = median.as_secs_f64() * 1_000.0;
    let ns_per_op = median.as_secs_f64() * 1_000_000_000.0 / iterations as f64;
    let ops_per_sec = iterations as f64 / median.as_secs_f64();

    println!(
        "{name}: median={total_ms:.3} ms, ns/op={ns_per_op:.1}, ops/s={ops_per_sec:.0} (iters={iterations}, repeats={REPEATS})"
    );
}

fn benchmark_parallel<F>(name: &str, threads: usize, iterations_per_thread: usize, op_factory: F)
where
    F: Fn() -> Box<dyn FnMut() + Send> + Send + Sync + 'static,
{
    let op_factory = Arc::new(op_factory);
    let mut samples = Vec::with_capacity(REPEATS);

    for _ in 0..REPEATS {
        let start = Instant::now();
        let mut joins = Vec::with_capacity(threads);
        for _ in 0..threads {
            let factory = Arc::clone(&op_factory);
            joins.push(std::thread::spawn(move || {
                let mut op = factory();
                for _ in 0..iterations_per_thread {
                    op();
                }
            }));
        }
        for join in joins {
            join.join().expect("thread panicked");
        }
        samples.push(start.elapsed());
    }

    samples.sort_unstable();
    let median = samples[REPEATS / 2];
    let total_ops = threads * iterations_per_thread;
    let total_ms = median.as_secs_f64() * 1_000.0;
    let ns_per_op = median.as_secs_f64() * 1_000_000_000.0 / total_ops as f64;
    let ops_per_sec = total_ops as f64 / median.as_secs_f64();

    println!(
        "{name}: median={total_ms:.3} ms, ns/op={ns_per_op:.1}, ops/s={ops_per_sec:.0} (threads={threads}, total_ops={total_ops}, repeats={REPEATS})"
    );
}

fn setup_authorizer(ttl: Duration) -> Authorizer<MemoryDirectory> {
    let directory = MemoryDirectory::new();
    directory.add_project(ProjectName::try_from("owner").unwrap(), ProjectId::new(1));
    directory.add_project(ProjectName::try_from("guest").unwrap(), ProjectId::new(2));
    directory.add_member(
        ProjectId::new(1),
        UserName::try_from("perf").unwrap(),
        ProjectRole::DataOwner,
    );
    directory.add_member(
        ProjectId::new(2),
        UserName::try_from("perf").unwrap(),
        ProjectRole::DataScientist,
    );
    directory.add_topic("events", ProjectId::new(1));
    directory.share(ProjectId::new(1), ProjectId::new(2), SharePermission::ReadOnly);

    AuthorizerBuilder::new(directory).cache_ttl(ttl).build()
}

fn decide(authorizer: &Authorizer<MemoryDirectory>, principal: &Principal) -> Decision {
    block_on(authorizer.authorize(
        principal,
        Operation::Read,
        ResourceType::Topic,
        "events",
        "127.0.0.1",
    ))
}

#[test]
#[ignore = "manual performance test; run with --ignored --nocapture"]
fn perf_authorize() {
    let iterations = 200_000;

    let same_project = Principal::new("owner__perf");
    let cross_project = Principal::new("guest__perf");

    let authorizer = setup_authorizer(Duration::ZERO);
    benchmark_sync("authorize_same_project_expired_roles", iterations / 4, || {
        black_box(decide(&authorizer, &same_project));
    });

    let authorizer = setup_authorizer(Duration::from_secs(60));
    assert_eq!(decide(&authorizer, &same_project), Decision::Allow);
    assert_eq!(decide(&authorizer, &cross_project), Decision::Allow);
    benchmark_sync("authorize_same_project_hot_cache", iterations, || {
        black_box(decide(&authorizer, &same_project));
    });
    benchmark_sync("authorize_cross_project_hot_cache", iterations, || {
        black_box(decide(&authorizer, &cross_project));
    });

    let threads = std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4);
    let authorizer = Arc::new(authorizer);
    benchmark_parallel(
        "authorize_cross_project_hot_cache_parallel",
        threads,
        50_000,
        move || {
            let authorizer = Arc::clone(&authorizer);
            let principal = cross_project.clone();
            Box::new(move || {
                black_box(decide(&authorizer, &principal));
            })
        },
    );
}
