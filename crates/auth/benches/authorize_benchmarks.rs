use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use concours_auth::{authorize, effective_permissions, PermissionName, Principal, RoleGrant, RoleName};
use concours_core::{AccountType, UserId};

fn principal_with(roles: usize, perms_per_role: usize) -> Principal {
    let grants = (0..roles)
        .map(|r| {
            let permissions = (0..perms_per_role)
                .map(|p| PermissionName::new(format!("perm_{r}_{p}")))
                .collect();
            RoleGrant::new(RoleName::new(format!("ROLE_{r}")), permissions)
        })
        .collect();

    Principal {
        user_id: UserId::new(),
        account_type: AccountType::Admin,
        verified: true,
        grants,
    }
}

fn bench_effective_permissions(c: &mut Criterion) {
    let mut group = c.benchmark_group("effective_permissions");

    for (roles, perms) in [(1usize, 4usize), (5, 10), (20, 25)] {
        let principal = principal_with(roles, perms);
        group.throughput(Throughput::Elements((roles * perms) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{roles}x{perms}")),
            &principal,
            |b, principal| b.iter(|| effective_permissions(black_box(principal))),
        );
    }

    group.finish();
}

fn bench_authorize(c: &mut Criterion) {
    let principal = principal_with(5, 10);
    let granted = effective_permissions(&principal);
    let held = vec![PermissionName::new("perm_3_7")];
    let missing = vec![PermissionName::new("perm_absent")];

    c.bench_function("authorize_allow", |b| {
        b.iter(|| {
            authorize(
                black_box(AccountType::Admin),
                black_box(&held),
                black_box(&granted),
            )
        })
    });

    c.bench_function("authorize_deny", |b| {
        b.iter(|| {
            authorize(
                black_box(AccountType::Admin),
                black_box(&missing),
                black_box(&granted),
            )
        })
    });

    c.bench_function("authorize_superadmin_bypass", |b| {
        b.iter(|| {
            authorize(
                black_box(AccountType::Superadmin),
                black_box(&missing),
                black_box(&granted),
            )
        })
    });
}

criterion_group!(benches, bench_effective_permissions, bench_authorize);
criterion_main!(benches);
