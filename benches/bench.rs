use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use balanced_bst::{AvlTree, BalancedTree, BuRbTree, HyRbTree, LlRbTree, TdRbTree};

#[derive(Clone)]
enum TreeEnum<K> {
    Avl(AvlTree<K>),
    BottomUp(BuRbTree<K>),
    TopDown(TdRbTree<K>),
    Hybrid(HyRbTree<K>),
    LeftLeaning(LlRbTree<K>),
}

impl<K: Ord> TreeEnum<K> {
    fn as_tree(&mut self) -> &mut dyn BalancedTree<K> {
        match self {
            Self::Avl(t) => t,
            Self::BottomUp(t) => t,
            Self::TopDown(t) => t,
            Self::Hybrid(t) => t,
            Self::LeftLeaning(t) => t,
        }
    }
}

/// Every engine holding the keys `0..num_nodes`.
fn trees(num_nodes: usize) -> [(&'static str, TreeEnum<i32>); 5] {
    fn filled<T: BalancedTree<i32> + Default>(num_nodes: usize) -> T {
        let mut tree = T::default();
        for x in 0..num_nodes {
            tree.insert(x as i32);
        }
        tree
    }

    [
        ("avl", TreeEnum::Avl(filled(num_nodes))),
        ("bottom-up", TreeEnum::BottomUp(filled(num_nodes))),
        ("top-down", TreeEnum::TopDown(filled(num_nodes))),
        ("hybrid", TreeEnum::Hybrid(filled(num_nodes))),
        ("left-leaning", TreeEnum::LeftLeaning(filled(num_nodes))),
    ]
}

/// Helper to bench a function on a tree.
/// It creates a group for the given name and closure and runs it for various sizes and
/// engines before finishing the group.
fn bench_helper(c: &mut Criterion, name: &str, f: impl Fn(&mut dyn BalancedTree<i32>, i32)) {
    let mut group = c.benchmark_group(name);

    for num_levels in [3, 7, 11, 15] {
        let num_nodes = 2usize.pow(num_levels as u32) - 1;
        let largest_element_in_tree = num_nodes - 1;

        for (name, tree) in trees(num_nodes) {
            let id = BenchmarkId::new(name, largest_element_in_tree);

            group.bench_function(id, |b| {
                b.iter_custom(|iters| {
                    let mut time = std::time::Duration::ZERO;
                    for _ in 0..iters {
                        let mut tree = black_box(tree.clone());
                        let instant = std::time::Instant::now();
                        f(tree.as_tree(), black_box(largest_element_in_tree as i32));
                        let elapsed = instant.elapsed();
                        time += elapsed;
                    }
                    time
                })
            });
        }
    }

    group.finish();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    bench_helper(c, "contains", |tree, i| {
        let _found = black_box(tree.contains(&i));
    });
    bench_helper(c, "erase", |tree, i| {
        tree.erase(&i);
    });

    bench_helper(c, "insert", |tree, i| {
        tree.insert(i + 1);
    });

    bench_helper(c, "contains-miss", |tree, i| {
        let _found = black_box(tree.contains(&(i + 1)));
    });
    bench_helper(c, "erase-miss", |tree, i| {
        tree.erase(&(i + 1));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
