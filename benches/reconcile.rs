use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pantry_reconcile::{
    convert::UnitTag, Inventory, InventoryItem, Recipe, RecipeIngredient, RecipeSelection,
    Reconciler,
};

const UNITS: &[UnitTag] = &[
    UnitTag::Gram,
    UnitTag::Kilogram,
    UnitTag::Ounce,
    UnitTag::Millilitre,
    UnitTag::Cup,
    UnitTag::Tablespoon,
    UnitTag::Piece,
];

fn recipes(n: usize, ingredients: usize) -> Vec<Recipe> {
    (0..n)
        .map(|r| {
            let ingredients = (0..ingredients)
                .map(|i| {
                    let unit = UNITS[(r + i) % UNITS.len()];
                    RecipeIngredient::new(format!("Fresh ingredient {}", (r * 7 + i) % 40), 2.5, unit)
                })
                .collect();
            Recipe::new(format!("recipe {r}"), 4.0, ingredients)
        })
        .collect()
}

fn inventory(n: usize) -> Inventory {
    (0..n)
        .map(|i| {
            InventoryItem::new(
                i.to_string(),
                format!("ingredient {i}"),
                100.0,
                UNITS[i % UNITS.len()],
            )
        })
        .collect()
}

fn engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    let reconciler = Reconciler::default();
    let recipes = black_box(recipes(20, 12));
    let inventory = black_box(inventory(40));

    group.bench_function("analyze", |b| {
        b.iter(|| {
            for recipe in &recipes {
                let _ = reconciler.analyze(recipe, 6.0, &inventory);
            }
        })
    });

    group.bench_function("prepare", |b| {
        b.iter(|| {
            for recipe in &recipes {
                let _ = reconciler.prepare(recipe, 0.5, &inventory);
            }
        })
    });

    let selections: Vec<_> = recipes
        .iter()
        .cloned()
        .map(|r| RecipeSelection::new(r, 8.0))
        .collect();
    group.bench_function("aggregate", |b| {
        b.iter(|| reconciler.aggregate(&selections, &inventory))
    });
}

fn normalize(c: &mut Criterion) {
    let names = black_box([
        "Freshly ground black pepper",
        "2 large eggs, beaten",
        "Extra-virgin olive oil",
        "Chopped fresh basil leaves",
        "salt",
    ]);
    c.bench_function("normalize", |b| {
        b.iter(|| {
            for name in names {
                let _ = pantry_reconcile::normalize(name);
            }
        })
    });
}

criterion_group!(benches, engine, normalize);
criterion_main!(benches);
