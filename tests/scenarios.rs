use indoc::indoc;
use pantry_reconcile::{
    convert::UnitTag, prepare::RejectionReason, Inventory, MaxServings, MissingReason,
    PreparationState, Recipe, RecipeSelection, Reconciler,
};
use test_case::test_case;

fn recipe(json: &str) -> Recipe {
    serde_json::from_str(json).unwrap()
}

fn inventory(json: &str) -> Inventory {
    serde_json::from_str(json).unwrap()
}

fn pancakes() -> Recipe {
    recipe(indoc! {r#"
        {
            "name": "pancakes",
            "defaultServings": 4,
            "ingredients": [
                { "name": "flour", "quantity": 2, "unit": "cup" },
                { "name": "Maple syrup", "quantity": 1, "unit": "bottle", "isOptional": true }
            ]
        }
    "#})
}

fn one_cup_of_flour() -> Inventory {
    inventory(indoc! {r#"
        [
            { "id": "flour-1", "name": "Flour", "quantity": 1, "unit": "cups", "storeId": "mill" }
        ]
    "#})
}

#[test]
fn readiness_with_half_the_flour() {
    let result = pantry_reconcile::analyze(&pancakes(), 4.0, &one_cup_of_flour()).unwrap();
    assert_eq!(result.max_possible_servings, MaxServings::Finite(2));
    assert_eq!(result.total_ingredients, 1);
    assert_eq!(result.available_ingredients, 0);
    assert_eq!(result.completion_percentage, 0);
    assert_eq!(result.missing_ingredients.len(), 1);

    let flour = &result.missing_ingredients[0];
    assert_eq!(flour.name, "flour");
    assert_eq!(flour.needed_quantity, 2.0);
    assert_eq!(flour.available_quantity, Some(1.0));
    assert_eq!(flour.reason, MissingReason::Insufficient);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["maxPossibleServings"], serde_json::json!(2));
    assert_eq!(json["missingIngredients"][0]["neededQuantity"], 2.0);
}

#[test_case(1.0 => MaxServings::Finite(2) ; "one serving")]
#[test_case(2.0 => MaxServings::Finite(2) ; "two servings")]
#[test_case(8.0 => MaxServings::Finite(2) ; "more than possible")]
fn max_servings_does_not_depend_on_request(servings: f64) -> MaxServings {
    pantry_reconcile::analyze(&pancakes(), servings, &one_cup_of_flour())
        .unwrap()
        .max_possible_servings
}

#[test]
fn prepare_what_is_possible() {
    let before = one_cup_of_flour();
    let prep = pantry_reconcile::prepare(&pancakes(), 2.0, &before).unwrap();
    assert!(prep.success);
    assert_eq!(prep.state, PreparationState::Committed);

    let flour = prep.updated_inventory.get("flour-1").unwrap();
    assert_eq!(flour.quantity, 0.0);
    assert!(flour.is_archived);
    assert_eq!(flour.original_quantity, Some(1.0));
    assert_eq!(flour.store_id.as_deref(), Some("mill"));

    let record = &prep.record;
    assert!(record.success);
    assert_eq!(record.entries.len(), 1);
    assert_eq!(record.entries[0].ingredient_name, "flour");
    assert_eq!(record.entries[0].amount_deducted, 1.0);
    assert!(record.entries[0].archived);

    // the caller snapshot is untouched
    assert_eq!(before, one_cup_of_flour());
}

#[test]
fn prepare_more_than_possible() {
    let before = one_cup_of_flour();
    let prep = pantry_reconcile::prepare(&pancakes(), 4.0, &before).unwrap();
    assert!(!prep.success);
    assert_eq!(
        prep.state,
        PreparationState::Rejected(RejectionReason::MissingIngredients)
    );
    assert_eq!(prep.errors.len(), 1);
    let message = prep.errors[0].to_string();
    assert!(message.contains("flour"), "{message}");
    assert_eq!(prep.updated_inventory, before);
    assert!(prep.record.entries.is_empty());
}

#[test]
fn archived_item_comes_back_with_restock() {
    let reconciler = Reconciler::default();
    let prep = reconciler.prepare(&pancakes(), 2.0, &one_cup_of_flour()).unwrap();
    let (restocked, id) = reconciler
        .restock(
            &prep.updated_inventory,
            "flour",
            "3%cup".parse().unwrap(),
        )
        .unwrap();
    assert_eq!(id, "flour-1");
    let flour = restocked.get("flour-1").unwrap();
    assert!(!flour.is_archived);
    assert_eq!(flour.quantity, 3.0);
    assert_eq!(flour.original_quantity, None);

    let result = reconciler.analyze(&pancakes(), 4.0, &restocked).unwrap();
    assert!(result.is_ready());
    assert_eq!(result.max_possible_servings, MaxServings::Finite(6));
}

#[test]
fn tomatoes_in_grams_and_pounds() {
    let sauce = recipe(indoc! {r#"
        {
            "name": "sauce",
            "defaultServings": 2,
            "ingredients": [{ "name": "tomato", "quantity": 500, "unit": "g" }]
        }
    "#});
    let salad = recipe(indoc! {r#"
        {
            "name": "salad",
            "defaultServings": 1,
            "ingredients": [{ "name": "Chopped Tomato", "quantity": 1, "unit": "lb" }]
        }
    "#});
    let stock = inventory(indoc! {r#"
        [{ "id": "t", "name": "tomato", "quantity": 200, "unit": "g", "storeId": "greengrocer" }]
    "#});

    let list = pantry_reconcile::aggregate(
        &[
            RecipeSelection::new(sauce, 2.0),
            RecipeSelection::new(salad, 1.0),
        ],
        &stock,
    )
    .unwrap();

    assert_eq!(list.len(), 1);
    let tomato = &list.items()[0];
    assert_eq!(tomato.name, "tomato");
    assert_eq!(tomato.unit, UnitTag::Gram);
    let expected = 500.0 + 453.59237 - 200.0;
    assert!((tomato.needed_quantity - expected).abs() < 1e-9);
    assert_eq!(tomato.store_id.as_deref(), Some("greengrocer"));

    let sources: Vec<_> = tomato
        .recipe_sources
        .iter()
        .map(|s| (s.recipe_name.as_str(), s.quantity, s.unit))
        .collect();
    assert_eq!(
        sources,
        [("sauce", 500.0, UnitTag::Gram), ("salad", 1.0, UnitTag::Pound)]
    );
}

#[test]
fn same_name_in_mass_and_volume() {
    let cake = recipe(indoc! {r#"
        {
            "name": "cake",
            "defaultServings": 8,
            "ingredients": [{ "name": "sugar", "quantity": 200, "unit": "grams" }]
        }
    "#});
    let lemonade = recipe(indoc! {r#"
        {
            "name": "lemonade",
            "defaultServings": 4,
            "ingredients": [{ "name": "sugar", "quantity": 0.5, "unit": "cup" }]
        }
    "#});
    let list = pantry_reconcile::aggregate(
        &[
            RecipeSelection::new(cake, 8.0),
            RecipeSelection::new(lemonade, 4.0),
        ],
        &Inventory::new(),
    )
    .unwrap();

    let sugar: Vec<_> = list.get("sugar").collect();
    assert_eq!(sugar.len(), 2);
    assert_eq!(sugar[0].unit, UnitTag::Gram);
    assert_eq!(sugar[0].needed_quantity, 200.0);
    assert_eq!(sugar[1].unit, UnitTag::Cup);
    assert_eq!(sugar[1].needed_quantity, 0.5);
}

#[test]
fn tiny_shortfall_is_not_listed() {
    let bread = recipe(indoc! {r#"
        {
            "name": "bread",
            "defaultServings": 1,
            "ingredients": [
                { "name": "salt", "quantity": 10, "unit": "g" },
                { "name": "flour", "quantity": 500, "unit": "g" }
            ]
        }
    "#});
    let stock = inventory(indoc! {r#"
        [
            { "id": "s", "name": "salt", "quantity": 9.995, "unit": "g" },
            { "id": "f", "name": "flour", "quantity": 400, "unit": "g" }
        ]
    "#});
    let list = pantry_reconcile::aggregate(&[RecipeSelection::new(bread, 1.0)], &stock).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.items()[0].name, "flour");
    assert_eq!(list.items()[0].needed_quantity, 100.0);
}

#[test]
fn invariant_violations_are_errors() {
    let bad = recipe(indoc! {r#"
        { "name": "bad", "defaultServings": 0, "ingredients": [] }
    "#});
    assert!(pantry_reconcile::analyze(&bad, 1.0, &Inventory::new()).is_err());
    assert!(pantry_reconcile::prepare(&pancakes(), f64::NAN, &Inventory::new()).is_err());

    let dup = inventory(indoc! {r#"
        [
            { "id": "x", "name": "salt", "quantity": 1, "unit": "g" },
            { "id": "x", "name": "pepper", "quantity": 1, "unit": "g" }
        ]
    "#});
    assert!(pantry_reconcile::analyze(&pancakes(), 1.0, &dup).is_err());
}
