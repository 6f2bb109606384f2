//! Integration tests pricing the bundled fixture sets.

use rusty_money::{Money, iso::USD};
use testresult::TestResult;

use checkout::prelude::*;

#[test]
fn default_rules_fixture_matches_built_in_catalog() -> TestResult {
    let fixture = Fixture::new();

    let from_file: Vec<String> = fixture
        .load_rules("default")?
        .active_rules(USD)?
        .iter()
        .map(|rule| rule.name().to_string())
        .collect();

    let built_in: Vec<String> = RuleCatalog::with_defaults()
        .active_rules(USD)?
        .iter()
        .map(|rule| rule.name().to_string())
        .collect();

    assert_eq!(from_file, built_in);

    Ok(())
}

#[test]
fn sample_basket_with_default_rules() -> TestResult {
    let fixture = Fixture::new();

    let basket = fixture.load_basket("sample")?;
    let rules = fixture.load_rules("default")?.active_rules(basket.currency())?;

    let receipt = Engine::with_rules(rules).calculate(&basket)?;

    assert_eq!(receipt.original_subtotal(), Money::from_minor(2596, USD));
    assert_eq!(receipt.total_discount(), Money::from_minor(349, USD));
    assert_eq!(receipt.subtotal(), Money::from_minor(2247, USD));
    assert_eq!(receipt.total(), Money::from_minor(2404, USD));

    let mut out = Vec::new();
    receipt.write_to(&mut out, &basket)?;

    let rendered = String::from_utf8(out)?;

    assert!(rendered.contains("Polar Pop 32oz"), "basket line missing");
    assert!(rendered.contains("BOGO_BEVERAGE"), "winning rule missing");
    assert!(rendered.contains("PERCENT_OFF_5_FOOD"), "winning rule missing");

    Ok(())
}

#[test]
fn energy_basket_skips_inactive_rules() -> TestResult {
    let fixture = Fixture::new();

    let basket = fixture.load_basket("energy")?;
    let catalog = fixture.load_rules("energy")?;

    assert_eq!(catalog.len(), 3);

    let rules = catalog.active_rules(basket.currency())?;

    assert_eq!(rules.len(), 2);

    let receipt = Engine::with_rules(rules).calculate(&basket)?;
    let view = receipt.view();

    assert_eq!(view.total_discount, "4.50");
    assert_eq!(view.subtotal, "6.57");
    assert_eq!(view.tax, "0.46");
    assert_eq!(view.total, "7.03");

    let bundle = view
        .applied_discounts
        .first()
        .ok_or("no applied discounts")?;

    assert_eq!(bundle.rule_name, MixAndMatch::energy_drinks(USD).name());
    assert_eq!(bundle.affected_item_ids, ["4002", "4001"]);

    Ok(())
}
