use ethers::types::U256;
use pulse_dash::format::{
    calculate_supply_owned, format_holder_balance, format_percentage_change, format_price,
    format_units,
};
use pulse_dash::price::calculate_percentage_change;

#[test]
fn test_supply_formatting() {
    assert_eq!(format_units(U256::exp10(21), 18), "1000.0");
    assert_eq!(format_units(U256::zero(), 18), "0.0");
    assert_eq!(format_units(U256::from(1), 18), "0.000000000000000001");
}

#[test]
fn test_price_formatting() {
    assert_eq!(format_price(0.0), "0.00000000");
    assert_eq!(format_price(0.5), "0.50000000");

    let tiny = format_price(0.000000001234);
    assert!(tiny.contains('e'));
    assert_eq!(tiny, "1.2e-9");
}

#[test]
fn test_percentage_formatting() {
    assert_eq!(format_percentage_change(calculate_percentage_change(110.0, 100.0)), "+10.00%");
    assert_eq!(format_percentage_change(calculate_percentage_change(90.0, 100.0)), "-10.00%");
    assert_eq!(format_percentage_change(calculate_percentage_change(1.0, 0.0)), "+0.00%");
    assert_eq!(format_percentage_change(-0.0), "+0.00%");
}

#[test]
fn test_holder_columns() {
    assert_eq!(format_holder_balance("1234567890000000000000000", 18), "1,234,567.89");
    assert_eq!(format_holder_balance("garbage", 18), "0");
    assert_eq!(calculate_supply_owned("5000000000000000000", "1000.0", 18), "0.5000");
    assert_eq!(calculate_supply_owned("1", "0.0", 18), "0");
}
