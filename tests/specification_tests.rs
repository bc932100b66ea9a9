// Copyright 2025 Cowboy AI, LLC.

//! Customer rules combined through the public API

mod common;

use common::{
    customer, years_ago, AdultCustomer, Customer, NoExpressionTree, PremiumCustomer,
    ValidCustomerName, ADULT_AGE, MINOR_AGE,
};
use cim_specification::{not, spec, Lambda, Specification, SpecificationError};
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test_case("", false ; "empty name")]
#[test_case("test1234567", false ; "name too long")]
#[test_case("test", true ; "valid name")]
fn is_satisfied_checks_name(name: &str, expected: bool) {
    let valid = spec::<ValidCustomerName>().unwrap();
    assert_eq!(valid.is_satisfied(&customer(name, ADULT_AGE)), Ok(expected));
}

#[test_case("", ADULT_AGE, false ; "adult without name")]
#[test_case("test", MINOR_AGE, false ; "named minor")]
#[test_case("", MINOR_AGE, false ; "minor without name")]
#[test_case("test", ADULT_AGE, true ; "named adult")]
fn and_requires_both(name: &str, age: i32, expected: bool) {
    let adult = spec::<AdultCustomer>().unwrap();
    let valid = spec::<ValidCustomerName>().unwrap();
    let candidate = customer(name, age);

    assert_eq!(adult.and(&valid).unwrap().is_satisfied(&candidate), Ok(expected));
    assert_eq!(adult.and_also(&valid).unwrap().is_satisfied(&candidate), Ok(expected));
}

#[test_case("", ADULT_AGE, true ; "adult without name")]
#[test_case("test", MINOR_AGE, true ; "named minor")]
#[test_case("", MINOR_AGE, false ; "minor without name")]
#[test_case("test", ADULT_AGE, true ; "named adult")]
fn or_requires_either(name: &str, age: i32, expected: bool) {
    let adult = spec::<AdultCustomer>().unwrap();
    let valid = spec::<ValidCustomerName>().unwrap();
    let candidate = customer(name, age);

    assert_eq!(adult.or(&valid).unwrap().is_satisfied(&candidate), Ok(expected));
    assert_eq!(adult.or_else(&valid).unwrap().is_satisfied(&candidate), Ok(expected));
}

#[test_case("", MINOR_AGE, false ; "neither")]
#[test_case("", ADULT_AGE, true ; "adult only")]
#[test_case("test", MINOR_AGE, true ; "name only")]
#[test_case("test", ADULT_AGE, false ; "both")]
fn xor_requires_exactly_one(name: &str, age: i32, expected: bool) {
    let adult = spec::<AdultCustomer>().unwrap();
    let valid = spec::<ValidCustomerName>().unwrap();

    let either = adult.xor(&valid).unwrap();
    assert_eq!(either.is_satisfied(&customer(name, age)), Ok(expected));
}

#[test_case(ADULT_AGE, false ; "adult")]
#[test_case(MINOR_AGE, true ; "minor")]
fn not_inverts(age: i32, expected: bool) {
    let minor = not(&spec::<AdultCustomer>().unwrap()).unwrap();
    assert_eq!(minor.is_satisfied(&customer("test", age)), Ok(expected));
}

#[test_case("test1234567", ADULT_AGE, 1, true ; "invalid name new member")]
#[test_case("test", ADULT_AGE, 1, true ; "valid adult new member")]
#[test_case("test", ADULT_AGE, 20, true ; "valid adult premium")]
#[test_case("test", MINOR_AGE, 20, false ; "minor premium")]
fn chained_combinators(name: &str, age: i32, member_years: i32, expected: bool) {
    let adult = spec::<AdultCustomer>().unwrap();
    let valid = spec::<ValidCustomerName>().unwrap();
    let premium = spec::<PremiumCustomer>().unwrap();

    let rule = adult
        .and(&valid)
        .unwrap()
        .or(&not(&premium).unwrap())
        .unwrap();
    let candidate = customer(name, age).with_member_since(years_ago(member_years));

    assert_eq!(rule.is_satisfied(&candidate), Ok(expected));
}

#[test]
fn combined_rule_renders_single_placeholder() {
    let adult = spec::<AdultCustomer>().unwrap();
    let premium = spec::<PremiumCustomer>().unwrap();

    let rule = adult.and_also(&not(&premium).unwrap()).unwrap();
    let lambda = rule.expression().unwrap();

    assert_eq!(lambda.body().parameters().len(), 1);
    assert_eq!(
        rule.to_string(),
        "|x| (((today().year() - x.date_of_birth.year()) >= 21) && \
         !((today().year() - x.member_since.year()) > 10))"
    );
}

#[test]
fn combining_leaves_operands_unchanged() {
    let adult = spec::<AdultCustomer>().unwrap();
    let valid = spec::<ValidCustomerName>().unwrap();
    let before = (adult.to_string(), valid.to_string());

    let _ = adult.xor(&valid).unwrap();
    let _ = not(&valid).unwrap();

    assert_eq!((adult.to_string(), valid.to_string()), before);
}

#[test]
fn absent_operands_are_invalid_arguments() {
    let adult = spec::<AdultCustomer>().unwrap();
    let absent = None::<&Specification<Customer>>;
    let expected = SpecificationError::InvalidArgument { argument: "target" };

    assert_eq!(adult.and(absent).unwrap_err(), expected);
    assert_eq!(adult.and_also(absent).unwrap_err(), expected);
    assert_eq!(adult.or(absent).unwrap_err(), expected);
    assert_eq!(adult.or_else(absent).unwrap_err(), expected);
    assert_eq!(adult.xor(absent).unwrap_err(), expected);
    assert_eq!(not(absent).unwrap_err(), expected);
    assert_eq!(
        adult.or(None::<Lambda<Customer>>).unwrap_err(),
        SpecificationError::InvalidArgument { argument: "expression" }
    );
}

#[test]
fn operand_without_tree_is_invalid_argument() {
    let adult = spec::<AdultCustomer>().unwrap();
    let missing = spec::<NoExpressionTree>().unwrap();

    assert!(adult.and(&missing).unwrap_err().is_invalid_argument());
    assert!(adult.or_else(&missing).unwrap_err().is_invalid_argument());
}

#[test]
fn receiver_without_tree_is_missing_expression() {
    let adult = spec::<AdultCustomer>().unwrap();
    let missing = spec::<NoExpressionTree>().unwrap();

    assert_eq!(missing.and(&adult).unwrap_err(), SpecificationError::MissingExpression);
    assert_eq!(missing.xor(&adult).unwrap_err(), SpecificationError::MissingExpression);
    assert_eq!(not(&missing).unwrap_err(), SpecificationError::MissingExpression);
    assert_eq!(
        missing.is_satisfied(&customer("test", ADULT_AGE)),
        Err(SpecificationError::MissingExpression)
    );
}

#[test]
fn raw_lambda_combines_with_named_rule() {
    let adult = spec::<AdultCustomer>().unwrap();
    let named_test = Lambda::from_fn("c", |c| c.member(common::name()).equal("test"));

    let rule = adult.and_also(named_test).unwrap();

    assert_eq!(rule.is_satisfied(&customer("test", ADULT_AGE)), Ok(true));
    assert_eq!(rule.is_satisfied(&customer("other", ADULT_AGE)), Ok(false));
}
