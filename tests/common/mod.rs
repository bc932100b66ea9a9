// Copyright 2025 Cowboy AI, LLC.

//! Customer fixtures shared by the integration tests
#![allow(dead_code)]

use chrono::{Datelike, Local, NaiveDate};
use cim_specification::{named_specification, Expr, Member, Specification};

#[derive(Debug, Clone)]
pub struct Customer {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub member_since: NaiveDate,
}

impl Customer {
    /// A customer who joined today
    pub fn new(name: &str, date_of_birth: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            date_of_birth,
            member_since: today(),
        }
    }

    pub fn with_member_since(mut self, member_since: NaiveDate) -> Self {
        self.member_since = member_since;
        self
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First of January, `years` calendar years before the current one
pub fn years_ago(years: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(today().year() - years, 1, 1).expect("valid date")
}

pub const ADULT_AGE: i32 = 35;
pub const MINOR_AGE: i32 = 8;

/// Customer named `name`, born `age` calendar years ago
pub fn customer(name: &str, age: i32) -> Customer {
    Customer::new(name, years_ago(age))
}

pub fn name() -> Member<Customer> {
    Member::string("name", |c: &Customer| c.name.clone())
}

pub fn date_of_birth() -> Member<Customer> {
    Member::date("date_of_birth", |c: &Customer| c.date_of_birth)
}

pub fn member_since() -> Member<Customer> {
    Member::date("member_since", |c: &Customer| c.member_since)
}

named_specification! {
    /// Customers at least 21 calendar years old
    pub AdultCustomer: Customer =
        |x| (Expr::<Customer>::today().year() - x.member(date_of_birth()).year()).ge(21)
}

named_specification! {
    /// Customers who joined more than ten calendar years ago
    pub PremiumCustomer: Customer =
        |x| (Expr::<Customer>::today().year() - x.member(member_since()).year()).gt(10)
}

named_specification! {
    /// Customers with a non-empty name shorter than ten characters
    pub ValidCustomerName: Customer =
        |x| x.clone().member(name()).length().gt(0).and_also(x.member(name()).length().lt(10))
}

named_specification! {
    /// A rule declared without a tree
    pub NoExpressionTree: Customer => { Specification::empty() }
}
